//! Parsers for the output of `git` and `gh`.
//!
//! Everything here is pure. Malformed input degrades to "no data" (empty vectors, zero counts)
//! rather than an error, except for JSON payloads where callers want to log what went wrong.

use crate::core::models::{CiCheck, Conclusion, Issue, PrState, PullRequest};
use crate::error::AppError;

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// One block of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PorcelainEntry {
    pub path: PathBuf,
    pub head: String,
    /// Short branch name, empty when detached.
    pub branch: String,
    pub bare: bool,
    pub detached: bool,
}

pub fn parse_worktree_porcelain(out: &str) -> Vec<PorcelainEntry> {
    let mut entries = Vec::new();
    let mut current: Option<PorcelainEntry> = None;

    for line in out.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            continue;
        }
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "worktree" => {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                current = Some(PorcelainEntry {
                    path: PathBuf::from(value),
                    ..PorcelainEntry::default()
                });
            }
            "HEAD" => {
                if let Some(e) = current.as_mut() {
                    e.head = value.to_string();
                }
            }
            "branch" => {
                if let Some(e) = current.as_mut() {
                    e.branch = value.trim_start_matches("refs/heads/").to_string();
                }
            }
            "bare" => {
                if let Some(e) = current.as_mut() {
                    e.bare = true;
                }
            }
            "detached" => {
                if let Some(e) = current.as_mut() {
                    e.detached = true;
                }
            }
            _ => {}
        }
    }
    if let Some(entry) = current {
        entries.push(entry);
    }
    entries
}

/// Counts extracted from `git status --porcelain=v2 --branch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSummary {
    pub ahead: u32,
    pub behind: u32,
    pub untracked: u32,
    pub modified: u32,
    pub staged: u32,
}

pub fn parse_status_v2(out: &str) -> StatusSummary {
    let mut s = StatusSummary::default();
    for line in out.lines() {
        if let Some(ab) = line.strip_prefix("# branch.ab ") {
            for part in ab.split_whitespace() {
                if let Some(n) = part.strip_prefix('+') {
                    s.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = part.strip_prefix('-') {
                    s.behind = n.parse().unwrap_or(0);
                }
            }
            continue;
        }
        let mut fields = line.splitn(3, ' ');
        match (fields.next(), fields.next()) {
            (Some("?"), _) => s.untracked += 1,
            (Some("1" | "2"), Some(xy)) => {
                let mut chars = xy.chars();
                if chars.next().is_some_and(|c| c != '.') {
                    s.staged += 1;
                }
                if chars.next().is_some_and(|c| c != '.') {
                    s.modified += 1;
                }
            }
            (Some("u"), _) => s.modified += 1,
            _ => {}
        }
    }
    s
}

#[derive(Deserialize)]
struct GhAuthor {
    #[serde(default)]
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPr {
    number: u64,
    state: String,
    title: String,
    url: String,
    #[serde(default)]
    head_ref_name: String,
    author: Option<GhAuthor>,
}

/// `gh pr list --json number,state,title,url,headRefName,author`
pub fn parse_pr_list(out: &str) -> Result<Vec<PullRequest>, AppError> {
    if out.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<GhPr> = serde_json::from_str(out)?;
    Ok(raw
        .into_iter()
        .filter_map(|pr| {
            Some(PullRequest {
                number: pr.number,
                state: PrState::parse(&pr.state)?,
                title: pr.title,
                url: pr.url,
                author: pr.author.map(|a| a.login).unwrap_or_default(),
                head_branch: pr.head_ref_name,
            })
        })
        .collect())
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    url: String,
    author: Option<GhAuthor>,
}

/// `gh issue list --json number,title,url,author`
pub fn parse_issue_list(out: &str) -> Result<Vec<Issue>, AppError> {
    if out.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<GhIssue> = serde_json::from_str(out)?;
    Ok(raw
        .into_iter()
        .map(|i| Issue {
            number: i.number,
            title: i.title,
            url: i.url,
            author: i.author.map(|a| a.login).unwrap_or_default(),
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPrCheck {
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    bucket: String,
}

/// `gh pr checks N --json name,state,link,startedAt,bucket`
pub fn parse_pr_checks(out: &str) -> Result<Vec<CiCheck>, AppError> {
    if out.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<GhPrCheck> = serde_json::from_str(out)?;
    Ok(raw
        .into_iter()
        .map(|c| {
            let verdict = if c.bucket.is_empty() { &c.state } else { &c.bucket };
            CiCheck {
                conclusion: Conclusion::parse(verdict),
                status: c.state,
                name: c.name,
                link: c.link,
                started_at: c.started_at.as_deref().and_then(parse_timestamp),
            }
        })
        .collect())
}

#[derive(Deserialize)]
struct CheckRuns {
    #[serde(default)]
    check_runs: Vec<CheckRun>,
}

#[derive(Deserialize)]
struct CheckRun {
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    started_at: Option<String>,
}

/// `gh api repos/{owner}/{repo}/commits/{sha}/check-runs`
pub fn parse_check_runs(out: &str) -> Result<Vec<CiCheck>, AppError> {
    if out.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: CheckRuns = serde_json::from_str(out)?;
    Ok(raw
        .check_runs
        .into_iter()
        .map(|r| {
            let conclusion = if r.status == "completed" {
                Conclusion::parse(r.conclusion.as_deref().unwrap_or(""))
            } else {
                Conclusion::Pending
            };
            CiCheck {
                name: r.name,
                status: r.status,
                conclusion,
                link: r.html_url,
                started_at: r.started_at.as_deref().and_then(parse_timestamp),
            }
        })
        .collect())
}

/// RFC3339 timestamp, with gh's zero value (`0001-01-01T00:00:00Z`) mapped to `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(s.trim()).ok()?.with_timezone(&Utc);
    (ts.year() > 1).then_some(ts)
}

/// One line of `git show --name-status --format= HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFile {
    pub status: String,
    pub path: String,
}

pub fn parse_name_status(out: &str) -> Vec<CommitFile> {
    out.lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = parts.next()?.trim();
            // renames and copies list old then new
            let path = parts.last()?.trim();
            if status.is_empty() || path.is_empty() {
                return None;
            }
            Some(CommitFile {
                status: status.chars().take(1).collect(),
                path: path.to_string(),
            })
        })
        .collect()
}

/// `owner/repo` from a GitHub remote URL, in either the https or the scp-like ssh form.
pub fn github_repo_from_remote(remote: &str) -> Option<String> {
    let remote = remote.trim();
    let rest = if let Some(r) = remote.strip_prefix("git@github.com:") {
        r
    } else {
        let parsed = url::Url::parse(remote).ok()?;
        if !parsed.host_str()?.contains("github.com") {
            return None;
        }
        return repo_from_path(parsed.path());
    };
    repo_from_path(rest)
}

fn repo_from_path(path: &str) -> Option<String> {
    let mut parts = path.trim_start_matches('/').split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    Some(format!("{owner}/{}", repo.trim_end_matches(".git")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn porcelain_blocks() {
        let out = "worktree /repo\nHEAD abc\nbranch refs/heads/main\n\n\
                   worktree /wt/feat\nHEAD def\nbranch refs/heads/feature/x\n\n\
                   worktree /wt/detached\nHEAD 123\ndetached\n";
        let entries = parse_worktree_porcelain(out);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].branch, "main");
        assert_eq!(entries[1].branch, "feature/x");
        assert_eq!(entries[1].path, PathBuf::from("/wt/feat"));
        assert!(entries[2].detached);
        assert!(entries[2].branch.is_empty());
    }

    #[test]
    fn status_counts() {
        let out = "# branch.oid abc\n# branch.head main\n# branch.ab +3 -1\n\
                   1 .M N... 100644 100644 100644 a b src/a.rs\n\
                   1 M. N... 100644 100644 100644 a b src/b.rs\n\
                   1 MM N... 100644 100644 100644 a b src/c.rs\n\
                   ? new.txt\n? other.txt\n";
        let s = parse_status_v2(out);
        assert_eq!(s.ahead, 3);
        assert_eq!(s.behind, 1);
        assert_eq!(s.untracked, 2);
        assert_eq!(s.modified, 2);
        assert_eq!(s.staged, 2);
    }

    #[test]
    fn pr_list_json() -> Result<(), Box<dyn std::error::Error>> {
        let out = r#"[
            {"number": 12, "state": "OPEN", "title": "Add thing", "url": "https://github.com/o/r/pull/12",
             "headRefName": "feat-thing", "author": {"login": "alice"}},
            {"number": 9, "state": "MERGED", "title": "Old", "url": "u", "headRefName": "old"}
        ]"#;
        let prs = parse_pr_list(out)?;
        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].head_branch, "feat-thing");
        assert_eq!(prs[0].author, "alice");
        assert_eq!(prs[1].state, PrState::Merged);
        assert!(prs[1].author.is_empty());
        Ok(())
    }

    #[test]
    fn pr_list_garbage_is_error() {
        assert!(parse_pr_list("not json").is_err());
        assert!(matches!(parse_pr_list("  "), Ok(v) if v.is_empty()));
    }

    #[test]
    fn pr_checks_use_bucket() -> Result<(), Box<dyn std::error::Error>> {
        let out = r#"[
            {"name": "build", "state": "SUCCESS", "bucket": "pass",
             "link": "https://github.com/o/r/actions/runs/1/job/2", "startedAt": "2024-05-01T10:00:00Z"},
            {"name": "tekton", "state": "FAILURE", "bucket": "fail", "link": "https://ci.example.com/x",
             "startedAt": "0001-01-01T00:00:00Z"}
        ]"#;
        let checks = parse_pr_checks(out)?;
        assert_eq!(checks[0].conclusion, Conclusion::Success);
        assert!(checks[0].started_at.is_some());
        assert_eq!(checks[1].conclusion, Conclusion::Failure);
        assert!(checks[1].started_at.is_none());
        Ok(())
    }

    #[test]
    fn check_runs_in_progress_are_pending() -> Result<(), Box<dyn std::error::Error>> {
        let out = r#"{"total_count": 2, "check_runs": [
            {"name": "lint", "status": "in_progress", "conclusion": null, "html_url": "h1"},
            {"name": "test", "status": "completed", "conclusion": "failure", "html_url": "h2"}
        ]}"#;
        let checks = parse_check_runs(out)?;
        assert_eq!(checks[0].conclusion, Conclusion::Pending);
        assert_eq!(checks[1].conclusion, Conclusion::Failure);
        assert_eq!(checks[1].link, "h2");
        Ok(())
    }

    #[test]
    fn name_status_takes_new_path_of_renames() {
        let files = parse_name_status("M\tsrc/lib.rs\nR100\told.rs\tnew.rs\n\nA\tdocs/x.md\n");
        assert_eq!(files.len(), 3);
        assert_eq!(files[1].status, "R");
        assert_eq!(files[1].path, "new.rs");
    }

    #[test]
    fn github_remotes() {
        assert_eq!(
            github_repo_from_remote("git@github.com:chmouel/lazyworktree.git").as_deref(),
            Some("chmouel/lazyworktree")
        );
        assert_eq!(
            github_repo_from_remote("https://github.com/o/r").as_deref(),
            Some("o/r")
        );
        assert_eq!(github_repo_from_remote("https://gitlab.com/o/r.git"), None);
        assert_eq!(github_repo_from_remote(""), None);
    }
}
