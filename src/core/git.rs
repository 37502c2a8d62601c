//! The git and hosting adapter.
//!
//! The state machine only ever talks to [GitService]. [GitCli] is the shipped implementation,
//! driving the `git` and `gh` executables through [run_command]. Tests substitute a fake.
//!
//! Every method takes the caller's [CancelToken] so that quitting, or a per-operation deadline,
//! stops whatever process is in flight.

use crate::core::cancel::CancelToken;
use crate::core::models::{CiCheck, Issue, PullRequest, WorkingTree};
use crate::core::parse::{
    CommitFile, github_repo_from_remote, parse_check_runs, parse_issue_list, parse_name_status,
    parse_pr_checks, parse_pr_list, parse_status_v2, parse_worktree_porcelain,
};
use crate::core::proc::{RunOptions, run_command};
use crate::error::AppError;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

pub trait GitService: Send + Sync {
    /// Runs an arbitrary command line in `workdir` and returns its stdout.
    fn run_command(
        &self,
        token: &CancelToken,
        argv: &[String],
        workdir: &Path,
        opts: &RunOptions,
    ) -> Result<String, AppError>;

    /// Every working tree of the repository with its status filled in. The main
    /// checkout comes first.
    fn list_worktrees(&self, token: &CancelToken) -> Result<Vec<WorkingTree>, AppError>;

    /// Pull requests keyed by head branch name.
    fn fetch_pr_map(&self, token: &CancelToken)
    -> Result<HashMap<String, PullRequest>, AppError>;

    fn fetch_ci_status_for_pr(
        &self,
        token: &CancelToken,
        pr_number: u64,
        branch: &str,
    ) -> Result<Vec<CiCheck>, AppError>;

    fn fetch_ci_status_for_commit(
        &self,
        token: &CancelToken,
        sha: &str,
        workdir: &Path,
    ) -> Result<Vec<CiCheck>, AppError>;

    /// HEAD commit of `workdir`, empty when it cannot be resolved.
    fn head_commit(&self, token: &CancelToken, workdir: &Path) -> String;

    fn is_hosted_on_github(&self, token: &CancelToken) -> bool;

    fn list_open_prs(&self, token: &CancelToken) -> Result<Vec<PullRequest>, AppError>;

    fn list_open_issues(&self, token: &CancelToken) -> Result<Vec<Issue>, AppError>;

    /// Creates a working tree at `path` on a new branch `branch` started from `base`
    /// (the current HEAD when `None`).
    fn create_worktree(
        &self,
        token: &CancelToken,
        path: &Path,
        branch: &str,
        base: Option<&str>,
    ) -> Result<(), AppError>;

    fn create_worktree_from_pr(
        &self,
        token: &CancelToken,
        pr: &PullRequest,
        path: &Path,
    ) -> Result<(), AppError>;

    /// Removes the working tree and, when given, deletes its branch.
    fn remove_worktree(
        &self,
        token: &CancelToken,
        path: &Path,
        branch: Option<&str>,
    ) -> Result<(), AppError>;

    /// Colored `git show --stat` of HEAD.
    fn commit_details(&self, token: &CancelToken, workdir: &Path) -> Result<String, AppError>;

    fn commit_files(&self, token: &CancelToken, workdir: &Path)
    -> Result<Vec<CommitFile>, AppError>;

    /// Stable identifier of the repository, used to name its directory under the
    /// worktree root.
    fn repo_key(&self, token: &CancelToken) -> Result<String, AppError>;

    fn main_worktree_path(&self, token: &CancelToken) -> Result<PathBuf, AppError>;
}

/// [GitService] backed by the `git` and `gh` command line tools.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn gh_available() -> bool {
        which::which("gh").is_ok()
    }

    fn git(&self, token: &CancelToken, dir: &Path, args: &[&str]) -> Result<String, AppError> {
        let argv = argv("git", args);
        let out = run_command(token, &argv, dir, &RunOptions::default())?;
        Ok(out.stdout)
    }

    fn gh(&self, token: &CancelToken, dir: &Path, args: &[&str]) -> Result<String, AppError> {
        if !Self::gh_available() {
            return Err(AppError::Spawn {
                program: "gh".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gh not found in PATH"),
            });
        }
        let argv = argv("gh", args);
        let out = run_command(token, &argv, dir, &RunOptions::default())?;
        Ok(out.stdout)
    }

    fn status_of(&self, token: &CancelToken, wt: WorkingTree) -> WorkingTree {
        let path = wt.path.clone();
        let status = self
            .git(token, &path, &["status", "--porcelain=v2", "--branch"])
            .map(|out| parse_status_v2(&out))
            .unwrap_or_else(|e| {
                tracing::debug!(path = %path.display(), error = %e, "status failed");
                Default::default()
            });
        let last_active = self
            .git(token, &path, &["log", "-1", "--format=%ct"])
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(0);

        wt.with_counts(status.untracked, status.modified, status.staged)
            .with_divergence(status.ahead, status.behind)
            .with_last_active(last_active)
    }

    fn github_repo(&self, token: &CancelToken) -> Option<String> {
        let remote = self
            .git(token, &self.repo_dir, &["remote", "get-url", "origin"])
            .ok()?;
        github_repo_from_remote(&remote)
    }
}

fn argv(program: &str, args: &[&str]) -> Vec<String> {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

impl GitService for GitCli {
    fn run_command(
        &self,
        token: &CancelToken,
        argv: &[String],
        workdir: &Path,
        opts: &RunOptions,
    ) -> Result<String, AppError> {
        match run_command(token, argv, workdir, opts) {
            Ok(out) => {
                if !opts.silent_on_success {
                    tracing::info!(
                        command = ?argv,
                        output = out.stdout.trim_end(),
                        "command succeeded"
                    );
                }
                Ok(out.stdout)
            }
            Err(e) => {
                if opts.notify_on_failure {
                    tracing::warn!(command = ?argv, error = %e, "command failed");
                }
                Err(e)
            }
        }
    }

    fn list_worktrees(&self, token: &CancelToken) -> Result<Vec<WorkingTree>, AppError> {
        let out = self.git(token, &self.repo_dir, &["worktree", "list", "--porcelain"])?;
        let entries = parse_worktree_porcelain(&out);

        let base: Vec<WorkingTree> = entries
            .into_iter()
            .enumerate()
            .filter(|(_, e)| !e.bare)
            .map(|(i, e)| {
                let branch = if e.detached || e.branch.is_empty() {
                    format!("(detached {})", e.head.chars().take(7).collect::<String>())
                } else {
                    e.branch
                };
                WorkingTree::new(e.path, branch, i == 0)
            })
            .collect();

        // status and log calls are independent per tree
        let filled = thread::scope(|s| {
            let handles: Vec<_> = base
                .into_iter()
                .map(|wt| s.spawn(move || self.status_of(token, wt)))
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .collect::<Vec<_>>()
        });

        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(filled)
    }

    fn fetch_pr_map(
        &self,
        token: &CancelToken,
    ) -> Result<HashMap<String, PullRequest>, AppError> {
        let out = self.gh(
            token,
            &self.repo_dir,
            &[
                "pr",
                "list",
                "--state",
                "all",
                "--json",
                "number,state,title,url,headRefName,author",
                "--limit",
                "100",
            ],
        )?;
        let prs = parse_pr_list(&out)?;
        let mut map = HashMap::new();
        // gh lists newest first; keep the newest PR per branch
        for pr in prs {
            map.entry(pr.head_branch.clone()).or_insert(pr);
        }
        Ok(map)
    }

    fn fetch_ci_status_for_pr(
        &self,
        token: &CancelToken,
        pr_number: u64,
        branch: &str,
    ) -> Result<Vec<CiCheck>, AppError> {
        let number = pr_number.to_string();
        let argv = argv(
            "gh",
            &[
                "pr",
                "checks",
                &number,
                "--json",
                "name,state,link,startedAt,bucket",
            ],
        );
        // gh exits 8 while checks are still pending
        let opts = RunOptions {
            ok_codes: vec![0, 1, 8],
            ..RunOptions::quiet()
        };
        let out = run_command(token, &argv, &self.repo_dir, &opts)?;
        match parse_pr_checks(&out.stdout) {
            Ok(checks) => Ok(checks),
            Err(e) => {
                tracing::debug!(branch, error = %e, "unparseable pr checks");
                Ok(Vec::new())
            }
        }
    }

    fn fetch_ci_status_for_commit(
        &self,
        token: &CancelToken,
        sha: &str,
        workdir: &Path,
    ) -> Result<Vec<CiCheck>, AppError> {
        let Some(repo) = self.github_repo(token) else {
            return Ok(Vec::new());
        };
        let endpoint = format!("repos/{repo}/commits/{sha}/check-runs");
        let out = self.gh(token, workdir, &["api", &endpoint])?;
        match parse_check_runs(&out) {
            Ok(checks) => Ok(checks),
            Err(e) => {
                tracing::debug!(sha, error = %e, "unparseable check runs");
                Ok(Vec::new())
            }
        }
    }

    fn head_commit(&self, token: &CancelToken, workdir: &Path) -> String {
        self.git(token, workdir, &["rev-parse", "HEAD"])
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn is_hosted_on_github(&self, token: &CancelToken) -> bool {
        self.github_repo(token).is_some()
    }

    fn list_open_prs(&self, token: &CancelToken) -> Result<Vec<PullRequest>, AppError> {
        let out = self.gh(
            token,
            &self.repo_dir,
            &[
                "pr",
                "list",
                "--state",
                "open",
                "--json",
                "number,state,title,url,headRefName,author",
                "--limit",
                "100",
            ],
        )?;
        parse_pr_list(&out)
    }

    fn list_open_issues(&self, token: &CancelToken) -> Result<Vec<Issue>, AppError> {
        let out = self.gh(
            token,
            &self.repo_dir,
            &[
                "issue",
                "list",
                "--state",
                "open",
                "--json",
                "number,title,url,author",
                "--limit",
                "100",
            ],
        )?;
        parse_issue_list(&out)
    }

    fn create_worktree(
        &self,
        token: &CancelToken,
        path: &Path,
        branch: &str,
        base: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path.to_string_lossy();
        let mut args = vec!["worktree", "add", "-b", branch, &*path_str];
        if let Some(base) = base {
            args.push(base);
        }
        self.git(token, &self.repo_dir, &args).map(|_| ())
    }

    fn create_worktree_from_pr(
        &self,
        token: &CancelToken,
        pr: &PullRequest,
        path: &Path,
    ) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let local = format!("pr-{}-{}", pr.number, pr.head_branch);
        let refspec = format!("pull/{}/head:{local}", pr.number);
        self.git(token, &self.repo_dir, &["fetch", "origin", &refspec])?;
        let path_str = path.to_string_lossy();
        self.git(
            token,
            &self.repo_dir,
            &["worktree", "add", &*path_str, &local],
        )
        .map(|_| ())
    }

    fn remove_worktree(
        &self,
        token: &CancelToken,
        path: &Path,
        branch: Option<&str>,
    ) -> Result<(), AppError> {
        let path_str = path.to_string_lossy();
        self.git(
            token,
            &self.repo_dir,
            &["worktree", "remove", "--force", &*path_str],
        )?;
        if let Some(branch) = branch
            && let Err(e) = self.git(token, &self.repo_dir, &["branch", "-D", branch])
        {
            tracing::warn!(branch, error = %e, "worktree removed but branch kept");
        }
        Ok(())
    }

    fn commit_details(&self, token: &CancelToken, workdir: &Path) -> Result<String, AppError> {
        self.git(
            token,
            workdir,
            &["show", "--stat", "--color=always", "--format=fuller", "HEAD"],
        )
    }

    fn commit_files(
        &self,
        token: &CancelToken,
        workdir: &Path,
    ) -> Result<Vec<CommitFile>, AppError> {
        let out = self.git(token, workdir, &["show", "--name-status", "--format=", "HEAD"])?;
        Ok(parse_name_status(&out))
    }

    fn repo_key(&self, token: &CancelToken) -> Result<String, AppError> {
        if let Some(repo) = self.github_repo(token) {
            return Ok(repo);
        }
        let top = self.main_worktree_path(token)?;
        top.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Parse(format!("no name for {}", top.display())))
    }

    fn main_worktree_path(&self, token: &CancelToken) -> Result<PathBuf, AppError> {
        let out = self.git(token, &self.repo_dir, &["worktree", "list", "--porcelain"])?;
        parse_worktree_porcelain(&out)
            .into_iter()
            .next()
            .map(|e| e.path)
            .ok_or_else(|| AppError::Parse("empty worktree list".to_string()))
    }
}
