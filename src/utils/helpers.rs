//! Helpers for lazyworktree.
//!
//! Small, pure utilities used throughout the application:
//! - Home directory lookup, `~` expansion and shortening
//! - Sanitizing titles into branch/directory names and expanding name templates
//! - The environment handed to commands run inside a worktree
//! - Human readable relative times

use crate::core::models::{CiCheck, Issue, PullRequest, WorkingTree};

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Longest worktree name produced from a template.
pub const MAX_GENERATED_NAME: usize = 100;

pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home_path(path: &str) -> PathBuf {
    if path == "~" {
        return get_home().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = get_home()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Util function to shorten home directory to ~.
pub fn shorten_home_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    if let Some(home_dir) = get_home()
        && let Ok(stripped) = path.strip_prefix(&home_dir)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        let mut short = stripped.display().to_string();
        if short.starts_with(MAIN_SEPARATOR) {
            short.remove(0);
        }
        return format!("~{}{}", MAIN_SEPARATOR, short);
    }
    path.display().to_string()
}

/// Lowercases and keeps only `[a-z0-9]`, joining everything else into single dashes.
/// `max_len` of 0 means unlimited.
pub fn sanitize_branch_name(name: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    if max_len > 0 && out.len() > max_len {
        out.truncate(max_len);
        while out.ends_with('-') {
            out.pop();
        }
    }
    out
}

fn finish_template(mut name: String) -> String {
    while name.ends_with('-') {
        name.pop();
    }
    if name.len() > MAX_GENERATED_NAME {
        let mut cut = MAX_GENERATED_NAME;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
        while name.ends_with('-') {
            name.pop();
        }
    }
    name
}

/// Expands `{number}`, `{title}`, `{generated}` and `{pr_author}` for a pull request.
pub fn pr_worktree_name(pr: &PullRequest, template: &str, generated: Option<&str>) -> String {
    let title = sanitize_branch_name(&pr.title, 0);
    let generated = generated
        .map(|g| sanitize_branch_name(g, 0))
        .unwrap_or_else(|| title.clone());
    let name = template
        .replace("{number}", &pr.number.to_string())
        .replace("{title}", &title)
        .replace("{generated}", &generated)
        .replace("{pr_author}", &sanitize_branch_name(&pr.author, 0));
    finish_template(name)
}

/// Expands `{number}`, `{title}` and `{generated}` for an issue.
pub fn issue_worktree_name(issue: &Issue, template: &str, generated: Option<&str>) -> String {
    let title = sanitize_branch_name(&issue.title, 0);
    let generated = generated
        .map(|g| sanitize_branch_name(g, 0))
        .unwrap_or_else(|| title.clone());
    let name = template
        .replace("{number}", &issue.number.to_string())
        .replace("{title}", &title)
        .replace("{generated}", &generated);
    finish_template(name)
}

/// Variables describing a worktree, exported to every command run for it.
pub fn worktree_env(wt: &WorkingTree, main_path: Option<&Path>) -> Vec<(String, String)> {
    let mut env = vec![
        ("WORKTREE_BRANCH".to_string(), wt.branch.clone()),
        ("WORKTREE_PATH".to_string(), wt.path.display().to_string()),
        ("WORKTREE_NAME".to_string(), wt.name()),
    ];
    if let Some(main) = main_path {
        env.push(("MAIN_WORKTREE_PATH".to_string(), main.display().to_string()));
        if let Some(repo) = main.file_name() {
            env.push(("REPO_NAME".to_string(), repo.to_string_lossy().into_owned()));
        }
    }
    env
}

/// Adds the `LW_CI_*` variables for a CI check to a worktree environment.
pub fn ci_env(
    mut env: Vec<(String, String)>,
    check: &CiCheck,
    run_id: &str,
) -> Vec<(String, String)> {
    env.push(("LW_CI_JOB_NAME".to_string(), check.name.clone()));
    env.push((
        "LW_CI_JOB_NAME_CLEAN".to_string(),
        sanitize_branch_name(&check.name, 0),
    ));
    env.push(("LW_CI_RUN_ID".to_string(), run_id.to_string()));
    if let Some(started) = check.started_at {
        env.push((
            "LW_CI_STARTED_AT".to_string(),
            started.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }
    env
}

/// "3m ago" style text for a unix timestamp. Empty for unknown (0) timestamps.
pub fn relative_time(ts: i64, now: DateTime<Utc>) -> String {
    if ts <= 0 {
        return String::new();
    }
    let secs = (now.timestamp() - ts).max(0);
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        86400..2592000 => format!("{}d ago", secs / 86400),
        2592000..31536000 => format!("{}mo ago", secs / 2592000),
        _ => format!("{}y ago", secs / 31536000),
    }
}

/// Quotes a string for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
