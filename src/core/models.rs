//! Domain entities shown by the worktree list: working trees, pull requests,
//! issues and CI checks.
//!
//! [WorkingTree] values are produced wholesale by the discovery step and replaced on
//! every refresh. The only in-place mutation is attaching PR data after it arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the persisted worktree snapshot, one per worktree root.
pub const CACHE_FILENAME: &str = ".worktree-cache.json";
/// File name of the marker recording the last chosen worktree.
pub const LAST_SELECTED_FILENAME: &str = ".last-selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

impl PrState {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Some(PrState::Open),
            "MERGED" => Some(PrState::Merged),
            "CLOSED" => Some(PrState::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "OPEN",
            PrState::Merged => "MERGED",
            PrState::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub state: PrState,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub head_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
}

/// One checked-out working tree and its git status summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTree {
    pub path: PathBuf,
    pub branch: String,
    pub is_main: bool,
    pub dirty: bool,
    pub ahead: u32,
    pub behind: u32,
    /// Unix timestamp (seconds) of the most recent commit, 0 when unknown.
    pub last_active: i64,
    pub pr: Option<PullRequest>,
    pub untracked: u32,
    pub modified: u32,
    pub staged: u32,
    pub divergence: String,
}

impl WorkingTree {
    /// Builds a working tree with `dirty` and `divergence` derived from the counts.
    pub fn new(path: impl Into<PathBuf>, branch: impl Into<String>, is_main: bool) -> Self {
        Self {
            path: path.into(),
            branch: branch.into(),
            is_main,
            dirty: false,
            ahead: 0,
            behind: 0,
            last_active: 0,
            pr: None,
            untracked: 0,
            modified: 0,
            staged: 0,
            divergence: String::new(),
        }
    }

    pub fn with_counts(mut self, untracked: u32, modified: u32, staged: u32) -> Self {
        self.untracked = untracked;
        self.modified = modified;
        self.staged = staged;
        self.dirty = untracked + modified + staged > 0;
        self
    }

    pub fn with_divergence(mut self, ahead: u32, behind: u32) -> Self {
        self.ahead = ahead;
        self.behind = behind;
        self.divergence = divergence_label(ahead, behind);
        self
    }

    pub fn with_last_active(mut self, ts: i64) -> Self {
        self.last_active = ts;
        self
    }

    /// Directory base name, used as the display name in the list.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// "↑3 ↓1" style summary, empty when in sync.
pub fn divergence_label(ahead: u32, behind: u32) -> String {
    match (ahead, behind) {
        (0, 0) => String::new(),
        (a, 0) => format!("↑{a}"),
        (0, b) => format!("↓{b}"),
        (a, b) => format!("↑{a} ↓{b}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Success,
    Failure,
    Skipped,
    Cancelled,
    Pending,
    Unknown,
}

impl Conclusion {
    /// Maps the many spellings used by `gh` (bucket names, check-run conclusions,
    /// status states) onto the small set the UI distinguishes.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "success" | "pass" | "neutral" => Conclusion::Success,
            "failure" | "fail" | "timed_out" | "action_required" | "startup_failure" | "error" => {
                Conclusion::Failure
            }
            "skipped" | "skipping" => Conclusion::Skipped,
            "cancelled" | "cancel" => Conclusion::Cancelled,
            "" | "pending" | "queued" | "in_progress" | "waiting" | "requested" => {
                Conclusion::Pending
            }
            _ => Conclusion::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Skipped => "skipped",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Pending => "pending",
            Conclusion::Unknown => "unknown",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Conclusion::Success => "S",
            Conclusion::Failure => "F",
            Conclusion::Skipped => "-",
            Conclusion::Cancelled => "C",
            Conclusion::Pending => "P",
            Conclusion::Unknown => "?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiCheck {
    pub name: String,
    pub status: String,
    pub conclusion: Conclusion,
    pub link: String,
    pub started_at: Option<DateTime<Utc>>,
}

impl CiCheck {
    pub fn new(name: impl Into<String>, conclusion: Conclusion, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: String::new(),
            conclusion,
            link: link.into(),
            started_at: None,
        }
    }

    /// Checks produced by the hosting provider's native runner link into `/actions/`.
    pub fn is_native_runner(&self) -> bool {
        self.link.contains("/actions/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_follows_file_counts() {
        let wt = WorkingTree::new("/repo/feature", "feature/test", false).with_counts(2, 5, 3);
        assert!(wt.dirty);

        let clean = WorkingTree::new("/repo/main", "main", true).with_counts(0, 0, 0);
        assert!(!clean.dirty);
    }

    #[test]
    fn divergence_labels() {
        assert_eq!(divergence_label(0, 0), "");
        assert_eq!(divergence_label(5, 0), "↑5");
        assert_eq!(divergence_label(0, 2), "↓2");
        assert_eq!(divergence_label(3, 1), "↑3 ↓1");
    }

    #[test]
    fn conclusion_spellings() {
        assert_eq!(Conclusion::parse("pass"), Conclusion::Success);
        assert_eq!(Conclusion::parse("FAILURE"), Conclusion::Failure);
        assert_eq!(Conclusion::parse("skipping"), Conclusion::Skipped);
        assert_eq!(Conclusion::parse(""), Conclusion::Pending);
        assert_eq!(Conclusion::parse("weird"), Conclusion::Unknown);
    }

    #[test]
    fn name_is_directory_base() {
        let wt = WorkingTree::new("/tmp/worktrees/repo/feat-x", "feat-x", false);
        assert_eq!(wt.name(), "feat-x");
    }

    #[test]
    fn file_name_constants() {
        assert_eq!(LAST_SELECTED_FILENAME, ".last-selected");
        assert_eq!(CACHE_FILENAME, ".worktree-cache.json");
    }
}
