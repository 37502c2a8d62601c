//! Messages consumed by [Model::update](crate::app::Model::update).
//!
//! Input events come from the terminal loop; every other variant is the single result of a
//! [Task](crate::core::Task). Errors travel as plain strings so messages stay cheap to move
//! across threads.

use crate::core::models::{CiCheck, Issue, PullRequest, WorkingTree};
use crate::core::parse::CommitFile;

use crossterm::event::KeyEvent;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
    Tick,

    /// Snapshot read from disk at startup.
    CachedWorktrees(Vec<WorkingTree>),
    WorktreesLoaded(Result<Vec<WorkingTree>, String>),
    PrDataLoaded(Result<HashMap<String, PullRequest>, String>),
    CiStatusLoaded {
        branch: String,
        checks: Result<Vec<CiCheck>, String>,
    },
    /// Text to show once a command was launched in a new terminal tab.
    TerminalTabReady(Result<String, String>),
    CiRerunFinished {
        branch: String,
        run_url: String,
        error: Option<String>,
    },
    OpenPrsLoaded(Result<Vec<PullRequest>, String>),
    IssuesLoaded(Result<Vec<Issue>, String>),
    CommitLoaded {
        path: PathBuf,
        result: Result<String, String>,
    },
    CommitFilesLoaded {
        path: PathBuf,
        result: Result<Vec<CommitFile>, String>,
    },
    /// A worktree operation finished. `Ok(Some(text))` is shown to the user.
    CommandFinished {
        label: &'static str,
        result: Result<Option<String>, String>,
        refresh: bool,
    },
    /// Background write of the snapshot or the trust store.
    Persisted {
        what: &'static str,
        result: Result<(), String>,
    },
    Error(String),
    RefreshComplete,
}

impl Message {
    /// Short name used in debug logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Key(_) => "key",
            Message::Resize { .. } => "resize",
            Message::Tick => "tick",
            Message::CachedWorktrees(_) => "cached-worktrees",
            Message::WorktreesLoaded(_) => "worktrees-loaded",
            Message::PrDataLoaded(_) => "pr-data-loaded",
            Message::CiStatusLoaded { .. } => "ci-status-loaded",
            Message::TerminalTabReady(_) => "terminal-tab-ready",
            Message::CiRerunFinished { .. } => "ci-rerun-finished",
            Message::OpenPrsLoaded(_) => "open-prs-loaded",
            Message::IssuesLoaded(_) => "issues-loaded",
            Message::CommitLoaded { .. } => "commit-loaded",
            Message::CommitFilesLoaded { .. } => "commit-files-loaded",
            Message::CommandFinished { .. } => "command-finished",
            Message::Persisted { .. } => "persisted",
            Message::Error(_) => "error",
            Message::RefreshComplete => "refresh-complete",
        }
    }
}
