//! Error type shared by the adapter, the process runner and startup code.
//!
//! Result messages flowing back into the state machine carry errors as plain strings,
//! so [AppError] mostly lives on the worker side of the channel.

use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{program} exited with status {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },
    #[error("{program} timed out after {}s", after.as_secs())]
    Timeout { program: String, after: Duration },
    #[error("operation cancelled")]
    Cancelled,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// True when the error came from the cancellation scope rather than the command itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}
