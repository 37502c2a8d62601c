//! Debug logging to a file.
//!
//! The TUI owns the terminal, so log output can never go to stdout or stderr. When a log path
//! is configured a plain-text `tracing` subscriber appends to it; otherwise no subscriber is
//! installed and events are dropped.

use crate::error::AppError;

use std::path::Path;

pub fn init_file_logging(log_path: &Path) -> Result<(), AppError> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|error| {
            AppError::Config(format!(
                "failed to create log directory '{}': {error}",
                parent.display()
            ))
        })?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|error| {
            AppError::Config(format!(
                "failed to open log file '{}': {error}",
                log_path.display()
            ))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazyworktree=debug".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to install logger: {e}")))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}
