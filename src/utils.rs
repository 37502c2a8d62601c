//! Miscellaneous utilities for lazyworktree.
//!
//! - [cli]: command line parsing, help and version output.
//! - [helpers]: home directory handling, name templates, worktree environments, relative times.
//! - [log]: the optional debug log file.

pub mod cli;
pub mod helpers;
pub mod log;

pub use helpers::{
    expand_home_path, get_home, relative_time, sanitize_branch_name, shell_quote,
    shorten_home_path, worktree_env,
};
