//! Core runtime logic for lazyworktree.
//!
//! This module contains the non-UI "engine" pieces used by the application:
//! - [models]: working trees, pull requests, issues and CI checks.
//! - [git]: the [GitService] adapter over `git` and `gh`, with [parse] holding the pure
//!   output parsers.
//! - [proc] and [cancel]: process execution bound to a [CancelToken].
//! - [worker]: deferred [Command]s and the [Workers] pool that runs them.
//! - [cache]: the persisted snapshot, the last-selected marker and the CI cache.
//! - [hooks]: `.wt` repository hooks and the trust store.
//! - [tab]: launching commands in a new terminal tab.
//! - [terminal]: terminal setup/teardown and the main event loop.

pub mod cache;
pub mod cancel;
pub mod git;
pub mod hooks;
pub mod models;
pub mod parse;
pub mod proc;
pub mod tab;
pub mod terminal;
pub mod worker;

pub use cache::{CI_CACHE_TTL, CiCache, CiEntry};
pub use cancel::CancelToken;
pub use git::{GitCli, GitService};
pub use models::{CiCheck, Conclusion, Issue, PrState, PullRequest, WorkingTree};
pub use proc::{InteractiveCommand, RunOptions};
pub use worker::{Command, Task, Workers};
