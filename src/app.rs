//! Application layer of lazyworktree.
//!
//! - [state]: the [Model] and its update function.
//! - [handlers]: key routing and actions of the main view.
//! - [screens]: what happens when a screen submits, and the results of that work.
//! - [view]: filtering, sorting and selection tracking of the worktree list.
//! - [keymap]: key bindings, help entries and palette actions.
//! - [ci]: CI check links, log viewing and job restarts.
//! - [message]: every input the model consumes.

pub mod ci;
mod handlers;
pub mod keymap;
pub mod message;
mod screens;
pub mod state;
pub mod view;

pub use keymap::{Action, Keymap};
pub use message::Message;
pub use state::{Model, Pane, Startup};
pub use view::WorktreeView;
