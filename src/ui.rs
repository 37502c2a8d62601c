//! Rendering for lazyworktree.
//!
//! - [render]: the frame entry point used by the terminal loop.
//! - [panes]: the worktree table and the detail pane.
//! - [overlays]: placing the active screen over the base layout.
//! - [widgets]: small helpers shared with the screens.
//!
//! Everything here only reads the [Model](crate::app::Model); no state changes while drawing.

pub mod overlays;
pub mod panes;
pub mod render;
pub mod widgets;

pub use render::render;
