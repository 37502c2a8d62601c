//! Configuration for lazyworktree.
//!
//! - [load]: locating and parsing `config.toml`, applying `-C lw.key=value` overrides.
//! - [general]: the settings themselves, [SortMode] and [CustomCommand].
//! - [theme] and [presets]: the built-in color themes.

pub mod general;
pub mod load;
pub mod presets;
pub mod theme;

pub use general::{CustomCommand, InternalGeneral, SortMode};
pub use load::{Config, parse_override};
pub use theme::Theme;
