//! Color themes for lazyworktree.
//!
//! A [Theme] is resolved once at startup from its name and then passed by reference into the
//! model and every render call. There is no global theme.

use crate::config::presets::{clean_light, dracula, nord};

use ratatui::style::{Color, Modifier, Style};

pub const DEFAULT_THEME: &str = "dracula";
pub const THEME_NAMES: &[&str] = &["dracula", "nord", "clean-light"];

/// Palette struct feeding the central [make_theme] function.
pub struct Palette {
    pub base: (u8, u8, u8),
    pub surface: (u8, u8, u8),
    pub overlay: (u8, u8, u8),
    pub text: (u8, u8, u8),
    pub primary: (u8, u8, u8),
    pub secondary: (u8, u8, u8),
    pub success: (u8, u8, u8),
    pub warn: (u8, u8, u8),
    pub error: (u8, u8, u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    name: String,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub accent_fg: Color,
    pub secondary: Color,
    pub border: Color,
    pub border_dim: Color,
    pub success: Color,
    pub warn: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        dracula()
    }
}

impl Theme {
    /// Looks up a built-in theme by name. Unknown names yield `None`.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "dracula" => Some(dracula()),
            "nord" => Some(nord()),
            "clean-light" | "clean_light" => Some(clean_light()),
            _ => None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .fg(self.accent_fg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.accent_fg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn footer_style(&self) -> Style {
        Style::default().fg(self.muted).bg(self.surface)
    }

    /// Border of the pane that currently has input focus.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border)
        } else {
            Style::default().fg(self.border_dim)
        }
    }

    pub fn popup_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warn_style(&self) -> Style {
        Style::default().fg(self.warn)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }
}

fn rgb(c: (u8, u8, u8)) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Centralized function to create a Theme from a Palette.
pub fn make_theme(name: &str, palette: Palette) -> Theme {
    Theme {
        name: name.to_string(),
        background: rgb(palette.base),
        surface: rgb(palette.surface),
        text: rgb(palette.text),
        muted: rgb(palette.overlay),
        accent: rgb(palette.primary),
        accent_fg: rgb(palette.base),
        secondary: rgb(palette.secondary),
        border: rgb(palette.primary),
        border_dim: rgb(palette.overlay),
        success: rgb(palette.success),
        warn: rgb(palette.warn),
        error: rgb(palette.error),
    }
}
