//! Spinner shown while a blocking operation the user is waiting on runs.

use crate::config::Theme;
use crate::screen::ScreenEvent;
use crate::ui::widgets::popup_block;

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect, widgets::Paragraph};
use std::time::Instant;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug)]
pub struct LoadingScreen {
    message: String,
    started: Instant,
}

impl LoadingScreen {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            started: Instant::now(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Keys are swallowed until the operation reports back.
    pub fn handle_key(&mut self, _key: KeyEvent) -> ScreenEvent {
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = (self.message.chars().count() as u16 + 8).min(area.width);
        (width.max(20), 3)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let tick = (self.started.elapsed().as_millis() / 80) as usize % FRAMES.len();
        frame.render_widget(
            Paragraph::new(format!(" {} {}", FRAMES[tick], self.message))
                .style(theme.text_style())
                .block(popup_block("Working", theme)),
            area,
        );
    }
}
