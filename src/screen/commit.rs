//! Details of the HEAD commit of a worktree, as colored `git show --stat` output.

use crate::config::Theme;
use crate::screen::ScreenEvent;
use crate::ui::widgets::popup_block;

use ansi_to_tui::IntoText;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{Frame, layout::Rect, text::Text, widgets::Paragraph};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CommitScreen {
    path: PathBuf,
    title: String,
    body: Option<Text<'static>>,
    lines: u16,
    scroll: u16,
}

impl CommitScreen {
    /// Opens empty; the body arrives with [set_body](Self::set_body).
    pub fn new(path: PathBuf, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            body: None,
            lines: 0,
            scroll: 0,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.body.is_some()
    }

    /// Converts ANSI escapes to styles; unparsable output is shown as plain text.
    pub fn set_body(&mut self, raw: &str) {
        let text = raw
            .as_bytes()
            .into_text()
            .unwrap_or_else(|_| Text::raw(raw.to_string()));
        self.lines = text.lines.len().min(u16::MAX as usize) as u16;
        self.body = Some(text);
        self.scroll = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let max = self.lines.saturating_sub(1);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ScreenEvent::Close,
            KeyCode::Down | KeyCode::Char('j') => self.scroll = (self.scroll + 1).min(max),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll = (self.scroll + 20).min(max),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(20),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = max,
            _ => {}
        }
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = (area.width as f32 * 0.95) as u16;
        let height = (area.height as f32 * 0.85) as u16;
        (width.max(20), height.max(5))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block(&self.title, theme);
        let widget = match &self.body {
            Some(text) => Paragraph::new(text.clone()).scroll((self.scroll, 0)),
            None => Paragraph::new("Loading commit...").style(theme.muted_style()),
        };
        frame.render_widget(widget.block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn ansi_body_and_scroll() {
        let mut c = CommitScreen::new(PathBuf::from("/wt/a"), "Commit");
        assert!(!c.is_loaded());
        c.set_body("\x1b[33mcommit abc\x1b[0m\nAuthor: A\n\n    message\n");
        assert!(c.is_loaded());
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        c.handle_key(key(KeyCode::Char('G')));
        assert!(c.scroll > 0);
        c.handle_key(key(KeyCode::Char('g')));
        assert_eq!(c.scroll, 0);
        assert_eq!(c.handle_key(key(KeyCode::Esc)), ScreenEvent::Close);
    }
}
