//! Scrollable key reference.

use crate::config::Theme;
use crate::screen::ScreenEvent;
use crate::ui::widgets::popup_block;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

#[derive(Debug)]
pub struct HelpScreen {
    /// `(keys, description)`; an entry with empty keys is a section heading.
    entries: Vec<(String, String)>,
    scroll: u16,
}

impl HelpScreen {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries, scroll: 0 }
    }

    #[inline]
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let max = self.entries.len().saturating_sub(1) as u16;
        match key.code {
            KeyCode::Esc | KeyCode::Char('q' | '?') => return ScreenEvent::Close,
            KeyCode::Down | KeyCode::Char('j') => self.scroll = (self.scroll + 1).min(max),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = (self.scroll + 10).min(max),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = max,
            _ => {}
        }
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = area.width.saturating_sub(4).min(72);
        let height = (self.entries.len() as u16 + 2).min(area.height.saturating_sub(6));
        (width, height.max(5))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let key_width = self
            .entries
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0);
        let lines: Vec<Line> = self
            .entries
            .iter()
            .map(|(keys, desc)| {
                if keys.is_empty() {
                    Line::from(Span::styled(desc.clone(), theme.header_style()))
                } else {
                    Line::from(vec![
                        Span::styled(format!("  {keys:<key_width$}  "), theme.accent_style()),
                        Span::styled(desc.clone(), theme.text_style()),
                    ])
                }
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines)
                .block(popup_block("Help", theme))
                .scroll((self.scroll, 0)),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn scroll_is_bounded() {
        let mut h = HelpScreen::new(vec![
            (String::new(), "Navigation".into()),
            ("j / k".into(), "Move".into()),
        ]);
        let k = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        h.handle_key(k('j'));
        h.handle_key(k('j'));
        assert_eq!(h.scroll(), 1);
        h.handle_key(k('k'));
        h.handle_key(k('k'));
        assert_eq!(h.scroll(), 0);
        assert_eq!(h.handle_key(k('?')), ScreenEvent::Close);
    }
}
