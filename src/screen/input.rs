//! Single-line text input with cursor editing and an inline error line.

use crate::config::Theme;
use crate::screen::{ScreenEvent, Submission};
use crate::ui::widgets::{hint_line, popup_block};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug)]
pub struct TextInput {
    title: String,
    prompt: String,
    placeholder: String,
    buffer: String,
    cursor: usize,
    error: Option<String>,
}

impl TextInput {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            placeholder: String::new(),
            buffer: String::new(),
            cursor: 0,
            error: None,
        }
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    /// Prefills the buffer with the cursor at the end.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.buffer = value.into();
        self.cursor = self.buffer.len();
        self
    }

    #[inline]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    fn insert(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.cursor > 0
            && let Some((previous, _)) = self.buffer[..self.cursor].char_indices().next_back()
        {
            self.buffer.remove(previous);
            self.cursor = previous;
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    fn left(&mut self) {
        if let Some((previous, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = previous;
        }
    }

    fn right(&mut self) {
        if let Some(c) = self.buffer[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ScreenEvent::Close,
            KeyCode::Enter => {
                return ScreenEvent::Submit(Submission::Text(self.buffer.trim().to_string()));
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::Char('u') if ctrl => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char(c) if !ctrl => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            _ => return ScreenEvent::Stay,
        }
        self.error = None;
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        (area.width.saturating_sub(4).min(70), 7)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block(&self.title, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [prompt_area, input_area, error_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new(self.prompt.clone()).style(theme.text_style()),
            prompt_area,
        );

        let input = if self.buffer.is_empty() {
            Line::from(vec![
                Span::styled("> ", theme.accent_style()),
                Span::styled(self.placeholder.clone(), theme.muted_style()),
            ])
        } else {
            Line::from(vec![
                Span::styled("> ", theme.accent_style()),
                Span::styled(self.buffer.clone(), theme.text_style()),
            ])
        };
        frame.render_widget(Paragraph::new(input), input_area);

        let cursor_x = input_area.x + 2 + self.buffer[..self.cursor].width() as u16;
        if cursor_x < input_area.right() {
            frame.set_cursor_position((cursor_x, input_area.y));
        }

        if let Some(err) = &self.error {
            frame.render_widget(
                Paragraph::new(err.clone()).style(theme.error_style()),
                error_area,
            );
        }
        frame.render_widget(
            Paragraph::new(hint_line(&[("enter", "confirm"), ("esc", "cancel")], theme)),
            hint_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut TextInput, s: &str) {
        for c in s.chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn editing_with_cursor() {
        let mut input = TextInput::new("New", "Name");
        type_str(&mut input, "feat");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Left));
        type_str(&mut input, "é");
        assert_eq!(input.buffer(), "feéat");
        input.handle_key(key(KeyCode::Backspace));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.buffer(), "fet");
        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.buffer(), "et");
    }

    #[test]
    fn submit_trims_and_errors_clear_on_edit() {
        let mut input = TextInput::new("New", "Name").value("  x  ");
        input.set_error("exists");
        assert_eq!(input.error(), Some("exists"));
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            ScreenEvent::Submit(Submission::Text("x".into()))
        );
        input.handle_key(key(KeyCode::Char('y')));
        assert_eq!(input.error(), None);
        assert_eq!(input.handle_key(key(KeyCode::Esc)), ScreenEvent::Close);
    }
}
