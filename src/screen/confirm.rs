//! Yes/no confirmation and dismissible notices.

use crate::config::Theme;
use crate::screen::{ScreenEvent, Submission};
use crate::ui::widgets::{hint_line, popup_block};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    widgets::{Paragraph, Wrap},
};

fn text_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines()
        .map(|l| l.chars().count().div_ceil(width).max(1))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

#[derive(Debug)]
pub struct ConfirmScreen {
    message: String,
}

impl ConfirmScreen {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => ScreenEvent::Submit(Submission::Confirmed),
            KeyCode::Char('n' | 'N' | 'q') | KeyCode::Esc => ScreenEvent::Close,
            _ => ScreenEvent::Stay,
        }
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = area.width.saturating_sub(4).min(60);
        (width, text_height(&self.message, width.saturating_sub(2)) + 4)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block("Confirm", theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let [body, hints] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(
            Paragraph::new(self.message.clone())
                .style(theme.text_style())
                .wrap(Wrap { trim: false }),
            body,
        );
        frame.render_widget(
            Paragraph::new(hint_line(&[("y", "confirm"), ("n", "cancel")], theme)),
            hints,
        );
    }
}

#[derive(Debug)]
pub struct InfoScreen {
    message: String,
}

impl InfoScreen {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q' | ' ') => ScreenEvent::Close,
            _ => ScreenEvent::Stay,
        }
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = area.width.saturating_sub(4).min(70);
        (width, text_height(&self.message, width.saturating_sub(2)) + 4)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block("Info", theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let [body, hints] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(
            Paragraph::new(self.message.clone())
                .style(theme.text_style())
                .wrap(Wrap { trim: false }),
            body,
        );
        frame.render_widget(Paragraph::new(hint_line(&[("enter", "close")], theme)), hints);
    }
}
