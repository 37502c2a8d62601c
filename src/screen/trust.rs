//! Trust prompt for a new or changed `.wt` file.

use crate::config::Theme;
use crate::screen::{ScreenEvent, Submission};
use crate::ui::widgets::{hint_line, popup_block};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustChoice {
    /// Remember the file and run its commands.
    Trust,
    /// Create the worktree without running them.
    Block,
    /// Abort the creation.
    Cancel,
}

#[derive(Debug)]
pub struct TrustScreen {
    path: PathBuf,
    commands: Vec<String>,
}

impl TrustScreen {
    pub fn new(path: PathBuf, commands: Vec<String>) -> Self {
        Self { path, commands }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let choice = match key.code {
            KeyCode::Char('t' | 'T') => TrustChoice::Trust,
            KeyCode::Char('b' | 'B') => TrustChoice::Block,
            KeyCode::Char('c' | 'C' | 'q') | KeyCode::Esc => TrustChoice::Cancel,
            _ => return ScreenEvent::Stay,
        };
        ScreenEvent::Submit(Submission::Trust(choice))
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let height = self.commands.len() as u16 + 9;
        (area.width.saturating_sub(4).min(80), height.min(area.height))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block("Untrusted repository hooks", theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [body, hints] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} is new or has changed.", self.path.display()),
                theme.warn_style(),
            )),
            Line::raw(""),
            Line::styled("It will run these commands:", theme.text_style()),
        ];
        lines.extend(
            self.commands
                .iter()
                .map(|c| Line::styled(format!("  $ {c}"), theme.accent_style())),
        );
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Only trust files from repositories you control.",
            theme.muted_style(),
        ));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
        frame.render_widget(
            Paragraph::new(hint_line(
                &[("t", "trust and run"), ("b", "block"), ("c", "cancel")],
                theme,
            )),
            hints,
        );
    }
}
