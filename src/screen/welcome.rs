//! Shown instead of the list when the current directory is not a git repository.

use crate::config::Theme;
use crate::screen::{ScreenEvent, Submission};
use crate::ui::widgets::{hint_line, popup_block};
use crate::utils::shorten_home_path;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::Paragraph,
};
use std::path::PathBuf;

#[derive(Debug)]
pub struct WelcomeScreen {
    cwd: PathBuf,
    worktree_dir: PathBuf,
}

impl WelcomeScreen {
    pub fn new(cwd: PathBuf, worktree_dir: PathBuf) -> Self {
        Self { cwd, worktree_dir }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        match key.code {
            KeyCode::Char('r') => ScreenEvent::Submit(Submission::Retry),
            KeyCode::Char('q') | KeyCode::Esc => ScreenEvent::Submit(Submission::Quit),
            _ => ScreenEvent::Stay,
        }
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        (area.width.saturating_sub(4).min(64), 10)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block("lazyworktree", theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let [body, hints] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        let lines = vec![
            Line::styled("No git repository found.", theme.warn_style()),
            Line::raw(""),
            Line::styled(
                format!("Current directory: {}", shorten_home_path(&self.cwd)),
                theme.text_style(),
            ),
            Line::styled(
                format!("Worktree root:     {}", shorten_home_path(&self.worktree_dir)),
                theme.text_style(),
            ),
            Line::raw(""),
            Line::styled("Run lazyworktree from inside a repository.", theme.muted_style()),
        ];
        frame.render_widget(Paragraph::new(lines), body);
        frame.render_widget(
            Paragraph::new(hint_line(&[("r", "retry"), ("q", "quit")], theme)),
            hints,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn retry_and_quit() {
        let mut w = WelcomeScreen::new(PathBuf::from("/tmp"), PathBuf::from("/tmp/wt"));
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(w.handle_key(key('r')), ScreenEvent::Submit(Submission::Retry));
        assert_eq!(w.handle_key(key('q')), ScreenEvent::Submit(Submission::Quit));
        assert_eq!(w.handle_key(key('x')), ScreenEvent::Stay);
    }
}
