//! Multiple-choice list, used to pick merged worktrees to prune.

use crate::config::Theme;
use crate::screen::{ScreenEvent, SelectItem, Submission, scroll_offset, step_cursor};
use crate::ui::widgets::{hint_line, popup_block, truncate_to_width};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

#[derive(Debug)]
pub struct Checklist {
    title: String,
    items: Vec<SelectItem>,
    checked: Vec<bool>,
    cursor: usize,
}

impl Checklist {
    /// All items start checked.
    pub fn new(title: impl Into<String>, items: Vec<SelectItem>) -> Self {
        let checked = vec![true; items.len()];
        Self {
            title: title.into(),
            items,
            checked,
            cursor: 0,
        }
    }

    pub fn checked(&self) -> Vec<usize> {
        self.checked
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let len = self.items.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ScreenEvent::Close,
            KeyCode::Enter => return ScreenEvent::Submit(Submission::Checked(self.checked())),
            KeyCode::Up | KeyCode::Char('k') => self.cursor = step_cursor(self.cursor, len, -1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor = step_cursor(self.cursor, len, 1),
            KeyCode::Char(' ') => {
                if let Some(on) = self.checked.get_mut(self.cursor) {
                    *on = !*on;
                }
            }
            KeyCode::Char('a') => {
                let all = self.checked.iter().all(|&on| on);
                self.checked.iter_mut().for_each(|on| *on = !all);
            }
            _ => {}
        }
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let rows = (self.items.len().max(1) as u16).min(16);
        (area.width.saturating_sub(4).clamp(20, 80), rows + 3)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block(&self.title, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [list_area, hint_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        let height = list_area.height as usize;
        let width = list_area.width as usize;
        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .skip(scroll_offset(self.cursor, height))
            .take(height)
            .map(|(i, item)| {
                let mark = if self.checked[i] { "[x]" } else { "[ ]" };
                let line = Line::from(vec![
                    Span::styled(format!(" {mark} "), theme.accent_style()),
                    Span::styled(
                        truncate_to_width(&item.label, width.saturating_sub(6)),
                        item.tone.style(theme),
                    ),
                ]);
                if i == self.cursor {
                    line.style(theme.selection_style())
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), list_area);
        frame.render_widget(
            Paragraph::new(hint_line(
                &[("space", "toggle"), ("a", "all"), ("enter", "confirm"), ("esc", "cancel")],
                theme,
            )),
            hint_area,
        );
    }
}
