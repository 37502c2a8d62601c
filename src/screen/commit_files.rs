//! Files touched by the HEAD commit of a worktree.

use crate::config::Theme;
use crate::core::parse::CommitFile;
use crate::screen::{PickAction, ScreenEvent, Submission, scroll_offset, step_cursor};
use crate::ui::widgets::{popup_block, truncate_to_width};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CommitFilesScreen {
    worktree: PathBuf,
    files: Option<Vec<CommitFile>>,
    cursor: usize,
}

impl CommitFilesScreen {
    pub fn new(worktree: PathBuf) -> Self {
        Self {
            worktree,
            files: None,
            cursor: 0,
        }
    }

    #[inline]
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn set_files(&mut self, files: Vec<CommitFile>) {
        self.files = Some(files);
        self.cursor = 0;
    }

    pub fn file(&self, index: usize) -> Option<&CommitFile> {
        self.files.as_ref().and_then(|f| f.get(index))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let len = self.files.as_ref().map_or(0, Vec::len);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => ScreenEvent::Close,
            KeyCode::Enter if self.cursor < len => ScreenEvent::Submit(Submission::Pick {
                index: self.cursor,
                action: PickAction::Enter,
            }),
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = step_cursor(self.cursor, len, -1);
                ScreenEvent::Stay
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = step_cursor(self.cursor, len, 1);
                ScreenEvent::Stay
            }
            _ => ScreenEvent::Stay,
        }
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let rows = self.files.as_ref().map_or(1, |f| f.len().max(1)) as u16;
        (area.width.saturating_sub(4).min(90), rows.min(20) + 2)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block("Files in HEAD", theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(files) = &self.files else {
            frame.render_widget(
                Paragraph::new("Loading files...").style(theme.muted_style()),
                inner,
            );
            return;
        };
        if files.is_empty() {
            frame.render_widget(
                Paragraph::new("No files changed.").style(theme.muted_style()),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let width = inner.width as usize;
        let lines: Vec<Line> = files
            .iter()
            .enumerate()
            .skip(scroll_offset(self.cursor, height))
            .take(height)
            .map(|(i, f)| {
                let status_style = match f.status.as_str() {
                    "A" => theme.success_style(),
                    "D" => theme.error_style(),
                    _ => theme.warn_style(),
                };
                let line = Line::from(vec![
                    Span::styled(format!(" {} ", f.status), status_style),
                    Span::styled(
                        truncate_to_width(&f.path, width.saturating_sub(4)),
                        theme.text_style(),
                    ),
                ]);
                if i == self.cursor {
                    line.style(theme.selection_style())
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn picks_only_once_loaded() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        let mut s = CommitFilesScreen::new(PathBuf::from("/wt/a"));
        assert_eq!(s.handle_key(key(KeyCode::Enter)), ScreenEvent::Stay);
        s.set_files(vec![
            CommitFile {
                status: "M".into(),
                path: "src/lib.rs".into(),
            },
            CommitFile {
                status: "A".into(),
                path: "README.md".into(),
            },
        ]);
        s.handle_key(key(KeyCode::Char('j')));
        assert_eq!(
            s.handle_key(key(KeyCode::Enter)),
            ScreenEvent::Submit(Submission::Pick {
                index: 1,
                action: PickAction::Enter
            })
        );
        assert_eq!(s.file(1).map(|f| f.path.as_str()), Some("README.md"));
    }
}
