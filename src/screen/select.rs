//! Filterable single-choice list: the command palette, PR and issue pickers and the CI check
//! list all use it.

use crate::config::Theme;
use crate::screen::{PickAction, ScreenEvent, Submission, Tone, scroll_offset, step_cursor};
use crate::ui::widgets::{popup_block, truncate_to_width};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectItem {
    pub label: String,
    /// Dimmed text after the label (shortcut, author, status).
    pub detail: String,
    pub tone: Tone,
}

impl SelectItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

#[derive(Debug)]
pub struct SelectList {
    title: String,
    placeholder: String,
    empty_text: String,
    footer: Option<String>,
    items: Vec<SelectItem>,
    query: String,
    filtered: Vec<usize>,
    cursor: usize,
    ctrl_actions: bool,
}

impl SelectList {
    pub fn new(title: impl Into<String>, items: Vec<SelectItem>) -> Self {
        let filtered = (0..items.len()).collect();
        Self {
            title: title.into(),
            placeholder: "Type to filter...".to_string(),
            empty_text: "No matches.".to_string(),
            footer: None,
            items,
            query: String::new(),
            filtered,
            cursor: 0,
            ctrl_actions: false,
        }
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    /// Footer hint; enables Ctrl+v and Ctrl+r picks when `ctrl_actions` is set.
    pub fn footer(mut self, text: impl Into<String>, ctrl_actions: bool) -> Self {
        self.footer = Some(text.into());
        self.ctrl_actions = ctrl_actions;
        self
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Indices of the visible items, best match first.
    #[inline]
    pub fn visible(&self) -> &[usize] {
        &self.filtered
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.filtered.get(self.cursor).copied()
    }

    fn refilter(&mut self) {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            self.filtered = (0..self.items.len()).collect();
        } else {
            let matcher = SkimMatcherV2::default();
            let mut scored: Vec<(i64, usize)> = self
                .items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let hay = format!("{} {}", item.label, item.detail).to_lowercase();
                    matcher.fuzzy_match(&hay, &needle).map(|score| (score, i))
                })
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            self.filtered = scored.into_iter().map(|(_, i)| i).collect();
        }
        self.cursor = 0;
    }

    fn pick(&self, action: PickAction) -> ScreenEvent {
        match self.selected_index() {
            Some(index) => ScreenEvent::Submit(Submission::Pick { index, action }),
            None => ScreenEvent::Stay,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ScreenEvent::Close,
            KeyCode::Enter => return self.pick(PickAction::Enter),
            KeyCode::Char('v') if ctrl && self.ctrl_actions => {
                return self.pick(PickAction::ViewLogs);
            }
            KeyCode::Char('r') if ctrl && self.ctrl_actions => {
                return self.pick(PickAction::Restart);
            }
            KeyCode::Up => self.cursor = step_cursor(self.cursor, self.filtered.len(), -1),
            KeyCode::Down => self.cursor = step_cursor(self.cursor, self.filtered.len(), 1),
            KeyCode::Char('k' | 'p') if ctrl => {
                self.cursor = step_cursor(self.cursor, self.filtered.len(), -1);
            }
            KeyCode::Char('j' | 'n') if ctrl => {
                self.cursor = step_cursor(self.cursor, self.filtered.len(), 1);
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
            }
            KeyCode::Char(c) if !ctrl => {
                self.query.push(c);
                self.refilter();
            }
            _ => {}
        }
        ScreenEvent::Stay
    }

    pub fn size(&self, area: Rect) -> (u16, u16) {
        let width = area.width.saturating_sub(4).clamp(20, 80);
        let footer = u16::from(self.footer.is_some());
        let rows = (self.items.len().max(1) as u16).min(16);
        (width, rows + 4 + footer)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = popup_block(&self.title, theme);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let footer_rows = u16::from(self.footer.is_some());
        let [query_area, sep_area, list_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(footer_rows),
        ])
        .areas(inner);

        let query_line = if self.query.is_empty() {
            Line::from(vec![
                Span::styled("> ", theme.accent_style()),
                Span::styled(self.placeholder.clone(), theme.muted_style()),
            ])
        } else {
            Line::from(vec![
                Span::styled("> ", theme.accent_style()),
                Span::styled(self.query.clone(), theme.text_style()),
            ])
        };
        frame.render_widget(Paragraph::new(query_line), query_area);
        frame.render_widget(
            Paragraph::new("─".repeat(sep_area.width as usize)).style(theme.muted_style()),
            sep_area,
        );

        if self.filtered.is_empty() {
            frame.render_widget(
                Paragraph::new(self.empty_text.clone()).style(theme.muted_style()),
                list_area,
            );
        } else {
            let height = list_area.height as usize;
            let offset = scroll_offset(self.cursor, height);
            let width = list_area.width as usize;
            let lines: Vec<Line> = self
                .filtered
                .iter()
                .enumerate()
                .skip(offset)
                .take(height)
                .map(|(pos, &i)| {
                    let item = &self.items[i];
                    let label = truncate_to_width(&item.label, width.saturating_sub(2));
                    let mut spans = vec![Span::styled(format!(" {label}"), item.tone.style(theme))];
                    let room = width.saturating_sub(label.width() + 3);
                    if !item.detail.is_empty() && room > 4 {
                        spans.push(Span::styled(
                            format!("  {}", truncate_to_width(&item.detail, room - 2)),
                            theme.muted_style(),
                        ));
                    }
                    let line = Line::from(spans);
                    if pos == self.cursor {
                        line.style(theme.selection_style())
                    } else {
                        line
                    }
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), list_area);
        }

        if let Some(footer) = &self.footer {
            frame.render_widget(
                Paragraph::new(footer.clone()).style(theme.muted_style()),
                footer_area,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn list() -> SelectList {
        SelectList::new(
            "Pick",
            vec![
                SelectItem::new("Create worktree"),
                SelectItem::new("Delete worktree"),
                SelectItem::new("Refresh"),
            ],
        )
    }

    #[test]
    fn typing_filters_and_enter_picks_original_index() {
        let mut l = list();
        for c in "refr".chars() {
            assert_eq!(l.handle_key(key(KeyCode::Char(c))), ScreenEvent::Stay);
        }
        assert_eq!(l.visible(), &[2]);
        assert_eq!(
            l.handle_key(key(KeyCode::Enter)),
            ScreenEvent::Submit(Submission::Pick {
                index: 2,
                action: PickAction::Enter
            })
        );
    }

    #[test]
    fn navigation_and_escape() {
        let mut l = list();
        l.handle_key(key(KeyCode::Down));
        l.handle_key(ctrl('n'));
        l.handle_key(ctrl('n'));
        assert_eq!(l.selected_index(), Some(2));
        l.handle_key(key(KeyCode::Up));
        assert_eq!(l.selected_index(), Some(1));
        assert_eq!(l.handle_key(key(KeyCode::Esc)), ScreenEvent::Close);
    }

    #[test]
    fn ctrl_actions_only_when_enabled() {
        let mut plain = list();
        assert_eq!(plain.handle_key(ctrl('r')), ScreenEvent::Stay);

        let mut ci = list().footer("hint", true);
        assert_eq!(
            ci.handle_key(ctrl('r')),
            ScreenEvent::Submit(Submission::Pick {
                index: 0,
                action: PickAction::Restart
            })
        );
        assert_eq!(
            ci.handle_key(ctrl('v')),
            ScreenEvent::Submit(Submission::Pick {
                index: 0,
                action: PickAction::ViewLogs
            })
        );
    }

    #[test]
    fn no_match_enter_stays() {
        let mut l = list();
        for c in "zzz".chars() {
            l.handle_key(key(KeyCode::Char(c)));
        }
        assert!(l.visible().is_empty());
        assert_eq!(l.handle_key(key(KeyCode::Enter)), ScreenEvent::Stay);
        l.handle_key(key(KeyCode::Backspace));
        l.handle_key(key(KeyCode::Backspace));
        l.handle_key(key(KeyCode::Backspace));
        assert_eq!(l.visible().len(), 3);
    }
}
