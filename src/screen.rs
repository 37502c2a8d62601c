//! Modal screens.
//!
//! At most one [Screen] is active at a time. While it is, it receives every key first and the
//! base layout gets nothing. A screen never touches the model: it answers each key with a
//! [ScreenEvent] and the model decides what a [Submission] means, based on what it opened the
//! screen for.
//!
//! Most screens are drawn as popups over the base layout at a fixed distance from the top
//! ([ScreenKind::overlay_offset]); the trust prompt and the welcome screen take the whole
//! terminal.

pub mod checklist;
pub mod commit;
pub mod commit_files;
pub mod confirm;
pub mod help;
pub mod input;
pub mod loading;
pub mod select;
pub mod trust;
pub mod welcome;

pub use checklist::Checklist;
pub use commit::CommitScreen;
pub use commit_files::CommitFilesScreen;
pub use confirm::{ConfirmScreen, InfoScreen};
pub use help::HelpScreen;
pub use input::TextInput;
pub use loading::LoadingScreen;
pub use select::{SelectItem, SelectList};
pub use trust::{TrustChoice, TrustScreen};
pub use welcome::WelcomeScreen;

use crate::config::Theme;

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect, style::Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    CommandPalette,
    PrSelect,
    IssueSelect,
    ListSelect,
    Checklist,
    Help,
    Commit,
    Confirm,
    Info,
    TextInput,
    Loading,
    CommitFiles,
    Trust,
    Welcome,
}

impl ScreenKind {
    /// Rows between the top of the terminal and the popup. `None` for full-screen views.
    pub fn overlay_offset(self) -> Option<u16> {
        match self {
            ScreenKind::CommandPalette => Some(3),
            ScreenKind::PrSelect
            | ScreenKind::IssueSelect
            | ScreenKind::ListSelect
            | ScreenKind::Checklist
            | ScreenKind::Commit
            | ScreenKind::CommitFiles => Some(2),
            ScreenKind::Help => Some(4),
            ScreenKind::Confirm
            | ScreenKind::Info
            | ScreenKind::TextInput
            | ScreenKind::Loading => Some(5),
            ScreenKind::Trust | ScreenKind::Welcome => None,
        }
    }
}

/// How a screen answered a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Stay,
    Close,
    Submit(Submission),
}

/// Which key picked an entry of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickAction {
    Enter,
    ViewLogs,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Index into the items the list was built with.
    Pick { index: usize, action: PickAction },
    Checked(Vec<usize>),
    Confirmed,
    Text(String),
    Trust(TrustChoice),
    Retry,
    Quit,
}

/// Color hint for list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Success,
    Failure,
    Pending,
    Muted,
}

impl Tone {
    pub fn style(self, theme: &Theme) -> Style {
        match self {
            Tone::Normal => theme.text_style(),
            Tone::Success => theme.success_style(),
            Tone::Failure => theme.error_style(),
            Tone::Pending => theme.warn_style(),
            Tone::Muted => theme.muted_style(),
        }
    }
}

#[derive(Debug)]
pub enum Screen {
    CommandPalette(SelectList),
    PrSelect(SelectList),
    IssueSelect(SelectList),
    ListSelect(SelectList),
    Checklist(Checklist),
    Help(HelpScreen),
    Commit(CommitScreen),
    Confirm(ConfirmScreen),
    Info(InfoScreen),
    TextInput(TextInput),
    Loading(LoadingScreen),
    CommitFiles(CommitFilesScreen),
    Trust(TrustScreen),
    Welcome(WelcomeScreen),
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::CommandPalette(_) => ScreenKind::CommandPalette,
            Screen::PrSelect(_) => ScreenKind::PrSelect,
            Screen::IssueSelect(_) => ScreenKind::IssueSelect,
            Screen::ListSelect(_) => ScreenKind::ListSelect,
            Screen::Checklist(_) => ScreenKind::Checklist,
            Screen::Help(_) => ScreenKind::Help,
            Screen::Commit(_) => ScreenKind::Commit,
            Screen::Confirm(_) => ScreenKind::Confirm,
            Screen::Info(_) => ScreenKind::Info,
            Screen::TextInput(_) => ScreenKind::TextInput,
            Screen::Loading(_) => ScreenKind::Loading,
            Screen::CommitFiles(_) => ScreenKind::CommitFiles,
            Screen::Trust(_) => ScreenKind::Trust,
            Screen::Welcome(_) => ScreenKind::Welcome,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        match self {
            Screen::CommandPalette(s)
            | Screen::PrSelect(s)
            | Screen::IssueSelect(s)
            | Screen::ListSelect(s) => s.handle_key(key),
            Screen::Checklist(s) => s.handle_key(key),
            Screen::Help(s) => s.handle_key(key),
            Screen::Commit(s) => s.handle_key(key),
            Screen::Confirm(s) => s.handle_key(key),
            Screen::Info(s) => s.handle_key(key),
            Screen::TextInput(s) => s.handle_key(key),
            Screen::Loading(s) => s.handle_key(key),
            Screen::CommitFiles(s) => s.handle_key(key),
            Screen::Trust(s) => s.handle_key(key),
            Screen::Welcome(s) => s.handle_key(key),
        }
    }

    /// Width and height the screen wants within `area`.
    pub fn size(&self, area: Rect) -> (u16, u16) {
        match self {
            Screen::CommandPalette(s)
            | Screen::PrSelect(s)
            | Screen::IssueSelect(s)
            | Screen::ListSelect(s) => s.size(area),
            Screen::Checklist(s) => s.size(area),
            Screen::Help(s) => s.size(area),
            Screen::Commit(s) => s.size(area),
            Screen::Confirm(s) => s.size(area),
            Screen::Info(s) => s.size(area),
            Screen::TextInput(s) => s.size(area),
            Screen::Loading(s) => s.size(area),
            Screen::CommitFiles(s) => s.size(area),
            Screen::Trust(s) => s.size(area),
            Screen::Welcome(s) => s.size(area),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        match self {
            Screen::CommandPalette(s)
            | Screen::PrSelect(s)
            | Screen::IssueSelect(s)
            | Screen::ListSelect(s) => s.render(frame, area, theme),
            Screen::Checklist(s) => s.render(frame, area, theme),
            Screen::Help(s) => s.render(frame, area, theme),
            Screen::Commit(s) => s.render(frame, area, theme),
            Screen::Confirm(s) => s.render(frame, area, theme),
            Screen::Info(s) => s.render(frame, area, theme),
            Screen::TextInput(s) => s.render(frame, area, theme),
            Screen::Loading(s) => s.render(frame, area, theme),
            Screen::CommitFiles(s) => s.render(frame, area, theme),
            Screen::Trust(s) => s.render(frame, area, theme),
            Screen::Welcome(s) => s.render(frame, area, theme),
        }
    }
}

/// Cursor movement shared by the list-like screens. Returns the new cursor.
pub(crate) fn step_cursor(cursor: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, len as isize - 1) as usize
}

/// First visible row so that `cursor` stays within a window of `height` rows.
pub(crate) fn scroll_offset(cursor: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    cursor.saturating_sub(height - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_per_kind() {
        assert_eq!(ScreenKind::CommandPalette.overlay_offset(), Some(3));
        assert_eq!(ScreenKind::Commit.overlay_offset(), Some(2));
        assert_eq!(ScreenKind::Help.overlay_offset(), Some(4));
        assert_eq!(ScreenKind::Loading.overlay_offset(), Some(5));
        assert_eq!(ScreenKind::Welcome.overlay_offset(), None);
    }

    #[test]
    fn cursor_helpers() {
        assert_eq!(step_cursor(0, 3, -1), 0);
        assert_eq!(step_cursor(1, 3, 5), 2);
        assert_eq!(step_cursor(0, 0, 1), 0);
        assert_eq!(scroll_offset(2, 5), 0);
        assert_eq!(scroll_offset(7, 5), 3);
    }
}
