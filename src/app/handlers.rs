//! Key handling for the main view.
//!
//! This module implements the [Model] methods that route key events: to the active screen
//! when there is one, to the filter input while it is focused, and otherwise through the
//! [Keymap](crate::app::keymap::Keymap) to an [Action].

use crate::app::ci::{CI_LIST_FOOTER, NO_CHECKS_INFO, browser_argv};
use crate::app::keymap::{
    Action, NavAction, SystemAction, ViewAction, WorktreeAction, describe, help_entries,
    palette_actions,
};
use crate::app::message::Message;
use crate::app::screens::Intent;
use crate::app::state::{Model, Pane, REFRESHING};
use crate::core::models::{Conclusion, PrState};
use crate::core::tab::launched_message;
use crate::core::{Command, InteractiveCommand, RunOptions};
use crate::screen::{
    Checklist, CommitFilesScreen, CommitScreen, ConfirmScreen, HelpScreen, Screen, SelectItem,
    SelectList, TextInput, Tone,
};
use crate::utils::{relative_time, worktree_env};

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;

/// Rows taken by everything but the list: header, filter bar, borders and footer.
const CHROME_ROWS: u16 = 6;

impl Model {
    pub(super) fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if self.screen.is_some() {
            return self.handle_screen_key(key);
        }
        if self.filter_active {
            return self.handle_filter_key(key);
        }
        let action = self.keymap.lookup(key)?;
        self.dispatch(action)
    }

    /// Keys while the filter input has focus. Printable characters always edit the filter.
    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<Command> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.filter_active = false;
                self.filter.clear();
                self.after_filter_edit()
            }
            KeyCode::Enter => {
                if self.config.general().search_auto_select() && !self.view.is_empty() {
                    return self.select_current();
                }
                self.filter_active = false;
                self.focus = Pane::List;
                None
            }
            KeyCode::Backspace => {
                self.filter.pop()?;
                self.after_filter_edit()
            }
            KeyCode::Char('u') if ctrl => {
                self.filter.clear();
                self.after_filter_edit()
            }
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.filter.push(c);
                self.after_filter_edit()
            }
            _ => None,
        }
    }

    fn after_filter_edit(&mut self) -> Option<Command> {
        let before = self.view.selected_index();
        self.recompute();
        if self.view.selected_index() != before {
            self.on_selection_changed()
        } else {
            None
        }
    }

    pub(super) fn dispatch(&mut self, action: Action) -> Option<Command> {
        tracing::debug!(?action, "dispatch");
        match action {
            Action::Nav(nav) => self.handle_nav(nav),
            Action::Worktree(wt) => self.handle_worktree_action(wt),
            Action::View(view) => self.handle_view_action(view),
            Action::System(SystemAction::Quit) => self.quit(),
            Action::Custom(index) => self.run_custom_command(index),
        }
    }

    fn handle_nav(&mut self, nav: NavAction) -> Option<Command> {
        let page = self.height.saturating_sub(CHROME_ROWS).max(1) as isize;
        match nav {
            NavAction::Up | NavAction::Down if self.focus == Pane::Detail => {
                self.detail_scroll = if nav == NavAction::Up {
                    self.detail_scroll.saturating_sub(1)
                } else {
                    self.detail_scroll.saturating_add(1)
                };
                None
            }
            NavAction::Up => self.move_cursor(-1),
            NavAction::Down => self.move_cursor(1),
            NavAction::PageUp => self.move_cursor(-page),
            NavAction::PageDown => self.move_cursor(page),
            NavAction::Top => {
                if self.view.select_first(&self.worktrees) {
                    self.on_selection_changed()
                } else {
                    None
                }
            }
            NavAction::Bottom => {
                if self.view.select_last(&self.worktrees) {
                    self.on_selection_changed()
                } else {
                    None
                }
            }
            NavAction::ToggleFocus => {
                self.focus = self.focus.toggle();
                self.maybe_fetch_ci()
            }
            NavAction::Filter => {
                self.filter_active = true;
                self.focus = Pane::List;
                None
            }
            NavAction::ClearFilter => {
                if self.filter.is_empty() {
                    return None;
                }
                self.filter.clear();
                self.after_filter_edit()
            }
        }
    }

    pub(super) fn move_cursor(&mut self, delta: isize) -> Option<Command> {
        if self.view.move_by(delta, &self.worktrees) {
            self.on_selection_changed()
        } else {
            None
        }
    }

    fn handle_worktree_action(&mut self, action: WorktreeAction) -> Option<Command> {
        match action {
            WorktreeAction::Select => self.select_current(),
            WorktreeAction::Create => {
                self.open_create_input();
                None
            }
            WorktreeAction::CreateFromPr => self.request_open_prs(),
            WorktreeAction::CreateFromIssue => self.request_open_issues(),
            WorktreeAction::Delete => {
                self.confirm_delete();
                None
            }
            WorktreeAction::PruneMerged => {
                self.open_prune();
                None
            }
            WorktreeAction::Refresh => {
                self.status = REFRESHING.to_string();
                if let Some(branch) = self.selected_worktree().map(|w| w.branch.clone()) {
                    self.ci_cache.invalidate(&branch);
                }
                let refresh = self.refresh();
                let ci = self.maybe_fetch_ci();
                Command::batch([refresh, ci])
            }
            WorktreeAction::FetchPrs => self.fetch_prs(true),
            WorktreeAction::OpenPr => self.open_selected_pr(),
            WorktreeAction::CiChecks => {
                self.open_ci_checks();
                None
            }
        }
    }

    fn handle_view_action(&mut self, action: ViewAction) -> Option<Command> {
        match action {
            ViewAction::Commit => self.open_commit(),
            ViewAction::CommitFiles => self.open_commit_files(),
            ViewAction::CycleSort => {
                self.sort_mode = self.sort_mode.next();
                self.recompute();
                self.status = format!("Sort: {}", self.sort_mode.as_str());
                None
            }
            ViewAction::Help => {
                let entries = help_entries(self.config.general().custom_commands());
                self.open_screen(Screen::Help(HelpScreen::new(entries)), Intent::None);
                None
            }
            ViewAction::Palette => {
                self.open_palette();
                None
            }
        }
    }

    /// Records the selected worktree as the user's choice and quits.
    pub(super) fn select_current(&mut self) -> Option<Command> {
        let path = self.selected_worktree()?.path.clone();
        self.mark_switched(&path);
        self.selected_path = Some(path);
        self.quit()
    }

    fn open_palette(&mut self) {
        let custom = self.config.general().custom_commands();
        let actions = palette_actions(custom);
        let items = actions
            .iter()
            .map(|&a| {
                let (label, keys) = describe(a, custom);
                SelectItem::new(label).detail(keys)
            })
            .collect();
        let list = SelectList::new("Command palette", items).placeholder("Type a command...");
        self.open_screen(Screen::CommandPalette(list), Intent::Palette(actions));
    }

    fn open_create_input(&mut self) {
        if self.worktree_root.is_none() {
            self.show_info("Cannot create worktrees outside a git repository.");
            return;
        }
        let input =
            TextInput::new("Create worktree", "Branch name").placeholder("feature/my-change");
        self.open_screen(Screen::TextInput(input), Intent::CreateName);
    }

    fn request_open_prs(&mut self) -> Option<Command> {
        if self.worktree_root.is_none() {
            self.show_info("Cannot create worktrees outside a git repository.");
            return None;
        }
        self.show_loading("Fetching open pull requests...", Intent::AwaitingPrs);
        let git = Arc::clone(&self.git);
        Some(Command::task("list-open-prs", move |token| {
            Message::OpenPrsLoaded(git.list_open_prs(token).map_err(|e| e.to_string()))
        }))
    }

    fn request_open_issues(&mut self) -> Option<Command> {
        if self.worktree_root.is_none() {
            self.show_info("Cannot create worktrees outside a git repository.");
            return None;
        }
        self.show_loading("Fetching open issues...", Intent::AwaitingIssues);
        let git = Arc::clone(&self.git);
        Some(Command::task("list-open-issues", move |token| {
            Message::IssuesLoaded(git.list_open_issues(token).map_err(|e| e.to_string()))
        }))
    }

    fn confirm_delete(&mut self) {
        let Some(wt) = self.selected_worktree().cloned() else {
            return;
        };
        if wt.is_main {
            self.show_info("Cannot delete the main worktree.");
            return;
        }
        let confirm = ConfirmScreen::new(format!(
            "Delete worktree '{}' and branch '{}'?\n{}",
            wt.name(),
            wt.branch,
            wt.path.display()
        ));
        self.open_screen(Screen::Confirm(confirm), Intent::Delete(wt));
    }

    fn open_prune(&mut self) {
        if !self.pr_data_loaded {
            self.show_info("PR data not loaded. Press 'p' to fetch PR data first.");
            return;
        }
        let merged: Vec<_> = self
            .worktrees
            .iter()
            .filter(|wt| {
                !wt.is_main && wt.pr.as_ref().is_some_and(|pr| pr.state == PrState::Merged)
            })
            .cloned()
            .collect();
        if merged.is_empty() {
            self.show_info("No merged worktrees to prune.");
            return;
        }
        let items = merged
            .iter()
            .map(|wt| {
                let detail = wt
                    .pr
                    .as_ref()
                    .map(|pr| format!("#{} {}", pr.number, pr.title))
                    .unwrap_or_default();
                let tone = if wt.dirty { Tone::Pending } else { Tone::Normal };
                SelectItem::new(format!("{} ({})", wt.name(), wt.branch))
                    .detail(detail)
                    .tone(tone)
            })
            .collect();
        self.open_screen(
            Screen::Checklist(Checklist::new("Prune merged worktrees", items)),
            Intent::Prune(merged),
        );
    }

    fn open_selected_pr(&mut self) -> Option<Command> {
        let Some(url) = self
            .selected_worktree()
            .and_then(|wt| wt.pr.as_ref())
            .map(|pr| pr.url.clone())
        else {
            self.show_info("No pull request for this worktree. Press 'p' to fetch PR data first.");
            return None;
        };
        self.open_url(url)
    }

    /// Opens `url` with the platform opener on a worker.
    pub(super) fn open_url(&mut self, url: String) -> Option<Command> {
        let git = Arc::clone(&self.git);
        let cwd = self.cwd.clone();
        Some(Command::task("open-browser", move |token| {
            match git.run_command(token, &browser_argv(&url), &cwd, &RunOptions::quiet()) {
                Ok(_) => Message::CommandFinished {
                    label: "open-browser",
                    result: Ok(Some(format!("Opened {url}"))),
                    refresh: false,
                },
                Err(e) => Message::Error(format!("Failed to open {url}: {e}")),
            }
        }))
    }

    fn open_ci_checks(&mut self) {
        let Some(wt) = self.selected_worktree().cloned() else {
            return;
        };
        let checks = self.ci_cache.sorted_checks(&wt.branch);
        if checks.is_empty() {
            self.show_info(NO_CHECKS_INFO);
            return;
        }
        let now = Utc::now();
        let items = checks
            .iter()
            .map(|c| {
                let tone = match c.conclusion {
                    Conclusion::Success => Tone::Success,
                    Conclusion::Failure => Tone::Failure,
                    Conclusion::Pending => Tone::Pending,
                    Conclusion::Skipped | Conclusion::Cancelled | Conclusion::Unknown => {
                        Tone::Muted
                    }
                };
                let detail = match c.started_at {
                    Some(at) => format!(
                        "{} · {}",
                        c.conclusion.as_str(),
                        relative_time(at.timestamp(), now)
                    ),
                    None => c.conclusion.as_str().to_string(),
                };
                SelectItem::new(format!("{} {}", c.conclusion.symbol(), c.name))
                    .detail(detail)
                    .tone(tone)
            })
            .collect();
        let list = SelectList::new(format!("CI checks: {}", wt.branch), items)
            .placeholder("Filter checks...")
            .footer(CI_LIST_FOOTER, true);
        self.open_screen(Screen::ListSelect(list), Intent::CiChecks { wt, checks });
    }

    fn open_commit(&mut self) -> Option<Command> {
        let wt = self.selected_worktree()?.clone();
        self.open_screen(
            Screen::Commit(CommitScreen::new(wt.path.clone(), format!("HEAD of {}", wt.name()))),
            Intent::None,
        );
        let git = Arc::clone(&self.git);
        Some(Command::task("commit-details", move |token| {
            let result = git.commit_details(token, &wt.path).map_err(|e| e.to_string());
            Message::CommitLoaded {
                path: wt.path,
                result,
            }
        }))
    }

    fn open_commit_files(&mut self) -> Option<Command> {
        let path = self.selected_worktree()?.path.clone();
        self.open_screen(
            Screen::CommitFiles(CommitFilesScreen::new(path.clone())),
            Intent::CommitFiles,
        );
        let git = Arc::clone(&self.git);
        Some(Command::task("commit-files", move |token| {
            let result = git.commit_files(token, &path).map_err(|e| e.to_string());
            Message::CommitFilesLoaded { path, result }
        }))
    }

    /// Runs a `[[custom_commands]]` entry for the selected worktree, in a new terminal tab when
    /// it asks for one, otherwise in the foreground with the TUI suspended.
    fn run_custom_command(&mut self, index: usize) -> Option<Command> {
        let cmd = self.config.general().custom_commands().get(index)?.clone();
        let Some(wt) = self.selected_worktree().cloned() else {
            self.show_info("No worktree selected.");
            return None;
        };
        let env = worktree_env(&wt, self.main_path.as_deref());

        if !cmd.new_tab {
            return Some(Command::Exec(
                InteractiveCommand::shell(cmd.command, wt.path).with_env(env),
            ));
        }

        let Some(launcher) = self.launcher.clone() else {
            self.show_info(
                "Opening a new tab needs a supported terminal (Kitty with remote control).",
            );
            return None;
        };
        let title = if cmd.description.is_empty() {
            wt.name()
        } else {
            cmd.description.clone()
        };
        Some(Command::task("launch-tab", move |token| {
            let result = launcher
                .launch(token, &cmd.command, &wt.path, &title, &env)
                .map(|tab| launched_message(launcher.name(), &tab))
                .map_err(|e| e.to_string());
            Message::TerminalTabReady(result)
        }))
    }
}
