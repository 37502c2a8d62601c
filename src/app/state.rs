//! Central application state of lazyworktree.
//!
//! [Model] owns everything the UI shows: the worktree list and its filtered view, PR and CI
//! data, the active [Screen] and the status line. It is only ever mutated through
//! [Model::update], which consumes one [Message] and returns at most one [Command] for the
//! event loop to run. Blocking work never happens here; it is wrapped into a
//! [Task](crate::core::Task) that runs on the worker pool and reports back with a message.

use crate::app::keymap::Keymap;
use crate::app::message::Message;
use crate::app::screens::Intent;
use crate::app::view::{ViewParams, WorktreeView};
use crate::config::{Config, SortMode, Theme};
use crate::core::cache::{CiCache, CiEntry, save_snapshot};
use crate::core::hooks::{RepoHooks, TrustStore};
use crate::core::models::{CiCheck, PrState, PullRequest, WorkingTree};
use crate::core::tab::TerminalTabLauncher;
use crate::core::{CancelToken, Command, GitService};
use crate::screen::{InfoScreen, LoadingScreen, Screen, WelcomeScreen};
use crate::utils::relative_time;

use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Status shown while the worktree list is being rediscovered.
pub(crate) const REFRESHING: &str = "Refreshing worktrees...";
const LIST_FAILED: &str = "Failed to list worktrees";

/// Which half of the body has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    List,
    Detail,
}

impl Pane {
    pub fn toggle(self) -> Self {
        match self {
            Pane::List => Pane::Detail,
            Pane::Detail => Pane::List,
        }
    }
}

/// Everything resolved before the first frame.
#[derive(Default)]
pub struct Startup {
    /// Directory new worktrees of this repository are created in.
    pub worktree_root: Option<PathBuf>,
    pub main_path: Option<PathBuf>,
    pub cwd: PathBuf,
    pub initial_filter: String,
    /// Worktree recorded by the previous session, ranked first under the switched sort.
    pub last_selected: Option<PathBuf>,
    pub hooks: Option<RepoHooks>,
    pub trust: Option<TrustStore>,
    pub launcher: Option<Arc<dyn TerminalTabLauncher>>,
}

pub struct Model {
    pub(super) git: Arc<dyn GitService>,
    pub(super) config: Config,
    pub(super) theme: Theme,
    pub(super) keymap: Keymap,
    /// Root cancellation scope, cancelled on quit.
    pub(super) token: CancelToken,

    pub(super) worktree_root: Option<PathBuf>,
    pub(super) main_path: Option<PathBuf>,
    pub(super) cwd: PathBuf,
    pub(super) hooks: Option<RepoHooks>,
    pub(super) trust: Option<TrustStore>,
    pub(super) launcher: Option<Arc<dyn TerminalTabLauncher>>,

    pub(super) worktrees: Vec<WorkingTree>,
    pub(super) view: WorktreeView,
    pub(super) filter: String,
    pub(super) filter_active: bool,
    pub(super) focus: Pane,
    pub(super) sort_mode: SortMode,
    pub(super) switched: HashMap<PathBuf, u64>,
    pub(super) switch_seq: u64,

    pub(super) screen: Option<Screen>,
    pub(super) intent: Intent,

    pub(super) ci_cache: CiCache,
    pub(super) pr_map: HashMap<String, PullRequest>,
    pub(super) pr_data_loaded: bool,
    pub(super) pr_fetch_in_flight: bool,
    pub(super) pr_fetch_manual: bool,

    pub(super) width: u16,
    pub(super) height: u16,
    pub(super) detail_scroll: u16,
    pub(super) status: String,
    pub(super) refresh_in_flight: bool,
    pub(super) last_refresh: Option<Instant>,
    /// Worktree chosen with Enter; written out by the caller after the loop ends.
    pub(super) selected_path: Option<PathBuf>,
    pub(super) quitting: bool,
}

impl Model {
    pub fn new(git: Arc<dyn GitService>, config: Config, theme: Theme, startup: Startup) -> Self {
        let keymap = Keymap::new(config.general().custom_commands());
        let sort_mode = config.general().sort_mode();
        let mut model = Self {
            git,
            keymap,
            theme,
            token: CancelToken::new(),
            worktree_root: startup.worktree_root,
            main_path: startup.main_path,
            cwd: startup.cwd,
            hooks: startup.hooks,
            trust: startup.trust,
            launcher: startup.launcher,
            worktrees: Vec::new(),
            view: WorktreeView::default(),
            filter: startup.initial_filter,
            filter_active: false,
            focus: Pane::List,
            sort_mode,
            switched: HashMap::new(),
            switch_seq: 0,
            screen: None,
            intent: Intent::None,
            ci_cache: CiCache::default(),
            pr_map: HashMap::new(),
            pr_data_loaded: false,
            pr_fetch_in_flight: false,
            pr_fetch_manual: false,
            width: 0,
            height: 0,
            detail_scroll: 0,
            status: String::new(),
            refresh_in_flight: false,
            last_refresh: None,
            selected_path: None,
            quitting: false,
            config,
        };
        if let Some(path) = startup.last_selected {
            model.mark_switched(&path);
        }
        model
    }

    /// First command of the session: shows `snapshot` right away (if any) and starts the
    /// authoritative worktree discovery.
    pub fn init(&mut self, snapshot: Option<Vec<WorkingTree>>) -> Option<Command> {
        let cached = snapshot.and_then(|wts| self.update(Message::CachedWorktrees(wts)));
        let refresh = self.refresh();
        Command::batch([cached, refresh])
    }

    /// Applies one message. The returned command, if any, is run by the event loop.
    pub fn update(&mut self, msg: Message) -> Option<Command> {
        if !matches!(msg, Message::Tick) {
            tracing::debug!(kind = msg.kind(), "update");
        }
        match msg {
            Message::Key(key) => self.handle_key(key),
            Message::Resize { width, height } => {
                self.width = width;
                self.height = height;
                None
            }
            Message::Tick => self.on_tick(Instant::now()),
            Message::CachedWorktrees(wts) => {
                self.on_cached_worktrees(wts);
                None
            }
            Message::WorktreesLoaded(result) => self.on_worktrees_loaded(result),
            Message::PrDataLoaded(result) => self.on_pr_data_loaded(result),
            Message::CiStatusLoaded { branch, checks } => {
                self.on_ci_status_loaded(&branch, checks, Instant::now());
                None
            }
            Message::TerminalTabReady(result) => {
                match result {
                    Ok(text) => self.notify(text),
                    Err(e) => self.notify(format!("Failed to launch command: {e}")),
                }
                None
            }
            Message::CiRerunFinished {
                branch,
                run_url,
                error,
            } => {
                self.on_ci_rerun_finished(&branch, run_url, error);
                None
            }
            Message::OpenPrsLoaded(result) => self.on_open_prs_loaded(result),
            Message::IssuesLoaded(result) => self.on_issues_loaded(result),
            Message::CommitLoaded { path, result } => {
                self.on_commit_loaded(&path, result);
                None
            }
            Message::CommitFilesLoaded { path, result } => {
                self.on_commit_files_loaded(&path, result);
                None
            }
            Message::CommandFinished {
                label,
                result,
                refresh,
            } => self.on_command_finished(label, result, refresh),
            Message::Persisted { what, result } => {
                if let Err(e) = result {
                    tracing::warn!(what, error = %e, "failed to persist");
                }
                None
            }
            Message::Error(e) => {
                tracing::warn!(error = %e, "command failed");
                if !self.quitting {
                    self.notify(e);
                }
                None
            }
            Message::RefreshComplete => self.refresh(),
        }
    }

    // Getters / accessors

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[inline]
    pub fn worktrees(&self) -> &[WorkingTree] {
        &self.worktrees
    }

    #[inline]
    pub fn view(&self) -> &WorktreeView {
        &self.view
    }

    /// Worktrees in display order.
    pub fn visible(&self) -> impl Iterator<Item = &WorkingTree> {
        self.view
            .indices()
            .iter()
            .filter_map(|&i| self.worktrees.get(i))
    }

    pub fn selected_worktree(&self) -> Option<&WorkingTree> {
        self.view
            .selected_index()
            .and_then(|i| self.worktrees.get(i))
    }

    #[inline]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[inline]
    pub fn filter_active(&self) -> bool {
        self.filter_active
    }

    #[inline]
    pub fn focus(&self) -> Pane {
        self.focus
    }

    #[inline]
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    #[inline]
    pub fn screen(&self) -> Option<&Screen> {
        self.screen.as_ref()
    }

    #[inline]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[inline]
    pub fn ci_cache(&self) -> &CiCache {
        &self.ci_cache
    }

    #[inline]
    pub fn pr_data_loaded(&self) -> bool {
        self.pr_data_loaded
    }

    #[inline]
    pub fn is_refreshing(&self) -> bool {
        self.refresh_in_flight
    }

    #[inline]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[inline]
    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    /// Worktree the user chose with Enter, if any.
    #[inline]
    pub fn selected_path(&self) -> Option<&Path> {
        self.selected_path.as_deref()
    }

    #[inline]
    pub fn worktree_root(&self) -> Option<&Path> {
        self.worktree_root.as_deref()
    }

    #[inline]
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Title shown in the header: the main worktree's directory name.
    pub fn repo_name(&self) -> String {
        self.main_path
            .as_ref()
            .or(self.worktrees.iter().find(|w| w.is_main).map(|w| &w.path))
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Detail pane text for the selected worktree.
    pub fn info_content(&self) -> String {
        let Some(wt) = self.selected_worktree() else {
            return "No worktree selected.".to_string();
        };
        let mut out = format!("Path: {}\nBranch: {}\n", wt.path.display(), wt.branch);
        if wt.is_main {
            out.push_str("Main worktree\n");
        }

        if wt.dirty {
            out.push_str(&format!(
                "Status: {} staged, {} modified, {} untracked\n",
                wt.staged, wt.modified, wt.untracked
            ));
        } else {
            out.push_str("Status: clean\n");
        }
        if !wt.divergence.is_empty() {
            out.push_str(&format!("Divergence: {}\n", wt.divergence));
        }
        if wt.last_active > 0 {
            out.push_str(&format!(
                "Last active: {}\n",
                relative_time(wt.last_active, Utc::now())
            ));
        }

        if let Some(pr) = &wt.pr {
            out.push_str(&format!(
                "\nPR #{} [{}] {}\n{}\n",
                pr.number,
                pr.state.as_str(),
                pr.title,
                pr.url
            ));
        }

        match self.ci_cache.get(&wt.branch) {
            Some(CiEntry::Pending { previous, .. }) if previous.is_empty() => {
                out.push_str("\nCI Checks: loading...\n");
            }
            Some(entry) if !entry.checks().is_empty() => {
                out.push_str("\nCI Checks:\n");
                for check in self.ci_cache.sorted_checks(&wt.branch) {
                    out.push_str(&format!("  {} {}\n", check.conclusion.symbol(), check.name));
                }
            }
            _ => {}
        }
        out
    }

    // Refresh and background results

    /// Starts a worktree discovery unless one is already running.
    pub(super) fn refresh(&mut self) -> Option<Command> {
        if self.refresh_in_flight {
            return None;
        }
        self.refresh_in_flight = true;
        let git = Arc::clone(&self.git);
        Some(Command::task("list-worktrees", move |token| {
            Message::WorktreesLoaded(git.list_worktrees(token).map_err(|e| e.to_string()))
        }))
    }

    fn on_tick(&mut self, now: Instant) -> Option<Command> {
        let general = self.config.general();
        if !general.auto_refresh() || self.screen.is_some() || self.refresh_in_flight {
            return None;
        }
        let interval = Duration::from_secs(general.refresh_interval().max(1));
        match self.last_refresh {
            Some(at) if now.saturating_duration_since(at) >= interval => self.refresh(),
            _ => None,
        }
    }

    fn on_cached_worktrees(&mut self, wts: Vec<WorkingTree>) {
        // An authoritative list already arrived.
        if self.last_refresh.is_some() {
            return;
        }
        self.worktrees = wts;
        self.recompute();
        self.status = REFRESHING.to_string();
    }

    fn on_worktrees_loaded(&mut self, result: Result<Vec<WorkingTree>, String>) -> Option<Command> {
        self.refresh_in_flight = false;
        self.last_refresh = Some(Instant::now());
        let mut wts = match result {
            Ok(wts) => wts,
            Err(e) => {
                tracing::warn!(error = %e, "worktree discovery failed");
                if e.contains("not a git repository") {
                    let root = self
                        .worktree_root
                        .clone()
                        .unwrap_or_else(|| self.config.general().worktree_dir().clone());
                    self.open_screen(
                        Screen::Welcome(WelcomeScreen::new(self.cwd.clone(), root)),
                        Intent::Welcome,
                    );
                } else {
                    self.status = format!("{LIST_FAILED}: {e}");
                }
                return None;
            }
        };

        for wt in &mut wts {
            wt.pr = self.pr_map.get(&wt.branch).cloned();
        }
        self.worktrees = wts;
        self.recompute();
        if self.status == REFRESHING || self.status.starts_with(LIST_FAILED) {
            self.status.clear();
        }
        if matches!(self.intent, Intent::Welcome) {
            self.close_screen();
        }

        let save = self.worktree_root.clone().map(|root| {
            let snapshot = self.worktrees.clone();
            Command::task("save-snapshot", move |_| Message::Persisted {
                what: "worktree snapshot",
                result: save_snapshot(&root, &snapshot).map_err(|e| e.to_string()),
            })
        });
        let prs = if self.config.general().auto_fetch_prs() {
            self.fetch_prs(false)
        } else {
            None
        };
        let ci = self.maybe_fetch_ci();
        Command::batch([save, prs, ci])
    }

    /// Starts a PR fetch unless one is already running.
    pub(super) fn fetch_prs(&mut self, manual: bool) -> Option<Command> {
        self.pr_fetch_manual |= manual;
        if self.pr_fetch_in_flight {
            return None;
        }
        self.pr_fetch_in_flight = true;
        if manual {
            self.status = "Fetching PR data...".to_string();
        }
        let git = Arc::clone(&self.git);
        Some(Command::task("fetch-prs", move |token| {
            Message::PrDataLoaded(git.fetch_pr_map(token).map_err(|e| e.to_string()))
        }))
    }

    fn on_pr_data_loaded(
        &mut self,
        result: Result<HashMap<String, PullRequest>, String>,
    ) -> Option<Command> {
        self.pr_fetch_in_flight = false;
        let manual = std::mem::take(&mut self.pr_fetch_manual);
        match result {
            Ok(map) => {
                self.pr_map = map;
                for wt in &mut self.worktrees {
                    wt.pr = self.pr_map.get(&wt.branch).cloned();
                }
                self.pr_data_loaded = true;
                if manual {
                    self.status = format!("Loaded {} pull requests", self.pr_map.len());
                }
                self.maybe_fetch_ci()
            }
            Err(e) => {
                tracing::warn!(error = %e, "PR fetch failed");
                if manual {
                    self.notify(format!("Failed to fetch PR data: {e}"));
                } else {
                    self.status = "PR data unavailable".to_string();
                }
                None
            }
        }
    }

    /// Fetches CI checks for the selected worktree when the cache has nothing fresh for it.
    ///
    /// Worktrees with an open PR use the PR's checks, anything else the HEAD commit's check
    /// runs on GitHub. Branches hosted elsewhere get an empty result.
    pub(super) fn maybe_fetch_ci(&mut self) -> Option<Command> {
        let now = Instant::now();
        let wt = self.selected_worktree()?.clone();
        if !self.ci_cache.needs_fetch(&wt.branch, now) {
            return None;
        }
        self.ci_cache.mark_pending(&wt.branch, now);

        let git = Arc::clone(&self.git);
        let branch = wt.branch.clone();
        let open_pr = wt
            .pr
            .as_ref()
            .filter(|pr| pr.state == PrState::Open)
            .map(|pr| pr.number);
        Some(Command::task("fetch-ci", move |token| {
            let checks = match open_pr {
                Some(number) => git.fetch_ci_status_for_pr(token, number, &branch),
                None if git.is_hosted_on_github(token) => {
                    let sha = git.head_commit(token, &wt.path);
                    if sha.is_empty() {
                        Ok(Vec::new())
                    } else {
                        git.fetch_ci_status_for_commit(token, &sha, &wt.path)
                    }
                }
                None => Ok(Vec::new()),
            };
            Message::CiStatusLoaded {
                branch,
                checks: checks.map_err(|e| e.to_string()),
            }
        }))
    }

    fn on_ci_status_loaded(
        &mut self,
        branch: &str,
        checks: Result<Vec<CiCheck>, String>,
        now: Instant,
    ) {
        match checks {
            Ok(checks) => self.ci_cache.store(branch, checks, now),
            Err(e) => {
                tracing::warn!(branch, error = %e, "CI fetch failed");
                self.ci_cache.store(branch, Vec::new(), now);
            }
        }
    }

    fn on_command_finished(
        &mut self,
        label: &str,
        result: Result<Option<String>, String>,
        refresh: bool,
    ) -> Option<Command> {
        self.finish_loading(label);
        match result {
            Ok(Some(text)) => self.status = text,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(label, error = %e, "operation failed");
                self.notify(e);
            }
        }
        if refresh { self.refresh() } else { None }
    }

    // View helpers

    /// Rebuilds the filtered and sorted view, keeping the selection on the same worktree.
    pub(super) fn recompute(&mut self) {
        let params = ViewParams {
            filter: &self.filter,
            sort: self.sort_mode,
            fuzzy: self.config.general().fuzzy_finder_input(),
            switched: &self.switched,
        };
        self.view.recompute(&self.worktrees, &params);
    }

    /// Ranks `path` first under the switched sort.
    pub(super) fn mark_switched(&mut self, path: &Path) {
        self.switch_seq += 1;
        self.switched.insert(path.to_path_buf(), self.switch_seq);
    }

    /// Called after every cursor move.
    pub(super) fn on_selection_changed(&mut self) -> Option<Command> {
        self.detail_scroll = 0;
        self.maybe_fetch_ci()
    }

    // Screens

    pub(super) fn open_screen(&mut self, screen: Screen, intent: Intent) {
        tracing::debug!(screen = ?screen.kind(), "open screen");
        self.screen = Some(screen);
        self.intent = intent;
    }

    pub(super) fn close_screen(&mut self) {
        self.screen = None;
        self.intent = Intent::None;
    }

    pub(super) fn show_info(&mut self, message: impl Into<String>) {
        self.open_screen(Screen::Info(InfoScreen::new(message)), Intent::None);
    }

    pub(super) fn show_loading(&mut self, message: impl Into<String>, intent: Intent) {
        self.open_screen(Screen::Loading(LoadingScreen::new(message)), intent);
    }

    /// Closes the loading screen, but only when the operation labelled `label` opened it.
    pub(super) fn finish_loading(&mut self, label: &str) {
        if matches!(self.screen, Some(Screen::Loading(_)))
            && matches!(self.intent, Intent::Running(owner) if owner == label)
        {
            self.close_screen();
        }
    }

    /// Reports a background result in a popup, or on the status line while a loading screen
    /// is up.
    pub(super) fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        if matches!(self.screen, Some(Screen::Loading(_))) {
            self.status = message.replace('\n', " ");
        } else {
            self.show_info(message);
        }
    }

    pub(super) fn quit(&mut self) -> Option<Command> {
        self.quitting = true;
        self.token.cancel();
        Some(Command::Quit)
    }
}
