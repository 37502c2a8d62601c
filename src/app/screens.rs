//! Screen submissions and the results of the work they start.
//!
//! Every open screen is paired with an [Intent] telling the [Model] what the screen was opened
//! for. A screen only reports which entry was picked or what text was entered; the model
//! validates the submission, performs it, and either closes the screen or leaves it open.

use crate::app::ci::{CheckLink, RERUN_TIMEOUT_SECS, log_view_script};
use crate::app::keymap::Action;
use crate::app::message::Message;
use crate::app::state::{Model, REFRESHING};
use crate::core::hooks::{TrustMode, TrustStatus};
use crate::core::models::{CiCheck, Issue, PullRequest, WorkingTree};
use crate::core::{CancelToken, Command, GitService, InteractiveCommand, RunOptions};
use crate::screen::{
    PickAction, Screen, ScreenEvent, SelectItem, SelectList, Submission, TextInput, TrustChoice,
    TrustScreen,
};
use crate::utils::helpers::{ci_env, issue_worktree_name, pr_worktree_name};
use crate::utils::{sanitize_branch_name, shell_quote, worktree_env};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const RERUN_LABEL: &str = "rerun-ci";

/// What the active screen was opened for.
#[derive(Debug, Default)]
pub(crate) enum Intent {
    #[default]
    None,
    Palette(Vec<Action>),
    /// Branch name prompt for a new worktree.
    CreateName,
    AwaitingPrs,
    PickPr(Vec<PullRequest>),
    AwaitingIssues,
    PickIssue(Vec<Issue>),
    CiChecks {
        wt: WorkingTree,
        checks: Vec<CiCheck>,
    },
    /// A loading screen owned by the operation whose result carries this label.
    Running(&'static str),
    Delete(WorkingTree),
    Prune(Vec<WorkingTree>),
    CommitFiles,
    Trust(PendingCreate),
    Welcome,
}

#[derive(Debug, Clone)]
pub(crate) enum CreateSource {
    Branch(String),
    Pr(PullRequest),
}

/// A worktree creation waiting on the trust prompt.
#[derive(Debug, Clone)]
pub(crate) struct PendingCreate {
    pub(crate) source: CreateSource,
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

impl PendingCreate {
    fn branch(&self) -> &str {
        match &self.source {
            CreateSource::Branch(b) => b,
            CreateSource::Pr(pr) => &pr.head_branch,
        }
    }
}

/// Why `name` cannot be used as a new branch, if anything.
pub(crate) fn branch_name_error(name: &str, worktrees: &[WorkingTree]) -> Option<String> {
    if name.is_empty() {
        return Some("Branch name cannot be empty.".to_string());
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
        || name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("//")
    {
        return Some(format!("'{name}' is not a valid branch name."));
    }
    if worktrees.iter().any(|wt| wt.branch == name) {
        return Some(format!("Branch '{name}' is already checked out."));
    }
    None
}

impl Model {
    pub(super) fn handle_screen_key(&mut self, key: crossterm::event::KeyEvent) -> Option<Command> {
        let event = self.screen.as_mut()?.handle_key(key);
        match event {
            ScreenEvent::Stay => None,
            ScreenEvent::Close => {
                self.close_screen();
                None
            }
            ScreenEvent::Submit(sub) => self.on_submit(sub),
        }
    }

    fn on_submit(&mut self, sub: Submission) -> Option<Command> {
        let intent = std::mem::take(&mut self.intent);
        match (intent, sub) {
            (_, Submission::Quit) => self.quit(),
            (Intent::Palette(actions), Submission::Pick { index, .. }) => {
                self.close_screen();
                let action = actions.get(index).copied()?;
                self.dispatch(action)
            }
            (Intent::CreateName, Submission::Text(name)) => self.submit_branch_name(name),
            (Intent::PickPr(prs), Submission::Pick { index, .. }) => {
                self.close_screen();
                let pr = prs.into_iter().nth(index)?;
                self.create_from_pr(pr)
            }
            (Intent::PickIssue(issues), Submission::Pick { index, .. }) => {
                let issue = issues.get(index)?;
                let template = self.config.general().issue_branch_name_template();
                let name = issue_worktree_name(issue, template, None);
                let title = format!("Worktree for issue #{}", issue.number);
                let input = TextInput::new(title, "Branch name").value(name);
                self.open_screen(Screen::TextInput(input), Intent::CreateName);
                None
            }
            (Intent::CiChecks { wt, checks }, Submission::Pick { index, action }) => {
                self.on_ci_pick(wt, checks, index, action)
            }
            (Intent::Delete(wt), Submission::Confirmed) => self.delete_worktree(wt),
            (Intent::Prune(candidates), Submission::Checked(indices)) => {
                self.prune_worktrees(candidates, &indices)
            }
            (Intent::CommitFiles, Submission::Pick { index, .. }) => {
                self.intent = Intent::CommitFiles;
                self.show_file_diff(index)
            }
            (Intent::Trust(pending), Submission::Trust(choice)) => {
                self.on_trust_choice(pending, choice)
            }
            (Intent::Welcome, Submission::Retry) => {
                self.close_screen();
                self.status = REFRESHING.to_string();
                self.refresh()
            }
            (intent, sub) => {
                tracing::debug!(?sub, "submission ignored");
                self.intent = intent;
                None
            }
        }
    }

    // Worktree creation

    fn submit_branch_name(&mut self, name: String) -> Option<Command> {
        let name = name.trim().to_string();
        let dir = sanitize_branch_name(&name, 0);
        let root = self.worktree_root.clone()?;
        let path = root.join(&dir);

        let error = branch_name_error(&name, &self.worktrees)
            .or_else(|| dir.is_empty().then(|| format!("'{name}' is not a valid branch name.")))
            .or_else(|| {
                path.exists()
                    .then(|| format!("Path already exists: {}", path.display()))
            });
        if let Some(error) = error {
            if let Some(Screen::TextInput(input)) = self.screen.as_mut() {
                input.set_error(error);
            }
            self.intent = Intent::CreateName;
            return None;
        }

        self.close_screen();
        self.begin_create(PendingCreate {
            source: CreateSource::Branch(name),
            name: dir,
            path,
        })
    }

    fn create_from_pr(&mut self, pr: PullRequest) -> Option<Command> {
        let root = self.worktree_root.clone()?;
        let template = self.config.general().pr_branch_name_template();
        let name = pr_worktree_name(&pr, template, None);
        let path = root.join(&name);
        if path.exists() {
            self.show_info(format!("Path already exists: {}", path.display()));
            return None;
        }
        self.begin_create(PendingCreate {
            source: CreateSource::Pr(pr),
            name,
            path,
        })
    }

    /// Decides whether the repository's `.wt` commands may run, asking when the file is new or
    /// changed under the trust-on-first-use mode.
    fn begin_create(&mut self, pending: PendingCreate) -> Option<Command> {
        let Some(hooks) = self.hooks.clone().filter(|h| !h.is_empty()) else {
            return self.run_create(pending, Vec::new());
        };
        match self.config.general().trust_mode() {
            TrustMode::Never => self.run_create(pending, Vec::new()),
            TrustMode::Always => self.run_create(pending, hooks.init_commands),
            TrustMode::Tofu => {
                let status = self.trust.as_ref().map(|t| t.check(&hooks));
                if status == Some(TrustStatus::Trusted) {
                    return self.run_create(pending, hooks.init_commands);
                }
                self.open_screen(
                    Screen::Trust(TrustScreen::new(hooks.path, hooks.init_commands)),
                    Intent::Trust(pending),
                );
                None
            }
        }
    }

    fn on_trust_choice(&mut self, pending: PendingCreate, choice: TrustChoice) -> Option<Command> {
        self.close_screen();
        match choice {
            TrustChoice::Trust => {
                let hooks = self.hooks.clone()?;
                let save = self.trust.as_mut().map(|store| {
                    store.trust(&hooks);
                    let store = store.clone();
                    Command::task("save-trust", move |_| Message::Persisted {
                        what: "trust store",
                        result: store.save().map_err(|e| e.to_string()),
                    })
                });
                let create = self.run_create(pending, hooks.init_commands);
                Command::batch([save, create])
            }
            TrustChoice::Block => {
                tracing::info!("repository hooks blocked");
                self.run_create(pending, Vec::new())
            }
            TrustChoice::Cancel => {
                self.status = "Worktree creation cancelled".to_string();
                None
            }
        }
    }

    fn run_create(
        &mut self,
        pending: PendingCreate,
        repo_commands: Vec<String>,
    ) -> Option<Command> {
        self.mark_switched(&pending.path);
        self.view.select_path(&pending.path, &self.worktrees);
        self.show_loading(
            format!("Creating worktree {}...", pending.name),
            Intent::Running("create"),
        );

        let mut commands = self.config.general().init_commands().to_vec();
        commands.extend(repo_commands);
        let git = Arc::clone(&self.git);
        let main = self.main_path.clone();
        Some(Command::task("create-worktree", move |token| {
            let result = create_and_init(git.as_ref(), token, &pending, &commands, main.as_deref());
            Message::CommandFinished {
                label: "create",
                result: result.map(Some),
                refresh: true,
            }
        }))
    }

    // Removal

    fn delete_worktree(&mut self, wt: WorkingTree) -> Option<Command> {
        self.close_screen();
        self.ci_cache.invalidate(&wt.branch);
        self.show_loading(
            format!("Deleting worktree {}...", wt.name()),
            Intent::Running("delete"),
        );
        let git = Arc::clone(&self.git);
        Some(Command::task("delete-worktree", move |token| {
            let result = git
                .remove_worktree(token, &wt.path, deletable_branch(&wt))
                .map(|_| Some(format!("Deleted worktree {}", wt.name())))
                .map_err(|e| format!("Failed to delete worktree {}: {e}", wt.name()));
            Message::CommandFinished {
                label: "delete",
                result,
                refresh: true,
            }
        }))
    }

    fn prune_worktrees(
        &mut self,
        candidates: Vec<WorkingTree>,
        indices: &[usize],
    ) -> Option<Command> {
        self.close_screen();
        let chosen: Vec<WorkingTree> = indices
            .iter()
            .filter_map(|&i| candidates.get(i).cloned())
            .collect();
        if chosen.is_empty() {
            self.status = "Nothing selected to prune".to_string();
            return None;
        }
        for wt in &chosen {
            self.ci_cache.invalidate(&wt.branch);
        }
        self.show_loading(
            format!("Pruning {} worktrees...", chosen.len()),
            Intent::Running("prune"),
        );
        let git = Arc::clone(&self.git);
        Some(Command::task("prune-worktrees", move |token| {
            let mut failures = Vec::new();
            for wt in &chosen {
                if token.is_cancelled() {
                    break;
                }
                if let Err(e) = git.remove_worktree(token, &wt.path, deletable_branch(wt)) {
                    failures.push(format!("{}: {e}", wt.name()));
                }
            }
            let result = if failures.is_empty() {
                Ok(Some(format!("Pruned {} worktrees", chosen.len())))
            } else {
                Err(format!("Failed to prune:\n{}", failures.join("\n")))
            };
            Message::CommandFinished {
                label: "prune",
                result,
                refresh: true,
            }
        }))
    }

    // CI checks

    fn on_ci_pick(
        &mut self,
        wt: WorkingTree,
        checks: Vec<CiCheck>,
        index: usize,
        action: PickAction,
    ) -> Option<Command> {
        let Some(check) = checks.get(index).cloned() else {
            self.intent = Intent::CiChecks { wt, checks };
            return None;
        };
        if check.link.is_empty() {
            self.show_info("No link available for this check.");
            return None;
        }
        let link = CheckLink::parse(&check.link);

        match action {
            PickAction::Enter => {
                self.intent = Intent::CiChecks { wt, checks };
                self.open_url(check.link)
            }
            PickAction::ViewLogs if !link.is_actions_run() => {
                self.intent = Intent::CiChecks { wt, checks };
                self.open_url(check.link)
            }
            PickAction::ViewLogs => {
                let general = self.config.general();
                let script = log_view_script(
                    &check,
                    &link.run_id,
                    general.pager(),
                    general.ci_script_pager(),
                );
                let base = worktree_env(&wt, self.main_path.as_deref());
                let env = ci_env(base, &check, &link.run_id);
                let cmd = InteractiveCommand::shell(script, wt.path.clone()).with_env(env);
                self.intent = Intent::CiChecks { wt, checks };
                Some(Command::Exec(cmd))
            }
            PickAction::Restart => {
                if !link.is_actions_run() {
                    self.show_info("Cannot restart: not a GitHub Actions job.");
                    return None;
                }
                if link.repo.is_empty() {
                    self.show_info("Cannot restart: unable to determine repository from link.");
                    return None;
                }
                self.show_loading("Restarting CI job...", Intent::Running(RERUN_LABEL));
                let git = Arc::clone(&self.git);
                Some(Command::task(RERUN_LABEL, move |token| {
                    let scoped = token.with_timeout(Duration::from_secs(RERUN_TIMEOUT_SECS));
                    let error = git
                        .run_command(&scoped, &link.rerun_argv(), &wt.path, &RunOptions::default())
                        .err()
                        .map(|e| e.to_string());
                    Message::CiRerunFinished {
                        branch: wt.branch.clone(),
                        run_url: link.run_url(),
                        error,
                    }
                }))
            }
        }
    }

    pub(super) fn on_ci_rerun_finished(
        &mut self,
        branch: &str,
        run_url: String,
        error: Option<String>,
    ) {
        self.ci_cache.invalidate(branch);
        self.finish_loading(RERUN_LABEL);
        match error {
            Some(e) => self.notify(format!("Failed to restart CI job: {e}")),
            None => self.notify(format!("CI job restarted.\n{run_url}")),
        }
    }

    // Lists fetched on demand

    pub(super) fn on_open_prs_loaded(
        &mut self,
        result: Result<Vec<PullRequest>, String>,
    ) -> Option<Command> {
        if !matches!(self.intent, Intent::AwaitingPrs) {
            return None;
        }
        self.close_screen();
        match result {
            Ok(prs) if prs.is_empty() => self.show_info("No open pull requests found."),
            Ok(prs) => {
                let items = prs
                    .iter()
                    .map(|pr| {
                        let detail = if pr.author.is_empty() {
                            pr.head_branch.clone()
                        } else {
                            format!("@{} · {}", pr.author, pr.head_branch)
                        };
                        SelectItem::new(format!("#{} {}", pr.number, pr.title)).detail(detail)
                    })
                    .collect();
                let list = SelectList::new("Create worktree from PR", items)
                    .placeholder("Filter pull requests...")
                    .empty_text("No pull requests match the filter.");
                self.open_screen(Screen::PrSelect(list), Intent::PickPr(prs));
            }
            Err(e) => self.show_info(format!("Failed to fetch pull requests: {e}")),
        }
        None
    }

    pub(super) fn on_issues_loaded(
        &mut self,
        result: Result<Vec<Issue>, String>,
    ) -> Option<Command> {
        if !matches!(self.intent, Intent::AwaitingIssues) {
            return None;
        }
        self.close_screen();
        match result {
            Ok(issues) if issues.is_empty() => self.show_info("No open issues found."),
            Ok(issues) => {
                let items = issues
                    .iter()
                    .map(|i| {
                        SelectItem::new(format!("#{} {}", i.number, i.title))
                            .detail(format!("@{}", i.author))
                    })
                    .collect();
                let list = SelectList::new("Create worktree from issue", items)
                    .placeholder("Filter issues...")
                    .empty_text("No issues match the filter.");
                self.open_screen(Screen::IssueSelect(list), Intent::PickIssue(issues));
            }
            Err(e) => self.show_info(format!("Failed to fetch issues: {e}")),
        }
        None
    }

    // Commit views

    pub(super) fn on_commit_loaded(&mut self, path: &Path, result: Result<String, String>) {
        let Some(Screen::Commit(screen)) = self.screen.as_mut() else {
            return;
        };
        if screen.path() != path {
            return;
        }
        match result {
            Ok(body) => screen.set_body(&body),
            Err(e) => self.show_info(format!("Failed to load commit: {e}")),
        }
    }

    pub(super) fn on_commit_files_loaded(
        &mut self,
        path: &Path,
        result: Result<Vec<crate::core::parse::CommitFile>, String>,
    ) {
        let Some(Screen::CommitFiles(screen)) = self.screen.as_mut() else {
            return;
        };
        if screen.worktree() != path {
            return;
        }
        match result {
            Ok(files) => screen.set_files(files),
            Err(e) => self.show_info(format!("Failed to list commit files: {e}")),
        }
    }

    /// Shows the HEAD diff of one file in the pager. The file list stays open.
    fn show_file_diff(&mut self, index: usize) -> Option<Command> {
        let Some(Screen::CommitFiles(screen)) = self.screen.as_ref() else {
            return None;
        };
        let file = screen.file(index)?;
        let script = format!(
            "git -c color.ui=always show HEAD -- {} | {}",
            shell_quote(&file.path),
            self.config.general().pager()
        );
        Some(Command::Exec(InteractiveCommand::shell(
            script,
            screen.worktree().to_path_buf(),
        )))
    }
}

/// Branch to delete along with the worktree. Detached checkouts keep nothing.
fn deletable_branch(wt: &WorkingTree) -> Option<&str> {
    (!wt.branch.is_empty() && !wt.branch.starts_with('(')).then_some(wt.branch.as_str())
}

/// Creates the worktree, then runs the init commands inside it in order, stopping at the
/// first failure.
fn create_and_init(
    git: &dyn GitService,
    token: &CancelToken,
    pending: &PendingCreate,
    commands: &[String],
    main: Option<&Path>,
) -> Result<String, String> {
    match &pending.source {
        CreateSource::Branch(branch) => git.create_worktree(token, &pending.path, branch, None),
        CreateSource::Pr(pr) => git.create_worktree_from_pr(token, pr, &pending.path),
    }
    .map_err(|e| format!("Failed to create worktree: {e}"))?;

    let wt = WorkingTree::new(&pending.path, pending.branch(), false);
    let opts = RunOptions {
        silent_on_success: false,
        ..RunOptions::default()
    }
    .with_env(worktree_env(&wt, main));
    for cmd in commands {
        let argv = ["bash", "-lc", cmd.as_str()].map(str::to_string);
        git.run_command(token, &argv, &pending.path, &opts)
            .map_err(|e| format!("Worktree created, but `{cmd}` failed: {e}"))?;
    }
    Ok(format!("Created worktree {}", pending.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_branch_names() {
        let wts = vec![WorkingTree::new("/repo", "main", true)];
        assert!(branch_name_error("", &wts).is_some());
        assert!(branch_name_error("has space", &wts).is_some());
        assert!(branch_name_error("-flag", &wts).is_some());
        assert!(branch_name_error("a..b", &wts).is_some());
        assert!(branch_name_error("topic.lock", &wts).is_some());
        assert_eq!(
            branch_name_error("main", &wts).as_deref(),
            Some("Branch 'main' is already checked out.")
        );
        assert_eq!(branch_name_error("feature/login", &wts), None);
    }

    #[test]
    fn detached_worktrees_keep_their_branch() {
        let detached = WorkingTree::new("/wt/x", "(detached abc1234)", false);
        assert_eq!(deletable_branch(&detached), None);
        let named = WorkingTree::new("/wt/y", "topic", false);
        assert_eq!(deletable_branch(&named), Some("topic"));
    }
}
