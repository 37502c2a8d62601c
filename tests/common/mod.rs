//! Shared fixtures for the integration tests: an in-memory [GitService] and a driver that runs
//! the model's commands synchronously, feeding every task result back into `update`.
#![allow(dead_code)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use lazyworktree::app::{Message, Model, Startup};
use lazyworktree::config::{Config, Theme};
use lazyworktree::core::parse::CommitFile;
use lazyworktree::core::tab::TerminalTabLauncher;
use lazyworktree::core::{
    CancelToken, CiCheck, Command, GitService, InteractiveCommand, Issue, PullRequest,
    RunOptions, WorkingTree,
};
use lazyworktree::error::AppError;

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeGit {
    pub worktrees: Mutex<Vec<WorkingTree>>,
    pub list_error: Mutex<Option<String>>,
    pub prs: HashMap<String, PullRequest>,
    pub open_prs: Vec<PullRequest>,
    pub issues: Vec<Issue>,
    pub checks: Vec<CiCheck>,
    pub github: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn with_worktrees(worktrees: Vec<WorkingTree>) -> Self {
        Self {
            worktrees: Mutex::new(worktrees),
            ..Self::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn fail_listing(&self, error: Option<&str>) {
        *self.list_error.lock().unwrap() = error.map(str::to_string);
    }
}

impl GitService for FakeGit {
    fn run_command(
        &self,
        _token: &CancelToken,
        argv: &[String],
        workdir: &Path,
        _opts: &RunOptions,
    ) -> Result<String, AppError> {
        self.record(format!("run:{}:{}", workdir.display(), argv.join(" ")));
        Ok(String::new())
    }

    fn list_worktrees(&self, _token: &CancelToken) -> Result<Vec<WorkingTree>, AppError> {
        self.record("list".to_string());
        if let Some(e) = self.list_error.lock().unwrap().clone() {
            return Err(AppError::Parse(e));
        }
        Ok(self.worktrees.lock().unwrap().clone())
    }

    fn fetch_pr_map(
        &self,
        _token: &CancelToken,
    ) -> Result<HashMap<String, PullRequest>, AppError> {
        self.record("prs".to_string());
        Ok(self.prs.clone())
    }

    fn fetch_ci_status_for_pr(
        &self,
        _token: &CancelToken,
        pr_number: u64,
        _branch: &str,
    ) -> Result<Vec<CiCheck>, AppError> {
        self.record(format!("ci-pr:{pr_number}"));
        Ok(self.checks.clone())
    }

    fn fetch_ci_status_for_commit(
        &self,
        _token: &CancelToken,
        sha: &str,
        workdir: &Path,
    ) -> Result<Vec<CiCheck>, AppError> {
        self.record(format!("ci-commit:{}:{sha}", workdir.display()));
        Ok(self.checks.clone())
    }

    fn head_commit(&self, _token: &CancelToken, _workdir: &Path) -> String {
        "abc123".to_string()
    }

    fn is_hosted_on_github(&self, _token: &CancelToken) -> bool {
        self.github
    }

    fn list_open_prs(&self, _token: &CancelToken) -> Result<Vec<PullRequest>, AppError> {
        Ok(self.open_prs.clone())
    }

    fn list_open_issues(&self, _token: &CancelToken) -> Result<Vec<Issue>, AppError> {
        Ok(self.issues.clone())
    }

    fn create_worktree(
        &self,
        _token: &CancelToken,
        path: &Path,
        branch: &str,
        _base: Option<&str>,
    ) -> Result<(), AppError> {
        self.record(format!("create:{}:{branch}", path.display()));
        let mut wts = self.worktrees.lock().unwrap();
        wts.push(WorkingTree::new(path, branch, false));
        Ok(())
    }

    fn create_worktree_from_pr(
        &self,
        _token: &CancelToken,
        pr: &PullRequest,
        path: &Path,
    ) -> Result<(), AppError> {
        self.record(format!("create-pr:{}:{}", path.display(), pr.number));
        let mut wts = self.worktrees.lock().unwrap();
        wts.push(WorkingTree::new(path, pr.head_branch.clone(), false));
        Ok(())
    }

    fn remove_worktree(
        &self,
        _token: &CancelToken,
        path: &Path,
        branch: Option<&str>,
    ) -> Result<(), AppError> {
        self.record(format!(
            "remove:{}:{}",
            path.display(),
            branch.unwrap_or_default()
        ));
        self.worktrees.lock().unwrap().retain(|wt| wt.path != path);
        Ok(())
    }

    fn commit_details(&self, _token: &CancelToken, _workdir: &Path) -> Result<String, AppError> {
        Ok("commit abc123\nAuthor: Dev <dev@example.com>\n\n    Initial commit\n".to_string())
    }

    fn commit_files(
        &self,
        _token: &CancelToken,
        _workdir: &Path,
    ) -> Result<Vec<CommitFile>, AppError> {
        Ok(Vec::new())
    }

    fn repo_key(&self, _token: &CancelToken) -> Result<String, AppError> {
        Ok("repo".to_string())
    }

    fn main_worktree_path(&self, _token: &CancelToken) -> Result<PathBuf, AppError> {
        Ok(PathBuf::from("/repo"))
    }
}

/// Launcher that records what it was asked to open.
#[derive(Default)]
pub struct FakeLauncher {
    pub launched: Mutex<Vec<(String, PathBuf)>>,
}

impl TerminalTabLauncher for FakeLauncher {
    fn name(&self) -> &'static str {
        "Fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn launch(
        &self,
        _token: &CancelToken,
        cmd: &str,
        cwd: &Path,
        title: &str,
        _env: &[(String, String)],
    ) -> Result<String, AppError> {
        self.launched
            .lock()
            .unwrap()
            .push((cmd.to_string(), cwd.to_path_buf()));
        Ok(title.to_string())
    }
}

/// The main checkout plus two linked worktrees, in discovery order.
pub fn sample_worktrees() -> Vec<WorkingTree> {
    vec![
        WorkingTree::new("/repo", "main", true),
        WorkingTree::new("/wt/feat-b", "b-worktree", false),
        WorkingTree::new("/wt/feat-a", "a-worktree", false),
    ]
}

pub fn startup() -> Startup {
    Startup {
        main_path: Some(PathBuf::from("/repo")),
        cwd: PathBuf::from("/repo"),
        ..Startup::default()
    }
}

pub fn model_with(
    git: Arc<FakeGit>,
    toml: &str,
    startup: Startup,
) -> Result<Model, Box<dyn std::error::Error>> {
    let config = Config::from_toml_str(toml)?;
    let mut model = Model::new(git, config, Theme::default(), startup);
    model.update(Message::Resize {
        width: 120,
        height: 30,
    });
    Ok(model)
}

/// Builds a model and runs its startup discovery to completion.
pub fn loaded(
    git: Arc<FakeGit>,
    toml: &str,
    startup: Startup,
) -> Result<Model, Box<dyn std::error::Error>> {
    let mut model = model_with(git, toml, startup)?;
    let first = model.init(None);
    drive(&mut model, first);
    Ok(model)
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub labels: Vec<String>,
    pub execs: Vec<InteractiveCommand>,
    pub quit: bool,
}

impl Outcome {
    pub fn ran(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Runs `cmd` and everything it leads to on the calling thread.
pub fn drive(model: &mut Model, cmd: Option<Command>) -> Outcome {
    let mut out = Outcome::default();
    let mut queue: VecDeque<Command> = cmd.into_iter().collect();
    let mut steps = 0;
    while let Some(cmd) = queue.pop_front() {
        steps += 1;
        assert!(steps < 200, "command chain did not settle");
        match cmd {
            Command::Task(task) => {
                out.labels.push(task.label().to_string());
                let token = model.token().clone();
                let msg = task.run(&token);
                queue.extend(model.update(msg));
            }
            Command::Batch(cmds) => {
                for cmd in cmds.into_iter().rev() {
                    queue.push_front(cmd);
                }
            }
            Command::Exec(cmd) => out.execs.push(cmd),
            Command::Quit => out.quit = true,
        }
    }
    out
}

/// Feeds one key to the model and drives the result.
pub fn press(model: &mut Model, code: KeyCode) -> Outcome {
    let cmd = model.update(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    drive(model, cmd)
}

pub fn press_ctrl(model: &mut Model, c: char) -> Outcome {
    let cmd = model.update(Message::Key(KeyEvent::new(
        KeyCode::Char(c),
        KeyModifiers::CONTROL,
    )));
    drive(model, cmd)
}

pub fn type_text(model: &mut Model, text: &str) {
    for c in text.chars() {
        press(model, KeyCode::Char(c));
    }
}
