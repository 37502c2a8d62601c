//! main.rs
//! Entry point for lazyworktree

use lazyworktree::app::{Model, Startup};
use lazyworktree::config::{Config, Theme};
use lazyworktree::core::cache::{
    load_snapshot, read_last_selected, write_last_selected, write_output_selection,
};
use lazyworktree::core::hooks::{RepoHooks, TrustStore};
use lazyworktree::core::tab::detect_launcher;
use lazyworktree::core::{CancelToken, GitCli, GitService, Workers, terminal};
use lazyworktree::error::AppError;
use lazyworktree::utils::cli::{CliAction, CliOptions, handle_args};
use lazyworktree::utils::log::init_file_logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[lazyworktree] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let opts = match handle_args() {
        Ok(CliAction::RunApp(opts)) => opts,
        Ok(CliAction::Exit) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[lazyworktree] {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[lazyworktree] Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: CliOptions) -> Result<(), AppError> {
    let config = Config::load(opts.config_file.as_deref(), &opts.config_overrides())?;

    let theme_name = config.general().theme().to_string();
    let theme = Theme::by_name(&theme_name)
        .ok_or_else(|| AppError::Config(format!("unknown theme: {theme_name}")))?;

    if let Some(path) = config.general().debug_log() {
        init_file_logging(path)?;
    }
    tracing::debug!(config = ?config.source(), "configuration loaded");

    let cwd = std::env::current_dir()?;
    let git = Arc::new(GitCli::new(&cwd));
    let startup = resolve_startup(git.as_ref(), &config, cwd, opts.initial_filter.clone());
    let worktree_root = startup.worktree_root.clone();
    let snapshot = worktree_root.as_deref().and_then(load_snapshot);

    let workers = Workers::with_default_size();
    let mut model = Model::new(git, config, theme, startup);
    let first = model.init(snapshot);
    terminal::run_terminal(&mut model, &workers, first)?;

    let selected = model.selected_path();
    if let Some(root) = &worktree_root
        && let Some(selected) = selected
        && let Err(e) = write_last_selected(root, selected)
    {
        tracing::warn!(error = %e, "failed to write last-selected marker");
    }
    match (&opts.output_selection, selected) {
        (Some(target), selected) => write_output_selection(target, selected)?,
        (None, Some(selected)) => println!("{}", selected.display()),
        (None, None) => {}
    }
    Ok(())
}

/// Everything the first frame needs that comes from the repository. Outside a repository all
/// of it is empty and the model shows the welcome screen once discovery fails.
fn resolve_startup(
    git: &dyn GitService,
    config: &Config,
    cwd: PathBuf,
    initial_filter: String,
) -> Startup {
    let token = CancelToken::new();
    let main_path = git.main_worktree_path(&token).ok();
    let worktree_root = main_path
        .as_ref()
        .and_then(|_| git.repo_key(&token).ok())
        .map(|key| config.general().worktree_dir().join(key));

    let hooks = main_path.as_deref().and_then(|main| match RepoHooks::load(main) {
        Ok(hooks) => hooks,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable .wt file");
            None
        }
    });

    Startup {
        last_selected: worktree_root.as_deref().and_then(read_last_selected),
        worktree_root,
        main_path,
        cwd,
        initial_filter,
        hooks,
        trust: TrustStore::default_path().map(TrustStore::load),
        launcher: detect_launcher().map(Arc::from),
    }
}
