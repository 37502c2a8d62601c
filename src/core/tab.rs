//! Launching commands in a new tab of the hosting terminal emulator.
//!
//! Only Kitty is supported: detected through `KITTY_WINDOW_ID` and driven over its remote
//! control protocol (`kitty @ launch`).

use crate::core::cancel::CancelToken;
use crate::core::proc::{RunOptions, run_command};
use crate::error::AppError;

use std::path::Path;

pub trait TerminalTabLauncher: Send + Sync {
    /// Display name of the terminal.
    fn name(&self) -> &'static str;
    /// Whether we are running inside this terminal.
    fn is_available(&self) -> bool;
    /// Opens a new tab running `cmd` in `cwd`. Returns the tab title.
    fn launch(
        &self,
        token: &CancelToken,
        cmd: &str,
        cwd: &Path,
        title: &str,
        env: &[(String, String)],
    ) -> Result<String, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KittyLauncher;

impl KittyLauncher {
    pub fn launch_args(
        cmd: &str,
        cwd: &Path,
        title: &str,
        env: &[(String, String)],
    ) -> Vec<String> {
        let mut args = vec![
            "kitty".to_string(),
            "@".to_string(),
            "launch".to_string(),
            "--type=tab".to_string(),
            format!("--cwd={}", cwd.display()),
            format!("--tab-title={title}"),
        ];
        args.extend(env.iter().map(|(k, v)| format!("--env={k}={v}")));
        args.extend(["--", "bash", "-lc", cmd].map(str::to_string));
        args
    }
}

impl TerminalTabLauncher for KittyLauncher {
    fn name(&self) -> &'static str {
        "Kitty"
    }

    fn is_available(&self) -> bool {
        std::env::var_os("KITTY_WINDOW_ID").is_some_and(|v| !v.is_empty())
    }

    fn launch(
        &self,
        token: &CancelToken,
        cmd: &str,
        cwd: &Path,
        title: &str,
        env: &[(String, String)],
    ) -> Result<String, AppError> {
        let argv = Self::launch_args(cmd, cwd, title, env);
        run_command(token, &argv, cwd, &RunOptions::default())?;
        Ok(title.to_string())
    }
}

/// First launcher that reports itself available.
pub fn detect_launcher() -> Option<Box<dyn TerminalTabLauncher>> {
    let launchers: Vec<Box<dyn TerminalTabLauncher>> = vec![Box::new(KittyLauncher)];
    launchers.into_iter().find(|l| l.is_available())
}

pub fn launched_message(terminal: &str, title: &str) -> String {
    format!("Command launched in new {terminal} tab: {title}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kitty_arguments() {
        let env = vec![("WORKTREE_BRANCH".to_string(), "feat".to_string())];
        let args = KittyLauncher::launch_args("make test", Path::new("/wt/feat"), "tests", &env);
        assert_eq!(
            args,
            vec![
                "kitty",
                "@",
                "launch",
                "--type=tab",
                "--cwd=/wt/feat",
                "--tab-title=tests",
                "--env=WORKTREE_BRANCH=feat",
                "--",
                "bash",
                "-lc",
                "make test",
            ]
        );
    }

    #[test]
    fn info_text() {
        assert_eq!(
            launched_message("Kitty", "tests"),
            "Command launched in new Kitty tab: tests"
        );
    }
}
