//! Process execution for lazyworktree.
//!
//! Two entry points:
//! - [run_command] runs a captured, non-interactive process (git, gh, kitty) from a worker
//!   thread. It honors the [CancelToken] and its deadline and kills the child once either trips.
//! - [run_interactive] runs a process that owns the terminal (pagers, custom shell commands).
//!   The event loop suspends the TUI around it.
//!
//! Both treat exit code 141 as success: it is what a pipeline reports when the reader
//! (usually a pager) is closed before the writer finished.

use crate::core::cancel::CancelToken;
use crate::error::AppError;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Exit status of a pipeline whose reader went away (SIGPIPE).
pub const EXIT_BROKEN_PIPE: i32 = 141;

/// How often a waiting worker checks the child and the cancellation scope.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

/// How long output is still collected after the child exited. A descendant that inherited the
/// pipes (a browser started by `xdg-open`) may keep them open for its whole life.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Knobs of a single captured run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Exit codes besides 0 and 141 that count as success.
    pub ok_codes: Vec<i32>,
    /// Do not log a notice with the output when the command succeeds.
    pub silent_on_success: bool,
    /// Log a warning when the command fails.
    pub notify_on_failure: bool,
    pub env: Vec<(String, String)>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ok_codes: vec![0],
            silent_on_success: true,
            notify_on_failure: true,
            env: Vec::new(),
        }
    }
}

impl RunOptions {
    pub fn quiet() -> Self {
        Self {
            notify_on_failure: false,
            ..Self::default()
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn accepts(&self, code: i32) -> bool {
        code == 0 || code == EXIT_BROKEN_PIPE || self.ok_codes.contains(&code)
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

/// A process that takes over the terminal while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveCommand {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl InteractiveCommand {
    /// Wraps a shell snippet as `bash -c <script>`.
    pub fn shell(script: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: "bash".to_string(),
            args: vec!["-c".to_string(), script.into()],
            workdir: workdir.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// The shell script when built through [InteractiveCommand::shell].
    pub fn script(&self) -> Option<&str> {
        match self.args.as_slice() {
            [flag, script] if flag == "-c" => Some(script.as_str()),
            _ => None,
        }
    }
}

/// Runs `argv` in `workdir`, capturing stdout and stderr.
///
/// The process environment is inherited and extended with `opts.env`.
/// Exit codes accepted by [RunOptions::accepts] yield `Ok`; anything else is
/// [AppError::CommandFailed]. Cancellation and deadline expiry kill the child.
pub fn run_command(
    token: &CancelToken,
    argv: &[String],
    workdir: &Path,
    opts: &RunOptions,
) -> Result<CommandOutput, AppError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(AppError::Parse("empty command line".to_string()));
    };
    if token.is_cancelled() {
        return Err(AppError::Cancelled);
    }

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(workdir)
        .envs(opts.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| AppError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if token.is_cancelled() {
            kill(&mut child);
            return Err(AppError::Cancelled);
        }
        if token.is_expired() {
            kill(&mut child);
            return Err(AppError::Timeout {
                program: program.clone(),
                after: started.elapsed(),
            });
        }
        thread::sleep(poll_interval(token));
    };

    let until = Instant::now() + DRAIN_GRACE;
    let output = CommandOutput {
        stdout: collect_drain(&stdout, token, until, program, started)?,
        stderr: collect_drain(&stderr, token, until, program, started)?,
        code: status.code().unwrap_or(-1),
    };

    if opts.accepts(output.code) {
        Ok(output)
    } else {
        Err(AppError::CommandFailed {
            program: program.clone(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Runs a terminal-owning process to completion with inherited stdio.
pub fn run_interactive(cmd: &InteractiveCommand) -> Result<(), AppError> {
    let status = Command::new(&cmd.program)
        .args(&cmd.args)
        .current_dir(&cmd.workdir)
        .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .status()
        .map_err(|source| AppError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;

    match status.code() {
        Some(0) | Some(EXIT_BROKEN_PIPE) => Ok(()),
        code => Err(AppError::CommandFailed {
            program: cmd.program.clone(),
            code: code.unwrap_or(-1),
            stderr: String::new(),
        }),
    }
}

fn poll_interval(token: &CancelToken) -> Duration {
    token
        .remaining()
        .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL))
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = bounded(1);
    if let Some(mut reader) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
    }
    rx
}

/// Waits for a drained stream until `until`, honoring the token. A stream still open at
/// `until` is abandoned and reads as empty; its reader thread ends with the last descendant.
fn collect_drain(
    rx: &Receiver<String>,
    token: &CancelToken,
    until: Instant,
    program: &str,
    started: Instant,
) -> Result<String, AppError> {
    loop {
        let wait = poll_interval(token).min(until.saturating_duration_since(Instant::now()));
        match rx.recv_timeout(wait) {
            Ok(text) => return Ok(text),
            Err(RecvTimeoutError::Disconnected) => return Ok(String::new()),
            Err(RecvTimeoutError::Timeout) => {}
        }
        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        if token.is_expired() {
            return Err(AppError::Timeout {
                program: program.to_string(),
                after: started.elapsed(),
            });
        }
        if Instant::now() >= until {
            tracing::debug!(program, "output pipe still held open after exit");
            return Ok(String::new());
        }
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill()
        && e.kind() != io::ErrorKind::InvalidInput
    {
        tracing::warn!(error = %e, "failed to kill child process");
    }
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn captures_stdout_in_workdir() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("marker.txt"), "x")?;
        let out = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "ls"]),
            dir.path(),
            &RunOptions::default(),
        )?;
        assert!(out.stdout.contains("marker.txt"));
        Ok(())
    }

    #[test]
    fn passes_extra_environment() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let opts = RunOptions::default()
            .with_env(vec![("WORKTREE_BRANCH".to_string(), "feat-x".to_string())]);
        let out = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "printf %s \"$WORKTREE_BRANCH\""]),
            dir.path(),
            &opts,
        )?;
        assert_eq!(out.stdout, "feat-x");
        Ok(())
    }

    #[test]
    fn broken_pipe_exit_is_success() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let out = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "exit 141"]),
            dir.path(),
            &RunOptions::default(),
        )?;
        assert_eq!(out.code, EXIT_BROKEN_PIPE);
        Ok(())
    }

    #[test]
    fn interactive_broken_pipe_exit_is_success() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        run_interactive(&InteractiveCommand::shell("exit 141", dir.path()))?;
        let err = run_interactive(&InteractiveCommand::shell("exit 2", dir.path()))
            .err()
            .ok_or("expected failure")?;
        assert!(matches!(err, AppError::CommandFailed { code: 2, .. }));
        Ok(())
    }

    #[test]
    fn descendant_holding_pipes_does_not_block() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let started = Instant::now();
        let out = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "echo launched; sleep 3 & exit 0"]),
            dir.path(),
            &RunOptions::quiet(),
        )?;
        assert_eq!(out.code, 0);
        assert!(started.elapsed() < Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn deadline_covers_output_collection() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let token = CancelToken::new().with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let err = run_command(
            &token,
            &argv(&["sh", "-c", "sleep 3 & exit 0"]),
            dir.path(),
            &RunOptions::default(),
        )
        .err()
        .ok_or("expected timeout")?;
        assert!(matches!(err, AppError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn unexpected_exit_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let err = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "echo boom >&2; exit 3"]),
            dir.path(),
            &RunOptions::default(),
        )
        .err()
        .ok_or("expected failure")?;
        match err {
            AppError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom");
            }
            other => return Err(format!("unexpected error: {other}").into()),
        }
        Ok(())
    }

    #[test]
    fn extra_ok_codes_are_accepted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let opts = RunOptions {
            ok_codes: vec![0, 1],
            ..RunOptions::default()
        };
        let out = run_command(
            &CancelToken::new(),
            &argv(&["sh", "-c", "exit 1"]),
            dir.path(),
            &opts,
        )?;
        assert_eq!(out.code, 1);
        Ok(())
    }

    #[test]
    fn deadline_kills_slow_child() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let token = CancelToken::new().with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let err = run_command(
            &token,
            &argv(&["sleep", "5"]),
            dir.path(),
            &RunOptions::default(),
        )
        .err()
        .ok_or("expected timeout")?;
        assert!(matches!(err, AppError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
        Ok(())
    }

    #[test]
    fn cancelled_scope_refuses_to_spawn() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let token = CancelToken::new();
        token.cancel();
        let err = run_command(&token, &argv(&["true"]), dir.path(), &RunOptions::default())
            .err()
            .ok_or("expected cancellation")?;
        assert!(err.is_cancelled());
        Ok(())
    }

    #[test]
    fn shell_command_exposes_script() {
        let cmd = InteractiveCommand::shell("git log | less", "/tmp");
        assert_eq!(cmd.program, "bash");
        assert_eq!(cmd.script(), Some("git log | less"));
    }
}
