//! Command-line argument parsing and help for lazyworktree.
//!
//! When invoked with no args the TUI starts in the current repository. Any positional words
//! are joined into the initial filter.

use crate::config::Config;
use crate::config::load::parse_override;
use crate::error::AppError;
use crate::utils::expand_home_path;

use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub worktree_dir: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    pub output_selection: Option<PathBuf>,
    pub theme: Option<String>,
    pub search_auto_select: bool,
    pub config_file: Option<PathBuf>,
    pub overrides: Vec<(String, String)>,
    pub initial_filter: String,
}

impl CliOptions {
    /// Every setting for [Config::load]: dedicated flags first, then the `-C` pairs, so an
    /// explicit `-C lw.key=value` beats the matching flag.
    pub fn config_overrides(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: toml::Value| {
            pairs.push((key.to_string(), value.to_string()));
        };
        if let Some(dir) = &self.worktree_dir {
            push("worktree_dir", toml::Value::String(dir.display().to_string()));
        }
        if let Some(theme) = &self.theme {
            push("theme", toml::Value::String(theme.clone()));
        }
        if self.search_auto_select {
            push("search_auto_select", toml::Value::Boolean(true));
        }
        if let Some(path) = &self.debug_log {
            push("debug_log", toml::Value::String(path.display().to_string()));
        }
        pairs.extend(self.overrides.iter().cloned());
        pairs
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    RunApp(CliOptions),
    Exit,
}

pub fn handle_args() -> Result<CliAction, AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args(&args)
}

/// Parses arguments (without the program name). Help and version print and yield `Exit`.
pub fn parse_args(args: &[String]) -> Result<CliAction, AppError> {
    let mut opts = CliOptions::default();
    let mut words: Vec<&str> = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f, Some(v.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String, AppError> {
            inline
                .clone()
                .or_else(|| iter.next().cloned())
                .ok_or_else(|| AppError::Config(format!("{name} requires a value")))
        };

        match flag {
            "-h" | "--help" => {
                print_help();
                return Ok(CliAction::Exit);
            }
            "-v" | "--version" => {
                print_version();
                return Ok(CliAction::Exit);
            }
            "-w" | "--worktree-dir" => {
                opts.worktree_dir = Some(expand_home_path(&value(flag)?));
            }
            "--debug-log" => opts.debug_log = Some(expand_home_path(&value(flag)?)),
            "--output-selection" => {
                opts.output_selection = Some(expand_home_path(&value(flag)?));
            }
            "-t" | "--theme" => opts.theme = Some(value(flag)?),
            "--search-auto-select" => opts.search_auto_select = true,
            "--config-file" => opts.config_file = Some(expand_home_path(&value(flag)?)),
            "-C" | "--config" => opts.overrides.push(parse_override(&value(flag)?)?),
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(AppError::Config(format!(
                    "unknown argument: {s} (try --help)"
                )));
            }
            word => words.push(word),
        }
    }

    opts.initial_filter = words.join(" ");
    Ok(CliAction::RunApp(opts))
}

fn print_version() {
    println!("lazyworktree {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"lazyworktree - A terminal UI for managing git worktrees

USAGE:
  lazyworktree [OPTIONS] [FILTER...]

FILTER:
  Words used as the initial filter of the worktree list

OPTIONS:
  -w, --worktree-dir <DIR>      Root directory for new worktrees
  -t, --theme <NAME>            Color theme (dracula, nord, clean-light)
      --search-auto-select      Enter in the filter selects the highlighted worktree
      --output-selection <FILE> Write the selected worktree path to FILE
      --debug-log <FILE>        Append debug logs to FILE
      --config-file <FILE>      Read configuration from FILE
  -C, --config lw.KEY=VALUE     Override a configuration key (repeatable)
  -h, --help                    Print help information
  -v, --version                 Display the installed version

ENVIRONMENT:
  LAZYWORKTREE_CONFIG           Override the default config path ({})
"#,
        Config::default_path().display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_and_filter_words() -> Result<(), Box<dyn std::error::Error>> {
        let action = parse_args(&args(&[
            "-w",
            "/tmp/wt",
            "--theme=nord",
            "--search-auto-select",
            "-C",
            "lw.sort_mode=path",
            "--output-selection",
            "/tmp/out",
            "feat",
            "login",
        ]))?;
        let CliAction::RunApp(opts) = action else {
            return Err("expected RunApp".into());
        };
        assert_eq!(opts.worktree_dir, Some(PathBuf::from("/tmp/wt")));
        assert_eq!(opts.theme.as_deref(), Some("nord"));
        assert!(opts.search_auto_select);
        assert_eq!(
            opts.overrides,
            vec![("sort_mode".to_string(), "path".to_string())]
        );
        assert_eq!(opts.output_selection, Some(PathBuf::from("/tmp/out")));
        assert_eq!(opts.initial_filter, "feat login");
        Ok(())
    }

    #[test]
    fn config_overrides_win_over_flags() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = \"dracula\"\n")?;

        let CliAction::RunApp(opts) = parse_args(&args(&[
            "-t",
            "nord",
            "-C",
            "lw.theme=clean-light",
            "-w",
            "/tmp/my wt",
            "--search-auto-select",
        ]))?
        else {
            return Err("expected RunApp".into());
        };
        let config = Config::load(Some(&path), &opts.config_overrides())?;
        let g = config.general();
        assert_eq!(g.theme(), "clean-light");
        assert_eq!(g.worktree_dir(), &PathBuf::from("/tmp/my wt"));
        assert!(g.search_auto_select());

        let CliAction::RunApp(opts) = parse_args(&args(&["-t", "nord"]))? else {
            return Err("expected RunApp".into());
        };
        let config = Config::load(Some(&path), &opts.config_overrides())?;
        assert_eq!(config.general().theme(), "nord");
        Ok(())
    }

    #[test]
    fn missing_values_and_unknown_flags() {
        assert!(parse_args(&args(&["--theme"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["-C", "sort_mode=path"])).is_err());
    }

    #[test]
    fn no_args_runs() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            parse_args(&[])?,
            CliAction::RunApp(CliOptions::default())
        );
        Ok(())
    }
}
