//! The main config loading module for lazyworktree.
//!
//! Handles loading and deserializing settings from `config.toml`, then layering the
//! `-C lw.key=value` command line overrides on top.
//!
//! Provides the main [Config] struct, as well as the internal [RawConfig] used for parsing.

use crate::config::general::{General, InternalGeneral};
use crate::error::AppError;
use crate::utils::get_home;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted both in the file and as `-C lw.<key>=<value>` overrides.
pub const KNOWN_KEYS: &[&str] = &[
    "worktree_dir",
    "theme",
    "sort_mode",
    "auto_fetch_prs",
    "auto_refresh",
    "refresh_interval",
    "search_auto_select",
    "fuzzy_finder_input",
    "pager",
    "ci_script_pager",
    "trust_mode",
    "debug_log",
    "init_commands",
    "issue_branch_name_template",
    "pr_branch_name_template",
];

/// Raw configuration as read from the toml file.
/// Converted into the main [Config] struct once overrides are applied.
#[derive(Deserialize, Debug, Default)]
#[serde(transparent)]
pub(crate) struct RawConfig {
    general: General,
}

/// Main configuration struct for lazyworktree.
#[derive(Debug, Clone, Default)]
pub struct Config {
    general: InternalGeneral,
    source: Option<PathBuf>,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            general: InternalGeneral::from(raw.general),
            source: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// With `explicit` set the file must be readable. Otherwise the default path is used and a
    /// missing file means defaults. A file that fails to parse prints a warning and falls back
    /// to defaults. Overrides are applied on top in order, so a later pair wins over an earlier
    /// one for the same key; an unknown override key is an error.
    pub fn load(explicit: Option<&Path>, overrides: &[(String, String)]) -> Result<Self, AppError> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut table = toml::Table::new();
        match fs::read_to_string(&path) {
            Ok(content) => match content.parse::<toml::Table>().and_then(|t| {
                toml::Value::Table(t.clone())
                    .try_into::<RawConfig>()
                    .map(|_| t)
            }) {
                Ok(t) => table = t,
                Err(e) => {
                    eprintln!(
                        "Error parsing config {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                }
            },
            Err(e) if explicit.is_some() => {
                return Err(AppError::Config(format!(
                    "cannot read config file {}: {e}",
                    path.display()
                )));
            }
            Err(_) => {}
        }

        for (key, value) in overrides {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                return Err(AppError::Config(format!("unknown config key: {key}")));
            }
            table.insert(key.clone(), parse_override_value(value));
        }

        let raw: RawConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut config = Config::from(raw);
        config.source = path.exists().then_some(path);
        Ok(config)
    }

    /// Parses configuration from a toml string without touching the filesystem.
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Config::from(raw))
    }

    #[inline]
    pub fn general(&self) -> &InternalGeneral {
        &self.general
    }

    /// The file the configuration was read from, if any.
    #[inline]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Determine the default configuration file path.
    /// Checks the LAZYWORKTREE_CONFIG environment variable first,
    /// then XDG_CONFIG_HOME,
    /// then defaults to ~/.config/lazyworktree/config.toml.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("LAZYWORKTREE_CONFIG")
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return PathBuf::from(xdg_config).join("lazyworktree/config.toml");
        }

        if let Some(home) = get_home() {
            return home.join(".config/lazyworktree/config.toml");
        }
        PathBuf::from("config.toml")
    }
}

/// Interprets an override value as a toml literal when it is one (`true`, `30`, `["a"]`),
/// otherwise as a plain string.
fn parse_override_value(value: &str) -> toml::Value {
    format!("v = {value}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

/// Splits `lw.key=value` into its parts.
pub fn parse_override(arg: &str) -> Result<(String, String), AppError> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| AppError::Config(format!("expected lw.key=value, got {arg}")))?;
    let key = key
        .trim()
        .strip_prefix("lw.")
        .ok_or_else(|| AppError::Config(format!("override must start with lw.: {arg}")))?;
    Ok((key.to_string(), value.to_string()))
}
