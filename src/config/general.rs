//! The general configuration settings for lazyworktree.
//!
//! [General] is deserialized straight from `config.toml`; [InternalGeneral] is what the rest of
//! the application reads, with paths expanded and enums parsed.

use crate::core::hooks::TrustMode;
use crate::utils::expand_home_path;

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_REFRESH_INTERVAL: u64 = 10;
pub const DEFAULT_ISSUE_TEMPLATE: &str = "issue-{number}-{title}";
pub const DEFAULT_PR_TEMPLATE: &str = "pr-{number}-{title}";

/// Order of the worktree list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Most recently selected first.
    #[default]
    Switched,
    /// Most recent commit first.
    Active,
    /// Path, ascending.
    Path,
}

impl SortMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "switched" => Some(SortMode::Switched),
            "active" => Some(SortMode::Active),
            "path" => Some(SortMode::Path),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Switched => "switched",
            SortMode::Active => "active",
            SortMode::Path => "path",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Switched => SortMode::Active,
            SortMode::Active => SortMode::Path,
            SortMode::Path => SortMode::Switched,
        }
    }
}

/// A user command bound to a key in `[[custom_commands]]`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CustomCommand {
    pub key: String,
    pub command: String,
    pub description: String,
    pub new_tab: bool,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub(crate) struct General {
    pub(crate) worktree_dir: Option<String>,
    pub(crate) theme: Option<String>,
    pub(crate) sort_mode: String,
    pub(crate) auto_fetch_prs: bool,
    pub(crate) auto_refresh: bool,
    pub(crate) refresh_interval: u64,
    pub(crate) search_auto_select: bool,
    pub(crate) fuzzy_finder_input: bool,
    pub(crate) pager: Option<String>,
    pub(crate) ci_script_pager: Option<String>,
    pub(crate) trust_mode: String,
    pub(crate) debug_log: Option<String>,
    pub(crate) init_commands: Vec<String>,
    pub(crate) issue_branch_name_template: String,
    pub(crate) pr_branch_name_template: String,
    pub(crate) custom_commands: Vec<CustomCommand>,
}

impl Default for General {
    fn default() -> Self {
        General {
            worktree_dir: None,
            theme: None,
            sort_mode: "switched".to_string(),
            auto_fetch_prs: false,
            auto_refresh: true,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            search_auto_select: false,
            fuzzy_finder_input: false,
            pager: None,
            ci_script_pager: None,
            trust_mode: "tofu".to_string(),
            debug_log: None,
            init_commands: Vec::new(),
            issue_branch_name_template: DEFAULT_ISSUE_TEMPLATE.to_string(),
            pr_branch_name_template: DEFAULT_PR_TEMPLATE.to_string(),
            custom_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InternalGeneral {
    worktree_dir: PathBuf,
    theme: String,
    sort_mode: SortMode,
    auto_fetch_prs: bool,
    auto_refresh: bool,
    refresh_interval: u64,
    search_auto_select: bool,
    fuzzy_finder_input: bool,
    pager: String,
    ci_script_pager: Option<String>,
    trust_mode: TrustMode,
    debug_log: Option<PathBuf>,
    init_commands: Vec<String>,
    issue_branch_name_template: String,
    pr_branch_name_template: String,
    custom_commands: Vec<CustomCommand>,
}

impl From<General> for InternalGeneral {
    fn from(g: General) -> Self {
        let sort_mode = SortMode::parse(&g.sort_mode).unwrap_or_else(|| {
            tracing::warn!(value = %g.sort_mode, "unknown sort_mode, using switched");
            SortMode::default()
        });
        let trust_mode = TrustMode::parse(&g.trust_mode).unwrap_or_else(|| {
            tracing::warn!(value = %g.trust_mode, "unknown trust_mode, using tofu");
            TrustMode::default()
        });
        let pager = g
            .pager
            .filter(|p| !p.trim().is_empty())
            .or_else(|| std::env::var("PAGER").ok().filter(|p| !p.trim().is_empty()))
            .unwrap_or_else(|| "less -R".to_string());

        Self {
            worktree_dir: g
                .worktree_dir
                .map(|d| expand_home_path(&d))
                .unwrap_or_else(default_worktree_dir),
            theme: g.theme.unwrap_or_default(),
            sort_mode,
            auto_fetch_prs: g.auto_fetch_prs,
            auto_refresh: g.auto_refresh,
            refresh_interval: g.refresh_interval.max(1),
            search_auto_select: g.search_auto_select,
            fuzzy_finder_input: g.fuzzy_finder_input,
            pager,
            ci_script_pager: g.ci_script_pager.filter(|p| !p.trim().is_empty()),
            trust_mode,
            debug_log: g.debug_log.map(|p| expand_home_path(&p)),
            init_commands: g.init_commands,
            issue_branch_name_template: g.issue_branch_name_template,
            pr_branch_name_template: g.pr_branch_name_template,
            custom_commands: g
                .custom_commands
                .into_iter()
                .filter(|c| !c.key.is_empty() && !c.command.is_empty())
                .collect(),
        }
    }
}

/// `~/.local/share/worktrees`
fn default_worktree_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".local").join("share").join("worktrees"))
        .unwrap_or_else(|| PathBuf::from(".worktrees"))
}

impl InternalGeneral {
    #[inline]
    pub fn worktree_dir(&self) -> &PathBuf {
        &self.worktree_dir
    }

    #[inline]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    #[inline]
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    #[inline]
    pub fn auto_fetch_prs(&self) -> bool {
        self.auto_fetch_prs
    }

    #[inline]
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    #[inline]
    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval
    }

    #[inline]
    pub fn search_auto_select(&self) -> bool {
        self.search_auto_select
    }

    #[inline]
    pub fn fuzzy_finder_input(&self) -> bool {
        self.fuzzy_finder_input
    }

    #[inline]
    pub fn pager(&self) -> &str {
        &self.pager
    }

    #[inline]
    pub fn ci_script_pager(&self) -> Option<&str> {
        self.ci_script_pager.as_deref()
    }

    #[inline]
    pub fn trust_mode(&self) -> TrustMode {
        self.trust_mode
    }

    #[inline]
    pub fn debug_log(&self) -> Option<&PathBuf> {
        self.debug_log.as_ref()
    }

    #[inline]
    pub fn init_commands(&self) -> &[String] {
        &self.init_commands
    }

    #[inline]
    pub fn issue_branch_name_template(&self) -> &str {
        &self.issue_branch_name_template
    }

    #[inline]
    pub fn pr_branch_name_template(&self) -> &str {
        &self.pr_branch_name_template
    }

    #[inline]
    pub fn custom_commands(&self) -> &[CustomCommand] {
        &self.custom_commands
    }
}

impl Default for InternalGeneral {
    fn default() -> Self {
        InternalGeneral::from(General::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_modes_cycle() {
        assert_eq!(SortMode::parse("Active"), Some(SortMode::Active));
        assert_eq!(SortMode::parse("bogus"), None);
        assert_eq!(SortMode::Path.next(), SortMode::Switched);
    }

    #[test]
    fn invalid_enums_fall_back() {
        let raw = General {
            sort_mode: "sideways".into(),
            trust_mode: "sometimes".into(),
            refresh_interval: 0,
            ..General::default()
        };
        let g = InternalGeneral::from(raw);
        assert_eq!(g.sort_mode(), SortMode::Switched);
        assert_eq!(g.trust_mode(), TrustMode::Tofu);
        assert_eq!(g.refresh_interval(), 1);
    }

    #[test]
    fn incomplete_custom_commands_are_dropped() {
        let raw = General {
            custom_commands: vec![
                CustomCommand {
                    key: "t".into(),
                    command: "make test".into(),
                    ..CustomCommand::default()
                },
                CustomCommand {
                    key: "x".into(),
                    ..CustomCommand::default()
                },
            ],
            ..General::default()
        };
        assert_eq!(InternalGeneral::from(raw).custom_commands().len(), 1);
    }
}
