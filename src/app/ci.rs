//! CI check links and the commands built from them.
//!
//! A GitHub Actions check link looks like
//! `https://github.com/<owner>/<repo>/actions/runs/<run>/job/<job>`. Anything else (external CI
//! systems, empty links) yields empty ids and is opened in the browser instead.

use crate::core::models::{CiCheck, Conclusion};

use url::Url;

/// Deadline for `gh run rerun`.
pub const RERUN_TIMEOUT_SECS: u64 = 30;

pub const CI_LIST_FOOTER: &str = "Enter open • Ctrl+v view logs • Ctrl+r restart";
pub const NO_CHECKS_INFO: &str = "No CI checks available. Press 'p' to fetch PR data first.";

/// Identifiers extracted from a check link. Empty strings mean "not present".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckLink {
    pub run_id: String,
    pub job_id: String,
    pub repo: String,
}

impl CheckLink {
    pub fn parse(link: &str) -> Self {
        let Some(url) = Url::parse(link).ok().filter(|u| {
            u.host_str()
                .is_some_and(|host| host.contains("github.com"))
        }) else {
            return Self::default();
        };

        let parts: Vec<&str> = url.path().trim_start_matches('/').split('/').collect();
        let after = |name: &str| {
            parts
                .iter()
                .position(|p| *p == name)
                .and_then(|i| parts.get(i + 1))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        let repo = match parts.as_slice() {
            [owner, repo, ..] if !owner.is_empty() && !repo.is_empty() => {
                format!("{owner}/{repo}")
            }
            _ => String::new(),
        };

        Self {
            run_id: after("runs"),
            job_id: after("job"),
            repo,
        }
    }

    #[inline]
    pub fn is_actions_run(&self) -> bool {
        !self.run_id.is_empty()
    }

    pub fn run_url(&self) -> String {
        format!("https://github.com/{}/actions/runs/{}", self.repo, self.run_id)
    }

    /// `gh run rerun` arguments, restarting a single job when the link names one.
    pub fn rerun_argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = ["gh", "run", "rerun", self.run_id.as_str()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if !self.job_id.is_empty() {
            argv.push("--job".into());
            argv.push(self.job_id.clone());
        }
        argv.push("-R".into());
        argv.push(self.repo.clone());
        argv
    }
}

/// Shell pipeline showing a run's log in the pager. Failed checks show only failed steps.
/// A configured `ci_script_pager` is used as-is; the regular pager gets `pipefail` so that a
/// failing `gh` is reported.
pub fn log_view_script(
    check: &CiCheck,
    run_id: &str,
    pager: &str,
    ci_pager: Option<&str>,
) -> String {
    let flag = if check.conclusion == Conclusion::Failure {
        "--log-failed"
    } else {
        "--log"
    };
    match ci_pager {
        Some(interactive) => format!("gh run view {run_id} {flag} 2>&1 | {interactive}"),
        None => format!("set -o pipefail; gh run view {run_id} {flag} 2>&1 | {pager}"),
    }
}

/// Platform command that opens a URL in the default browser.
pub fn browser_argv(url: &str) -> Vec<String> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    vec![opener.to_string(), url.to_string()]
}
