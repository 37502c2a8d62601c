//! Caches: the persisted worktree snapshot, the last-selected marker, and the in-memory CI
//! check cache.
//!
//! The snapshot is advisory. Failing to read it never blocks startup; it is simply replaced by
//! the first successful refresh. The CI cache lives inside the model and is only touched from
//! `update`, so it needs no locking.

use crate::core::models::{CACHE_FILENAME, CiCheck, LAST_SELECTED_FILENAME, WorkingTree};
use crate::error::AppError;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Age after which a CI entry may be fetched again.
pub const CI_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    worktrees: Vec<WorkingTree>,
}

pub fn snapshot_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILENAME)
}

/// Reads the snapshot under `root`. Missing or unreadable files yield `None`.
pub fn load_snapshot(root: &Path) -> Option<Vec<WorkingTree>> {
    let path = snapshot_path(root);
    let data = fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<SnapshotFile>(&data) {
        Ok(file) => Some(file.worktrees),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable snapshot");
            None
        }
    }
}

/// Rewrites the snapshot atomically (write to a sibling, then rename).
pub fn save_snapshot(root: &Path, worktrees: &[WorkingTree]) -> Result<(), AppError> {
    fs::create_dir_all(root)?;
    let path = snapshot_path(root);
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(&SnapshotFile {
        worktrees: worktrees.to_vec(),
    })?;
    fs::write(&tmp, body)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

pub fn read_last_selected(root: &Path) -> Option<PathBuf> {
    let data = fs::read_to_string(root.join(LAST_SELECTED_FILENAME)).ok()?;
    let trimmed = data.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

pub fn write_last_selected(root: &Path, selected: &Path) -> Result<(), AppError> {
    fs::create_dir_all(root)?;
    fs::write(
        root.join(LAST_SELECTED_FILENAME),
        format!("{}\n", selected.display()),
    )?;
    Ok(())
}

/// Rewrites `target` with the chosen path plus a newline, readable only by the owner. With no
/// selection the file is left empty so a shell wrapper never reads a previous run's path.
pub fn write_output_selection(target: &Path, selected: Option<&Path>) -> Result<(), AppError> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(target)?;
    if let Some(selected) = selected {
        writeln!(file, "{}", selected.display())?;
    }
    Ok(())
}

/// State of one branch in the [CiCache].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiEntry {
    /// A fetch is in flight. `previous` keeps whatever was shown before so a stale entry
    /// stays visible while it is being refreshed.
    Pending {
        since: Instant,
        previous: Vec<CiCheck>,
    },
    Ready {
        checks: Vec<CiCheck>,
        fetched_at: Instant,
    },
}

impl CiEntry {
    pub fn checks(&self) -> &[CiCheck] {
        match self {
            CiEntry::Pending { previous, .. } => previous,
            CiEntry::Ready { checks, .. } => checks,
        }
    }
}

/// Branch keyed CI check cache with a fixed TTL.
#[derive(Debug, Clone)]
pub struct CiCache {
    entries: HashMap<String, CiEntry>,
    ttl: Duration,
}

impl Default for CiCache {
    fn default() -> Self {
        Self::new(CI_CACHE_TTL)
    }
}

impl CiCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True when no fetch for `branch` should be considered in flight or fresh at `now`.
    ///
    /// A pending entry older than the TTL is treated as lost and may be fetched again.
    pub fn needs_fetch(&self, branch: &str, now: Instant) -> bool {
        match self.entries.get(branch) {
            None => true,
            Some(CiEntry::Pending { since, .. }) => {
                now.saturating_duration_since(*since) >= self.ttl
            }
            Some(CiEntry::Ready { fetched_at, .. }) => {
                now.saturating_duration_since(*fetched_at) >= self.ttl
            }
        }
    }

    pub fn is_fresh(&self, branch: &str, now: Instant) -> bool {
        matches!(
            self.entries.get(branch),
            Some(CiEntry::Ready { fetched_at, .. })
                if now.saturating_duration_since(*fetched_at) < self.ttl
        )
    }

    pub fn is_pending(&self, branch: &str) -> bool {
        matches!(self.entries.get(branch), Some(CiEntry::Pending { .. }))
    }

    pub fn mark_pending(&mut self, branch: &str, now: Instant) {
        let previous = self
            .entries
            .remove(branch)
            .map(|e| e.checks().to_vec())
            .unwrap_or_default();
        self.entries.insert(
            branch.to_string(),
            CiEntry::Pending {
                since: now,
                previous,
            },
        );
    }

    /// Last write wins per branch.
    pub fn store(&mut self, branch: &str, checks: Vec<CiCheck>, now: Instant) {
        self.entries.insert(
            branch.to_string(),
            CiEntry::Ready {
                checks,
                fetched_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, branch: &str) {
        self.entries.remove(branch);
    }

    pub fn get(&self, branch: &str) -> Option<&CiEntry> {
        self.entries.get(branch)
    }

    /// Cached checks for display, native runner checks first.
    pub fn sorted_checks(&self, branch: &str) -> Vec<CiCheck> {
        self.entries
            .get(branch)
            .map(|e| sort_ci_checks(e.checks()))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stable partition: checks linking into `/actions/` first, relative order kept in each group.
pub fn sort_ci_checks(checks: &[CiCheck]) -> Vec<CiCheck> {
    let (mut native, other): (Vec<CiCheck>, Vec<CiCheck>) =
        checks.iter().cloned().partition(CiCheck::is_native_runner);
    native.extend(other);
    native
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Conclusion;
    use tempfile::tempdir;

    fn check(name: &str, link: &str) -> CiCheck {
        CiCheck::new(name, Conclusion::Success, link)
    }

    #[test]
    fn snapshot_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let root = dir.path().join("repo");
        let wts = vec![
            WorkingTree::new("/r/main", "main", true),
            WorkingTree::new("/r/feat", "feat", false).with_counts(1, 0, 0),
        ];
        save_snapshot(&root, &wts)?;
        assert_eq!(load_snapshot(&root), Some(wts));
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(snapshot_path(dir.path()), "{ nope")?;
        assert_eq!(load_snapshot(dir.path()), None);
        assert_eq!(load_snapshot(&dir.path().join("missing")), None);
        Ok(())
    }

    #[test]
    fn last_selected_marker() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert_eq!(read_last_selected(dir.path()), None);
        write_last_selected(dir.path(), Path::new("/r/feat"))?;
        assert_eq!(read_last_selected(dir.path()), Some(PathBuf::from("/r/feat")));
        Ok(())
    }

    #[test]
    fn output_selection_is_private() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let target = dir.path().join("selection");
        write_output_selection(&target, Some(Path::new("/r/feat")))?;
        assert_eq!(fs::read_to_string(&target)?, "/r/feat\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert_eq!(fs::metadata(&target)?.permissions().mode() & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn output_selection_is_cleared_without_a_pick() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let target = dir.path().join("nested/state/selection");
        write_output_selection(&target, Some(Path::new("/r/old")))?;
        write_output_selection(&target, None)?;
        assert_eq!(fs::read_to_string(&target)?, "");
        Ok(())
    }

    #[test]
    fn fresh_entry_is_a_hit() {
        let mut cache = CiCache::default();
        let now = Instant::now();
        cache.store("feature", vec![], now);
        let later = now + Duration::from_secs(1);
        assert!(!cache.needs_fetch("feature", later));
        assert!(cache.needs_fetch("feature", now + Duration::from_secs(31)));
        assert!(cache.needs_fetch("other", later));
    }

    #[test]
    fn pending_blocks_duplicate_fetch_and_keeps_stale_checks() {
        let mut cache = CiCache::default();
        let t0 = Instant::now();
        cache.store("feat", vec![check("old", "")], t0);

        let t1 = t0 + Duration::from_secs(40);
        assert!(cache.needs_fetch("feat", t1));
        cache.mark_pending("feat", t1);
        assert!(!cache.needs_fetch("feat", t1 + Duration::from_secs(1)));
        assert_eq!(cache.sorted_checks("feat").len(), 1);

        cache.store("feat", vec![check("new", ""), check("newer", "")], t1);
        assert_eq!(cache.sorted_checks("feat").len(), 2);
        assert!(!cache.is_pending("feat"));
    }

    #[test]
    fn native_runner_checks_first() {
        let checks = vec![
            check("tekton", "https://tekton.example.com/1"),
            check("build", "https://github.com/o/r/actions/runs/1/job/2"),
            check("sonar", "https://sonar.example.com"),
            check("test", "https://github.com/o/r/actions/runs/1/job/3"),
        ];
        let names: Vec<String> = sort_ci_checks(&checks).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["build", "test", "tekton", "sonar"]);
    }
}
