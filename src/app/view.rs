//! The filtered and sorted view over the worktree list.
//!
//! [WorktreeView] is recomputed from scratch whenever the filter text, the sort mode or the
//! worktree list changes. The selection follows the previously selected worktree (by path, then
//! by branch) across recomputes and is `None` exactly when the view is empty.

use crate::config::SortMode;
use crate::core::models::WorkingTree;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Everything the view depends on besides the worktrees themselves.
pub struct ViewParams<'a> {
    pub filter: &'a str,
    pub sort: SortMode,
    pub fuzzy: bool,
    /// Monotonic "last switched to" stamps, keyed by worktree path.
    pub switched: &'a HashMap<PathBuf, u64>,
}

#[derive(Debug, Default, Clone)]
pub struct WorktreeView {
    indices: Vec<usize>,
    selected: Option<usize>,
    anchor: Option<(PathBuf, String)>,
}

/// Case-insensitive match of `filter` against branch and path.
pub fn matches(wt: &WorkingTree, filter: &str, fuzzy: Option<&SkimMatcherV2>) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let branch = wt.branch.to_lowercase();
    let path = wt.path.to_string_lossy().to_lowercase();
    match fuzzy {
        Some(m) => {
            m.fuzzy_match(&branch, &needle).is_some() || m.fuzzy_match(&path, &needle).is_some()
        }
        None => branch.contains(&needle) || path.contains(&needle),
    }
}

fn sort_indices(indices: &mut [usize], worktrees: &[WorkingTree], params: &ViewParams<'_>) {
    match params.sort {
        SortMode::Switched => indices.sort_by_key(|&i| {
            std::cmp::Reverse(params.switched.get(&worktrees[i].path).copied().unwrap_or(0))
        }),
        SortMode::Active => {
            indices.sort_by_key(|&i| std::cmp::Reverse(worktrees[i].last_active));
        }
        SortMode::Path => indices.sort_by(|&a, &b| worktrees[a].path.cmp(&worktrees[b].path)),
    }
}

impl WorktreeView {
    pub fn recompute(&mut self, worktrees: &[WorkingTree], params: &ViewParams<'_>) {
        let matcher = params.fuzzy.then(SkimMatcherV2::default);
        let mut indices: Vec<usize> = worktrees
            .iter()
            .enumerate()
            .filter(|(_, wt)| matches(wt, params.filter, matcher.as_ref()))
            .map(|(i, _)| i)
            .collect();
        sort_indices(&mut indices, worktrees, params);

        let previous = self.selected;
        self.indices = indices;

        if self.indices.is_empty() {
            self.selected = None;
            return;
        }

        let by_identity = self.anchor.as_ref().and_then(|(path, branch)| {
            self.indices
                .iter()
                .position(|&i| worktrees[i].path == *path)
                .or_else(|| {
                    self.indices
                        .iter()
                        .position(|&i| !branch.is_empty() && worktrees[i].branch == *branch)
                })
        });
        let pos = by_identity
            .or(previous)
            .unwrap_or(0)
            .min(self.indices.len() - 1);
        self.set_selected(pos, worktrees);
    }

    fn set_selected(&mut self, pos: usize, worktrees: &[WorkingTree]) {
        self.selected = Some(pos);
        self.anchor = self
            .indices
            .get(pos)
            .and_then(|&i| worktrees.get(i))
            .map(|wt| (wt.path.clone(), wt.branch.clone()));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of the cursor within the view.
    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Index into the worktree list of the selected entry.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|p| self.indices.get(p).copied())
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Moves the cursor by `delta`, clamped to the view. Returns whether it moved.
    pub fn move_by(&mut self, delta: isize, worktrees: &[WorkingTree]) -> bool {
        let Some(cur) = self.selected else {
            return false;
        };
        let max = self.indices.len().saturating_sub(1) as isize;
        let next = (cur as isize + delta).clamp(0, max) as usize;
        if next == cur {
            return false;
        }
        self.set_selected(next, worktrees);
        true
    }

    pub fn select_first(&mut self, worktrees: &[WorkingTree]) -> bool {
        self.select_at(0, worktrees)
    }

    pub fn select_last(&mut self, worktrees: &[WorkingTree]) -> bool {
        let last = self.indices.len().saturating_sub(1);
        self.select_at(last, worktrees)
    }

    pub fn select_at(&mut self, pos: usize, worktrees: &[WorkingTree]) -> bool {
        if pos >= self.indices.len() || self.selected == Some(pos) {
            return false;
        }
        self.set_selected(pos, worktrees);
        true
    }

    /// Points the cursor at `path` the next time the view is recomputed, or now if it is
    /// already visible.
    pub fn select_path(&mut self, path: &Path, worktrees: &[WorkingTree]) {
        match self
            .indices
            .iter()
            .position(|&i| worktrees.get(i).is_some_and(|wt| wt.path == path))
        {
            Some(pos) => self.set_selected(pos, worktrees),
            None => self.anchor = Some((path.to_path_buf(), String::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trees() -> Vec<WorkingTree> {
        vec![
            WorkingTree::new("/wt/repo", "main", true).with_last_active(100),
            WorkingTree::new("/wt/zeta", "feat-login", false).with_last_active(300),
            WorkingTree::new("/wt/alpha", "fix-crash", false).with_last_active(200),
        ]
    }

    fn params<'a>(
        filter: &'a str,
        sort: SortMode,
        sw: &'a HashMap<PathBuf, u64>,
    ) -> ViewParams<'a> {
        ViewParams {
            filter,
            sort,
            fuzzy: false,
            switched: sw,
        }
    }

    fn branches(view: &WorktreeView, wts: &[WorkingTree]) -> Vec<String> {
        view.indices().iter().map(|&i| wts[i].branch.clone()).collect()
    }

    #[test]
    fn sorts_by_each_mode() {
        let wts = trees();
        let sw = HashMap::from([(PathBuf::from("/wt/alpha"), 5)]);
        let mut view = WorktreeView::default();

        view.recompute(&wts, &params("", SortMode::Path, &sw));
        assert_eq!(branches(&view, &wts), ["fix-crash", "main", "feat-login"]);

        view.recompute(&wts, &params("", SortMode::Active, &sw));
        assert_eq!(branches(&view, &wts), ["feat-login", "fix-crash", "main"]);

        view.recompute(&wts, &params("", SortMode::Switched, &sw));
        assert_eq!(branches(&view, &wts), ["fix-crash", "main", "feat-login"]);
    }

    #[test]
    fn filter_is_case_insensitive_over_branch_and_path() {
        let wts = trees();
        let sw = HashMap::new();
        let mut view = WorktreeView::default();
        view.recompute(&wts, &params("ALPHA", SortMode::Path, &sw));
        assert_eq!(branches(&view, &wts), ["fix-crash"]);
        view.recompute(&wts, &params("nothing-matches", SortMode::Path, &sw));
        assert!(view.is_empty());
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn fuzzy_filter() {
        let wts = trees();
        let sw = HashMap::new();
        let mut view = WorktreeView::default();
        let mut p = params("ftlgn", SortMode::Path, &sw);
        p.fuzzy = true;
        view.recompute(&wts, &p);
        assert_eq!(branches(&view, &wts), ["feat-login"]);
    }

    #[test]
    fn selection_follows_identity() {
        let wts = trees();
        let sw = HashMap::new();
        let mut view = WorktreeView::default();
        view.recompute(&wts, &params("", SortMode::Path, &sw));
        assert!(view.select_last(&wts));
        assert_eq!(view.selected_index(), Some(1));

        view.recompute(&wts, &params("", SortMode::Active, &sw));
        assert_eq!(view.selected(), Some(0));
        assert_eq!(view.selected_index(), Some(1));

        assert!(!view.move_by(-1, &wts));
        assert!(view.move_by(5, &wts));
        assert_eq!(view.selected(), Some(2));
    }

    #[test]
    fn selection_clamps_when_item_disappears() {
        let mut wts = trees();
        let sw = HashMap::new();
        let mut view = WorktreeView::default();
        view.recompute(&wts, &params("", SortMode::Path, &sw));
        view.select_last(&wts);
        wts.remove(1);
        view.recompute(&wts, &params("", SortMode::Path, &sw));
        assert_eq!(view.selected(), Some(1));
    }
}
