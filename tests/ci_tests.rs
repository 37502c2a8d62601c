//! CI status tests for lazyworktree
//!
//! Covers the branch keyed CI cache as seen through the model: results arriving in any order,
//! failed fetches, TTL expiry and the ordering of checks for display.

mod common;

use common::{FakeGit, loaded, press, sample_worktrees, startup};
use crossterm::event::KeyCode;
use lazyworktree::app::Message;
use lazyworktree::core::{CiCache, CiCheck, CiEntry, Conclusion};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn check(name: &str) -> CiCheck {
    CiCheck::new(name, Conclusion::Success, "")
}

#[test]
fn test_last_result_per_branch_wins_in_any_order() -> Result<(), Box<dyn std::error::Error>> {
    let git = Arc::new(FakeGit::with_worktrees(sample_worktrees()));
    let mut model = loaded(git, "", startup())?;
    let mut rng = rand::rng();

    for _ in 0..20 {
        let branches = ["main", "b-worktree", "a-worktree"];
        let mut arrivals: Vec<(String, usize)> = branches
            .iter()
            .flat_map(|b| (0..rng.random_range(1..4)).map(move |n| (b.to_string(), n)))
            .collect();
        arrivals.shuffle(&mut rng);

        let mut expected = std::collections::HashMap::new();
        for (branch, n) in &arrivals {
            let checks = (0..=*n).map(|i| check(&format!("job-{i}"))).collect();
            model.update(Message::CiStatusLoaded {
                branch: branch.clone(),
                checks: Ok(checks),
            });
            expected.insert(branch.clone(), n + 1);
        }

        for (branch, len) in expected {
            assert_eq!(model.ci_cache().sorted_checks(&branch).len(), len);
            assert!(!model.ci_cache().is_pending(&branch));
        }
    }
    Ok(())
}

#[test]
fn test_failed_fetch_leaves_empty_fresh_entry() -> Result<(), Box<dyn std::error::Error>> {
    let git = Arc::new(FakeGit::with_worktrees(sample_worktrees()));
    let mut model = loaded(git, "", startup())?;

    model.update(Message::CiStatusLoaded {
        branch: "b-worktree".to_string(),
        checks: Ok(vec![check("build")]),
    });
    model.update(Message::CiStatusLoaded {
        branch: "b-worktree".to_string(),
        checks: Err("gh: rate limited".to_string()),
    });

    let cache = model.ci_cache();
    assert!(cache.sorted_checks("b-worktree").is_empty());
    assert!(cache.is_fresh("b-worktree", Instant::now()));

    // A fresh entry means moving onto the branch starts no fetch.
    let out = press(&mut model, KeyCode::Char('j'));
    assert!(!out.ran("fetch-ci"));
    Ok(())
}

#[test]
fn test_pending_entry_blocks_refetch_until_ttl() {
    let ttl = Duration::from_secs(30);
    let mut cache = CiCache::new(ttl);
    let t0 = Instant::now();

    cache.mark_pending("feature", t0);
    assert!(cache.is_pending("feature"));
    assert!(!cache.needs_fetch("feature", t0 + Duration::from_secs(29)));
    // A result that never came back is given up on after the TTL.
    assert!(cache.needs_fetch("feature", t0 + ttl));

    cache.store("feature", vec![check("build")], t0 + Duration::from_secs(2));
    assert!(matches!(cache.get("feature"), Some(CiEntry::Ready { .. })));
    assert!(cache.is_fresh("feature", t0 + Duration::from_secs(31)));
    assert!(!cache.is_fresh("feature", t0 + Duration::from_secs(32)));
}

#[test]
fn test_display_order_puts_actions_jobs_first() {
    let mut rng = rand::rng();
    let mut checks: Vec<CiCheck> = (0..6)
        .map(|i| {
            let link = if i % 2 == 0 {
                format!("https://github.com/o/r/actions/runs/{i}/job/{i}")
            } else {
                format!("https://buildkite.com/o/r/builds/{i}")
            };
            CiCheck::new(format!("check-{i}"), Conclusion::Success, link)
        })
        .collect();
    checks.shuffle(&mut rng);

    let mut cache = CiCache::default();
    cache.store("feature", checks.clone(), Instant::now());
    let sorted = cache.sorted_checks("feature");

    let native_count = sorted.iter().take_while(|c| c.is_native_runner()).count();
    assert_eq!(native_count, 3);
    assert!(sorted[native_count..].iter().all(|c| !c.is_native_runner()));

    // Relative order inside each group is preserved.
    let original: Vec<&str> = checks
        .iter()
        .filter(|c| c.is_native_runner())
        .map(|c| c.name.as_str())
        .collect();
    let kept: Vec<&str> = sorted[..native_count].iter().map(|c| c.name.as_str()).collect();
    assert_eq!(original, kept);
}
