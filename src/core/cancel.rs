//! Cancellation scope shared by every piece of background work.
//!
//! The [Model](crate::app::Model) owns one root token for its whole lifetime. Tasks receive a
//! reference to it (or to a child with a shorter deadline) and check it between blocking steps.
//! The process runner polls it while waiting on a child and kills the child once it trips.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a child sharing the parent's flag with a deadline `timeout` from now.
    ///
    /// A child never outlives its parent's deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < own => parent,
            _ => own,
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    /// Trips the shared flag. Every token derived from this scope observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, `None` when the token has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn child_sees_parent_cancel() {
        let root = CancelToken::new();
        let child = root.with_timeout(Duration::from_secs(30));
        assert!(!child.is_cancelled());
        root.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn deadline_expires() {
        let root = CancelToken::new();
        let child = root.with_timeout(Duration::from_millis(10));
        assert!(!root.is_expired());
        thread::sleep(Duration::from_millis(30));
        assert!(child.is_expired());
        assert_eq!(child.remaining(), Some(Duration::ZERO));
        assert!(!root.is_expired());
    }

    #[test]
    fn child_keeps_shorter_parent_deadline() {
        let root = CancelToken::new();
        let short = root.with_timeout(Duration::from_millis(50));
        let long = short.with_timeout(Duration::from_secs(60));
        assert_eq!(long.deadline(), short.deadline());
    }
}
