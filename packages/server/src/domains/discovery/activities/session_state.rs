//! Shared per-session state: the domain dedup set and the statistics
//! accumulator.
//!
//! Queries inside one session may be processed concurrently, so both live
//! behind one mutex. Mark-seen is a single test-and-insert under the lock -
//! never a separate contains + insert, which would let two tasks both claim
//! first sight of a domain.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::domains::discovery::statistics::SessionStatistics;

#[derive(Debug, Default)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    seen_domains: HashSet<String>,
    stats: SessionStatistics,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a domain sighting. Returns true on first sight within this
    /// session; a repeat returns false and bumps the duplicate counter,
    /// exactly once per repeat, under the same lock acquisition.
    pub fn mark_domain_seen(&self, domain: &str) -> bool {
        let mut inner = self.lock();
        if inner.seen_domains.insert(domain.to_string()) {
            true
        } else {
            inner.stats.duplicates_skipped += 1;
            false
        }
    }

    /// Mutate the statistics under the lock.
    pub fn with_stats<R>(&self, f: impl FnOnce(&mut SessionStatistics) -> R) -> R {
        let mut inner = self.lock();
        f(&mut inner.stats)
    }

    /// Clone the current statistics for finalization or reporting.
    pub fn snapshot(&self) -> SessionStatistics {
        self.lock().stats.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another task panicked mid-update;
        // the counters themselves are still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sight_true_then_false_with_one_duplicate_count() {
        let state = SessionState::new();

        assert!(state.mark_domain_seen("example.org"));
        assert!(!state.mark_domain_seen("example.org"));

        let stats = state.snapshot();
        assert_eq!(stats.duplicates_skipped, 1);
    }

    #[test]
    fn distinct_domains_are_independent() {
        let state = SessionState::new();

        assert!(state.mark_domain_seen("example.org"));
        assert!(state.mark_domain_seen("other.org"));

        assert_eq!(state.snapshot().duplicates_skipped, 0);
    }

    #[test]
    fn concurrent_marks_elect_exactly_one_winner() {
        let state = SessionState::new();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| state.mark_domain_seen("example.org")))
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(winners, 1);
        });

        assert_eq!(state.snapshot().duplicates_skipped, 7);
    }

    #[test]
    fn stats_mutation_happens_under_the_lock() {
        let state = SessionState::new();
        state.with_stats(|stats| {
            stats.total_results += 3;
            stats.spam_filtered += 1;
        });

        let stats = state.snapshot();
        assert_eq!(stats.total_results, 3);
        assert_eq!(stats.spam_filtered, 1);
    }
}
