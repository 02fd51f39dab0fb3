//! Per-engine daily usage counting.
//!
//! Every invocation attempt counts against the limit, including attempts
//! that later fail for other reasons. The increment-and-check is a single
//! atomic operation so two concurrent calls at a just-at-limit counter can
//! never both pass.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::Utc;

const WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug)]
pub struct DailyUsageCounter {
    limit: Option<u32>,
    count: AtomicU32,
    window_started_at: AtomicI64,
}

impl DailyUsageCounter {
    /// `None` means effectively unlimited; attempts are still counted for
    /// reporting.
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            count: AtomicU32::new(0),
            window_started_at: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// Count one invocation attempt. Returns false when this attempt
    /// exceeds the daily limit; the caller must then fail without touching
    /// the network.
    pub fn try_acquire(&self) -> bool {
        self.roll_window_if_elapsed();
        let attempt = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        match self.limit {
            Some(limit) => attempt <= limit,
            None => true,
        }
    }

    /// Attempts counted in the current window.
    pub fn current(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    fn roll_window_if_elapsed(&self) {
        let started = self.window_started_at.load(Ordering::SeqCst);
        let now = Utc::now().timestamp_millis();
        if now - started >= WINDOW_MS {
            // Exactly one caller wins the rollover and zeroes the count;
            // everyone else proceeds against the fresh window.
            if self
                .window_started_at
                .compare_exchange(started, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.count.store(0, Ordering::SeqCst);
            }
        }
    }

    #[cfg(test)]
    fn backdate_window(&self, ms_ago: i64) {
        self.window_started_at
            .store(Utc::now().timestamp_millis() - ms_ago, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisitions_under_the_limit_pass() {
        let counter = DailyUsageCounter::new(Some(3));
        assert!(counter.try_acquire());
        assert!(counter.try_acquire());
        assert!(counter.try_acquire());
        assert_eq!(counter.current(), 3);
    }

    #[test]
    fn the_attempt_past_the_limit_fails_but_still_counts() {
        let counter = DailyUsageCounter::new(Some(2));
        assert!(counter.try_acquire());
        assert!(counter.try_acquire());
        assert!(!counter.try_acquire());
        assert_eq!(counter.current(), 3);
    }

    #[test]
    fn unlimited_counters_never_refuse() {
        let counter = DailyUsageCounter::new(None);
        for _ in 0..1000 {
            assert!(counter.try_acquire());
        }
        assert_eq!(counter.current(), 1000);
    }

    #[test]
    fn window_rollover_resets_the_count() {
        let counter = DailyUsageCounter::new(Some(1));
        assert!(counter.try_acquire());
        assert!(!counter.try_acquire());

        counter.backdate_window(WINDOW_MS + 1);
        assert!(counter.try_acquire());
    }

    #[test]
    fn concurrent_acquisitions_at_the_limit_admit_exactly_limit() {
        let counter = DailyUsageCounter::new(Some(5));

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..10)
                .map(|_| scope.spawn(|| counter.try_acquire()))
                .collect();

            let admitted = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count();
            assert_eq!(admitted, 5);
        });
    }
}
