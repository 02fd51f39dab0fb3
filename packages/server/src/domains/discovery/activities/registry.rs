//! Domain registry helpers: retry backoff policy and requeue.
//!
//! The pipeline only ever sets and reads `retry_after`; the curve that
//! produces it lives here so it can be tested on its own.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::kernel::traits::BaseDomainStore;

/// Domains that failed this many times stay parked until an operator looks
/// at them.
pub const DEFAULT_MAX_FAILURES: i32 = 5;

/// Backoff delay for a domain that has now failed `failure_count` times.
///
/// 1 failure -> 1 hour, 2 -> 4 hours, 3 -> 1 day, 4 or more -> 1 week cap.
pub fn next_retry_delay(failure_count: i32) -> Duration {
    match failure_count {
        i32::MIN..=1 => Duration::hours(1),
        2 => Duration::hours(4),
        3 => Duration::days(1),
        _ => Duration::weeks(1),
    }
}

/// Absolute retry timestamp for a failure happening at `from`.
pub fn next_retry_at(failure_count: i32, from: DateTime<Utc>) -> DateTime<Utc> {
    from + next_retry_delay(failure_count)
}

/// Put every failed domain whose backoff has elapsed back into rotation.
/// Returns how many were requeued.
pub async fn requeue_ready_domains(
    domains: &dyn BaseDomainStore,
    max_failures: i32,
) -> Result<u32> {
    let ready = domains.find_ready_for_retry(max_failures).await?;
    let mut requeued = 0u32;

    for domain in ready {
        domains.reset_for_retry(domain.id).await?;
        info!(
            domain = %domain.domain_name,
            failure_count = domain.failure_count,
            "Requeued failed domain for retry"
        );
        requeued += 1;
    }

    Ok(requeued)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_escalates_then_caps() {
        assert_eq!(next_retry_delay(1), Duration::hours(1));
        assert_eq!(next_retry_delay(2), Duration::hours(4));
        assert_eq!(next_retry_delay(3), Duration::days(1));
        assert_eq!(next_retry_delay(4), Duration::weeks(1));
        assert_eq!(next_retry_delay(10), Duration::weeks(1));
    }

    #[test]
    fn zero_and_negative_counts_get_the_minimum_delay() {
        assert_eq!(next_retry_delay(0), Duration::hours(1));
        assert_eq!(next_retry_delay(-3), Duration::hours(1));
    }

    #[test]
    fn retry_timestamp_is_anchored_to_the_failure_time() {
        let from = Utc::now();
        assert_eq!(next_retry_at(1, from), from + Duration::hours(1));
        assert_eq!(next_retry_at(4, from), from + Duration::weeks(1));
    }
}
