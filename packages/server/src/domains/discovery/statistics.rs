use rust_decimal::Decimal;
use std::collections::HashMap;

/// Running counters for one discovery session.
///
/// Every raw result the orchestrator hands to the pipeline lands in exactly
/// one bucket: duplicate, blacklisted, spam, invalid URL, high confidence,
/// low confidence, or processing error. `is_balanced` checks that book.
#[derive(Debug, Clone, Default)]
pub struct SessionStatistics {
    pub queries_executed: u32,
    pub total_results: u32,
    pub candidates_created: u32,
    pub high_confidence_candidates: u32,
    pub low_confidence_candidates: u32,
    pub duplicates_skipped: u32,
    pub blacklisted_skipped: u32,
    pub spam_filtered: u32,
    pub invalid_urls_skipped: u32,
    pub processing_errors: u32,
    pub zero_result_queries: u32,
    /// Result counts per engine, across all queries.
    pub results_by_engine: HashMap<String, u32>,
    /// Queries per engine that succeeded but matched nothing.
    pub zero_results_by_engine: HashMap<String, u32>,
    /// Non-fatal failures collected along the way (query generation,
    /// provider outages), surfaced in the session record.
    pub failure_messages: Vec<String>,
    confidence_sum: Decimal,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a created candidate and fold its score into the session average.
    pub fn record_candidate(&mut self, score: Decimal, high_confidence: bool) {
        self.candidates_created += 1;
        self.confidence_sum += score;
        if high_confidence {
            self.high_confidence_candidates += 1;
        } else {
            self.low_confidence_candidates += 1;
        }
    }

    pub fn record_engine_results(&mut self, engine: &str, count: u32) {
        *self.results_by_engine.entry(engine.to_string()).or_insert(0) += count;
        if count == 0 {
            self.zero_result_queries += 1;
            *self
                .zero_results_by_engine
                .entry(engine.to_string())
                .or_insert(0) += 1;
        }
    }

    /// Mean confidence across created candidates, rounded to two decimals.
    pub fn average_confidence(&self) -> Option<Decimal> {
        if self.candidates_created == 0 {
            return None;
        }
        Some((self.confidence_sum / Decimal::from(self.candidates_created)).round_dp(2))
    }

    /// Results accounted for across all outcome buckets.
    pub fn accounted_results(&self) -> u32 {
        self.duplicates_skipped
            + self.blacklisted_skipped
            + self.spam_filtered
            + self.invalid_urls_skipped
            + self.high_confidence_candidates
            + self.low_confidence_candidates
            + self.processing_errors
    }

    /// Every result the pipeline saw must be in exactly one bucket.
    pub fn is_balanced(&self) -> bool {
        self.total_results == self.accounted_results()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_recording_updates_average() {
        let mut stats = SessionStatistics::new();
        assert_eq!(stats.average_confidence(), None);

        stats.record_candidate(Decimal::new(80, 2), true);
        stats.record_candidate(Decimal::new(40, 2), false);

        assert_eq!(stats.candidates_created, 2);
        assert_eq!(stats.high_confidence_candidates, 1);
        assert_eq!(stats.low_confidence_candidates, 1);
        assert_eq!(stats.average_confidence(), Some(Decimal::new(60, 2)));
    }

    #[test]
    fn zero_result_queries_tracked_per_engine() {
        let mut stats = SessionStatistics::new();
        stats.record_engine_results("brave", 10);
        stats.record_engine_results("tavily", 0);
        stats.record_engine_results("tavily", 0);

        assert_eq!(stats.zero_result_queries, 2);
        assert_eq!(stats.zero_results_by_engine.get("tavily"), Some(&2));
        assert_eq!(stats.zero_results_by_engine.get("brave"), None);
        assert_eq!(stats.results_by_engine.get("brave"), Some(&10));
    }

    #[test]
    fn balance_check_accounts_for_every_bucket() {
        let mut stats = SessionStatistics::new();
        stats.total_results = 7;
        stats.duplicates_skipped = 1;
        stats.blacklisted_skipped = 1;
        stats.spam_filtered = 1;
        stats.invalid_urls_skipped = 1;
        stats.processing_errors = 1;
        stats.record_candidate(Decimal::new(75, 2), true);
        stats.record_candidate(Decimal::new(30, 2), false);

        assert!(stats.is_balanced());

        stats.total_results += 1;
        assert!(!stats.is_balanced());
    }
}
