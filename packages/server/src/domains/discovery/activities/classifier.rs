//! Candidate classification: confidence score -> disposition.
//!
//! The threshold comparison is exact fixed-point arithmetic. Scores are
//! produced, stored, and compared at scale 2; a score of exactly 0.60 meets
//! the threshold, 0.59 does not. Binary floating point never touches these
//! values.

use rust_decimal::Decimal;

use crate::domains::discovery::models::CandidateStatus;

/// Minimum confidence for a candidate to be queued for crawling.
pub fn confidence_threshold() -> Decimal {
    Decimal::new(60, 2) // 0.60
}

pub fn is_high_confidence(score: Decimal) -> bool {
    score >= confidence_threshold()
}

/// Total function: every score in [0.00, 1.00] maps to exactly one
/// disposition, no error case.
pub fn classify_result(score: Decimal) -> CandidateStatus {
    if is_high_confidence(score) {
        CandidateStatus::PendingCrawl
    } else {
        CandidateStatus::SkippedLowConfidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(
            classify_result(Decimal::new(60, 2)),
            CandidateStatus::PendingCrawl
        );
    }

    #[test]
    fn just_below_threshold_is_skipped() {
        assert_eq!(
            classify_result(Decimal::new(59, 2)),
            CandidateStatus::SkippedLowConfidence
        );
    }

    #[test]
    fn extremes_classify_cleanly() {
        assert_eq!(
            classify_result(Decimal::ZERO),
            CandidateStatus::SkippedLowConfidence
        );
        assert_eq!(classify_result(Decimal::ONE), CandidateStatus::PendingCrawl);
    }

    #[test]
    fn scale_does_not_affect_comparison() {
        // 0.6 at scale 1 and 0.60 at scale 2 are the same value
        assert_eq!(
            classify_result(Decimal::new(6, 1)),
            CandidateStatus::PendingCrawl
        );
        // 0.599 at scale 3 is below the threshold
        assert_eq!(
            classify_result(Decimal::new(599, 3)),
            CandidateStatus::SkippedLowConfidence
        );
    }
}
