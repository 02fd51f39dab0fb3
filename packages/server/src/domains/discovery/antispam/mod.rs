//! Anti-spam filtering for raw search results.
//!
//! Four independent heuristic detectors run over a result's title,
//! description, and domain. Any single positive detector marks the result
//! as spam; the first positive in priority order is reported as the primary
//! indicator, but every detector always runs so the confidence value
//! reflects how many fired. All detectors are pure string work - no I/O.

mod cross_category;
mod domain_mismatch;
mod keyword_stuffing;
mod unnatural_list;

use rust_decimal::Decimal;

/// Which heuristic tripped first, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamIndicator {
    KeywordStuffing,
    DomainMetadataMismatch,
    UnnaturalKeywordList,
    CrossCategorySpam,
}

impl SpamIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpamIndicator::KeywordStuffing => "keyword_stuffing",
            SpamIndicator::DomainMetadataMismatch => "domain_metadata_mismatch",
            SpamIndicator::UnnaturalKeywordList => "unnatural_keyword_list",
            SpamIndicator::CrossCategorySpam => "cross_category_spam",
        }
    }
}

impl std::fmt::Display for SpamIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one filter evaluation.
#[derive(Debug, Clone)]
pub struct SpamVerdict {
    pub is_spam: bool,
    /// First positive detector in priority order; None when clean.
    pub indicator: Option<SpamIndicator>,
    pub reason: Option<String>,
    /// Diagnostic confidence in [0, 1]: 0.35 per fired detector, capped.
    pub confidence: Decimal,
}

impl SpamVerdict {
    fn clean() -> Self {
        Self {
            is_spam: false,
            indicator: None,
            reason: None,
            confidence: Decimal::ZERO,
        }
    }
}

/// Stateless spam filter over result metadata.
#[derive(Debug, Default, Clone)]
pub struct AntiSpamFilter;

impl AntiSpamFilter {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one result's metadata. Absent title and description are
    /// treated as clean input, never as spam evidence.
    pub fn evaluate(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        domain: &str,
    ) -> SpamVerdict {
        let combined = combine(title, description);
        let combined = combined.trim();

        // Every detector runs; order here is the reporting priority.
        let detections = [
            (
                SpamIndicator::KeywordStuffing,
                keyword_stuffing::detect(combined),
            ),
            (
                SpamIndicator::DomainMetadataMismatch,
                domain_mismatch::detect(domain, combined),
            ),
            (
                SpamIndicator::UnnaturalKeywordList,
                unnatural_list::detect(combined),
            ),
            (
                SpamIndicator::CrossCategorySpam,
                cross_category::detect(domain, combined),
            ),
        ];

        let fired: Vec<SpamIndicator> = detections
            .iter()
            .filter(|(_, hit)| *hit)
            .map(|(indicator, _)| *indicator)
            .collect();

        if fired.is_empty() {
            return SpamVerdict::clean();
        }

        let primary = fired[0];
        let confidence =
            (Decimal::new(35, 2) * Decimal::from(fired.len() as u32)).min(Decimal::ONE);

        SpamVerdict {
            is_spam: true,
            indicator: Some(primary),
            reason: Some(reason_for(primary, domain)),
            confidence,
        }
    }
}

fn combine(title: Option<&str>, description: Option<&str>) -> String {
    match (title, description) {
        (Some(t), Some(d)) => format!("{} {}", t, d),
        (Some(t), None) => t.to_string(),
        (None, Some(d)) => d.to_string(),
        (None, None) => String::new(),
    }
}

fn reason_for(indicator: SpamIndicator, domain: &str) -> String {
    match indicator {
        SpamIndicator::KeywordStuffing => {
            "repeated keywords dominate the text (distinct/total token ratio below 0.5)"
                .to_string()
        }
        SpamIndicator::DomainMetadataMismatch => format!(
            "domain '{}' lexically points at a different category than its metadata",
            domain
        ),
        SpamIndicator::UnnaturalKeywordList => {
            "text reads as a keyword list (fewer than 2 distinct stop-words)".to_string()
        }
        SpamIndicator::CrossCategorySpam => format!(
            "domain '{}' carries gambling/essay-mill terms while metadata claims education funding",
            domain
        ),
    }
}
