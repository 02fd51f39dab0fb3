//! Default confidence scorer.
//!
//! A cheap keyword heuristic that stands in for the external relevance
//! model: TLD credibility plus funding/audience/organization signals in the
//! result metadata. Scores are exact scale-2 decimals clamped to
//! [0.00, 1.00]; the classification threshold lives in the pipeline, not
//! here.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use super::traits::{BaseConfidenceScorer, SearchResult};
use crate::domains::discovery::models::Domain;

const FUNDING_KEYWORDS: &[&str] = &[
    "grant",
    "grants",
    "funding",
    "scholarship",
    "scholarships",
    "fellowship",
    "fellowships",
    "subsidy",
    "subsidies",
    "bursary",
    "bursaries",
    "award",
    "awards",
    "stipend",
    "stipends",
    "financial aid",
    "financial support",
    "sponsorship",
    "endowment",
];

const AUDIENCE_KEYWORDS: &[&str] = &[
    "student",
    "students",
    "school",
    "schools",
    "teacher",
    "teachers",
    "education",
    "educational",
    "university",
    "college",
    "classroom",
    "curriculum",
    "stem",
];

const ORGANIZATION_KEYWORDS: &[&str] = &[
    "ministry",
    "commission",
    "foundation",
    "fund",
    "university",
    "college",
    "government",
    "national",
    "state",
    "federal",
    "agency",
    "authority",
    "council",
    "department",
    "institute",
    "trust",
    "charity",
    "nonprofit",
];

/// (tld, credibility adjustment in hundredths)
const TLD_SCORES: &[(&str, i64)] = &[
    // Validated nonprofit / government / education
    ("gov", 20),
    ("edu", 20),
    ("ngo", 20),
    ("foundation", 20),
    ("charity", 20),
    // Traditional nonprofit and funding TLDs
    ("org", 15),
    ("eu", 15),
    ("fund", 15),
    ("gives", 15),
    // Generic business
    ("com", 8),
    ("net", 8),
    ("info", 8),
    ("education", 8),
    // Free registrations favored by spam farms
    ("tk", -30),
    ("ml", -30),
    ("ga", -30),
    ("cf", -30),
    ("gq", -30),
    ("loan", -25),
    ("xyz", -20),
    ("top", -20),
    ("icu", -20),
    ("buzz", -20),
    ("click", -15),
    ("cam", -15),
    ("pw", -15),
    ("shop", -10),
];

pub struct KeywordConfidenceScorer;

impl KeywordConfidenceScorer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseConfidenceScorer for KeywordConfidenceScorer {
    async fn score(&self, result: &SearchResult, domain: &Domain) -> Result<Decimal> {
        let mut score = tld_credibility(&domain.domain_name);
        let mut signals = 0;

        let title = result.title.as_deref().unwrap_or_default().to_lowercase();
        let description = result
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        if contains_any(&title, FUNDING_KEYWORDS) {
            score += Decimal::new(15, 2);
            signals += 1;
        }
        if contains_any(&description, FUNDING_KEYWORDS) {
            score += Decimal::new(10, 2);
            signals += 1;
        }
        if contains_any(&title, AUDIENCE_KEYWORDS) || contains_any(&description, AUDIENCE_KEYWORDS)
        {
            score += Decimal::new(15, 2);
            signals += 1;
        }
        if contains_any(&title, ORGANIZATION_KEYWORDS)
            || contains_any(&description, ORGANIZATION_KEYWORDS)
        {
            score += Decimal::new(15, 2);
            signals += 1;
        }

        // Independent signals agreeing is worth more than their sum.
        if signals >= 3 {
            score += Decimal::new(15, 2);
        }

        Ok(score.clamp(Decimal::ZERO, Decimal::ONE).round_dp(2))
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    keywords.iter().any(|kw| text.contains(kw))
}

/// TLD credibility adjustment for a normalized domain name.
///
/// Registered government/academic second-level suffixes (gov.xx, edu.xx,
/// ac.xx) rate like their top-level equivalents.
fn tld_credibility(domain_name: &str) -> Decimal {
    let labels: Vec<&str> = domain_name.rsplit('.').collect();
    if labels.len() >= 3 {
        if let Some(second_level) = labels.get(1) {
            if matches!(*second_level, "gov" | "edu" | "ac") {
                return Decimal::new(20, 2);
            }
        }
    }

    let tld = labels.first().copied().unwrap_or_default();
    TLD_SCORES
        .iter()
        .find(|(known, _)| *known == tld)
        .map(|(_, hundredths)| Decimal::new(*hundredths, 2))
        .unwrap_or(Decimal::ZERO)
}
