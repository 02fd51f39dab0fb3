//! Cross-category spam detection: pages whose domain sells gambling or
//! essay-writing services but dress their metadata up as education funding
//! to get crawled.

const GAMBLING_TERMS: [&str; 10] = [
    "casino", "poker", "betting", "bet", "win", "lottery", "jackpot", "slots", "gamble", "wager",
];

const ESSAY_MILL_TERMS: [&str; 8] = [
    "essay",
    "paper",
    "dissertation",
    "thesis",
    "assignment",
    "homework",
    "writeessay",
    "essaywriter",
];

const EDUCATION_TERMS: [&str; 9] = [
    "scholarship",
    "grant",
    "funding",
    "education",
    "student",
    "tuition",
    "financial aid",
    "college",
    "university",
];

/// First gambling or essay-mill term found in the domain, if any.
pub(crate) fn domain_spam_term(domain: &str) -> Option<&'static str> {
    let lowered = domain.to_lowercase();
    GAMBLING_TERMS
        .iter()
        .chain(ESSAY_MILL_TERMS.iter())
        .find(|term| lowered.contains(**term))
        .copied()
}

/// Whether the metadata text claims to be about education funding.
pub(crate) fn metadata_signals_education(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EDUCATION_TERMS.iter().any(|term| lowered.contains(term))
}

/// Flag when the domain carries gambling/essay-mill terms while the
/// metadata reads as education funding. Blank metadata never flags.
pub(crate) fn detect(domain: &str, metadata: &str) -> bool {
    if metadata.trim().is_empty() {
        return false;
    }
    domain_spam_term(domain).is_some() && metadata_signals_education(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gambling_domain_with_education_metadata_flags() {
        assert!(detect(
            "lucky-casino.com",
            "Apply now for student scholarships and education grants"
        ));
    }

    #[test]
    fn essay_mill_domain_with_education_metadata_flags() {
        assert!(detect(
            "essaywriter-pro.com",
            "Get funding for your college tuition"
        ));
    }

    #[test]
    fn education_domain_with_education_metadata_passes() {
        assert!(!detect(
            "gatesfoundation.org",
            "Education grants for schools and students"
        ));
    }

    #[test]
    fn gambling_domain_with_gambling_metadata_passes() {
        // Honest gambling site - not in our category, but not cross-category spam
        assert!(!detect("lucky-casino.com", "Play poker online and hit the jackpot"));
    }

    #[test]
    fn blank_metadata_never_flags() {
        assert!(!detect("lucky-casino.com", ""));
        assert!(!detect("lucky-casino.com", "   "));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(detect(
            "LUCKY-CASINO.COM",
            "STUDENT SCHOLARSHIPS AVAILABLE NOW"
        ));
    }
}
