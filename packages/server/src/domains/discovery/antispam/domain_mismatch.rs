//! Domain/metadata mismatch detection: the domain name and the page
//! metadata describe different things entirely.
//!
//! Low lexical overlap alone is normal (domains are short), so this only
//! fires when the cross-category lexicons already disagree AND the word
//! overlap between domain and metadata is near zero.

use std::collections::HashMap;

use super::cross_category;

const KNOWN_TLDS: [&str; 7] = ["com", "org", "net", "edu", "gov", "io", "co"];

const SIMILARITY_FLOOR: f64 = 0.15;

pub(crate) fn detect(domain: &str, metadata: &str) -> bool {
    if metadata.trim().is_empty() {
        return false;
    }

    // Gate on cross-category evidence before comparing vocabularies.
    if cross_category::domain_spam_term(domain).is_none()
        || !cross_category::metadata_signals_education(metadata)
    {
        return false;
    }

    let domain_words = word_frequencies(strip_tld(domain));
    let metadata_words = word_frequencies(metadata);
    cosine_similarity(&domain_words, &metadata_words) < SIMILARITY_FLOOR
}

fn strip_tld(domain: &str) -> &str {
    if let Some((stem, tld)) = domain.rsplit_once('.') {
        if KNOWN_TLDS.contains(&tld) {
            return stem;
        }
    }
    domain
}

/// Word frequency vector; words of 1-2 characters carry no signal.
fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let mut frequencies = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
    {
        *frequencies.entry(word.to_string()).or_insert(0) += 1;
    }
    frequencies
}

fn cosine_similarity(a: &HashMap<String, u32>, b: &HashMap<String, u32>) -> f64 {
    let dot: u64 = a
        .iter()
        .filter_map(|(word, &count_a)| b.get(word).map(|&count_b| count_a as u64 * count_b as u64))
        .sum();

    let norm_a = (a.values().map(|&c| c as u64 * c as u64).sum::<u64>() as f64).sqrt();
    let norm_b = (b.values().map(|&c| c as u64 * c as u64).sum::<u64>() as f64).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot as f64 / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_vocabulary_with_cross_category_evidence_flags() {
        assert!(detect(
            "lucky-jackpot-slots.com",
            "Scholarship funding for graduate students"
        ));
    }

    #[test]
    fn shared_vocabulary_passes_even_with_cross_category_terms() {
        // Domain and metadata share most of their words; overlap is high
        assert!(!detect(
            "casino-scholarship.com",
            "Casino scholarship fund for students"
        ));
    }

    #[test]
    fn low_overlap_without_category_evidence_passes() {
        // A short domain rarely shares words with its metadata; that alone
        // is not a mismatch
        assert!(!detect(
            "gatesfoundation.org",
            "Apply for annual scholarships and grants"
        ));
    }

    #[test]
    fn blank_metadata_never_flags() {
        assert!(!detect("lucky-jackpot-slots.com", ""));
    }

    #[test]
    fn cosine_similarity_handles_empty_vectors() {
        let empty = HashMap::new();
        let mut words = HashMap::new();
        words.insert("grants".to_string(), 2u32);
        assert_eq!(cosine_similarity(&empty, &words), 0.0);
    }

    #[test]
    fn tld_stripping_only_touches_known_suffixes() {
        assert_eq!(strip_tld("example.org"), "example");
        assert_eq!(strip_tld("example.co"), "example");
        assert_eq!(strip_tld("example.co.uk"), "example.co.uk");
        assert_eq!(strip_tld("localhost"), "localhost");
    }
}
