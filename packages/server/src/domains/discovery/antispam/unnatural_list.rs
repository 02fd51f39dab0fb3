//! Unnatural keyword list detection: SEO spam strings keywords together
//! without the connective words every natural sentence has.

use std::collections::HashSet;

/// Function words that appear in essentially all natural English prose.
const STOP_WORDS: [&str; 27] = [
    "the", "a", "an", "of", "for", "to", "in", "with", "on", "at", "by", "from", "as", "is",
    "are", "was", "were", "be", "been", "and", "or", "but", "if", "this", "that", "these",
    "those",
];

/// Flag text containing fewer than 2 distinct stop-words as whole words.
/// Blank input never flags.
pub(crate) fn detect(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let lowered = text.to_lowercase();
    let words: HashSet<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let stop_word_hits = STOP_WORDS.iter().filter(|sw| words.contains(**sw)).count();
    stop_word_hits < 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_never_flags() {
        assert!(!detect(""));
        assert!(!detect("  \t "));
    }

    #[test]
    fn keyword_list_without_stop_words_flags() {
        assert!(detect("grants scholarships funding aid opportunities"));
    }

    #[test]
    fn natural_sentence_passes() {
        // "for" and "the" are two distinct stop-words
        assert!(!detect("Apply for the best scholarships and grants"));
    }

    #[test]
    fn repeated_single_stop_word_still_flags() {
        // "the" appears twice but only counts once
        assert!(detect("the grants the scholarships funding"));
    }

    #[test]
    fn stop_words_match_whole_words_only() {
        // "this" inside "thistle" and "at" inside "national" must not count
        assert!(detect("thistle national grants funding scholarships"));
    }
}
