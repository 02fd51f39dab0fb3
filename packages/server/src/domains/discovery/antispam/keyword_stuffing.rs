//! Keyword stuffing detection: spam pages repeat the same few keywords to
//! game relevance ranking.

/// Flag text where fewer than half the whitespace tokens are distinct.
/// Blank input never flags.
pub(crate) fn detect(text: &str) -> bool {
    let tokens: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();

    if tokens.is_empty() {
        return false;
    }

    let distinct: std::collections::HashSet<&String> = tokens.iter().collect();
    let ratio = distinct.len() as f64 / tokens.len() as f64;
    ratio < 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_never_flags() {
        assert!(!detect(""));
        assert!(!detect("   "));
    }

    #[test]
    fn repeated_keywords_flag() {
        // 9 tokens, 4 distinct -> 4/9 < 0.5
        assert!(detect(
            "grants scholarships funding grants scholarships grants funding education grants"
        ));
    }

    #[test]
    fn natural_sentence_passes() {
        assert!(!detect(
            "Apply for the best scholarships and grants available to students this year"
        ));
    }

    #[test]
    fn ratio_boundary_is_exclusive() {
        // 4 tokens, 2 distinct -> exactly 0.5, not flagged
        assert!(!detect("grants funding grants funding"));
        // 5 tokens, 2 distinct -> 0.4, flagged
        assert!(detect("grants funding grants funding grants"));
    }

    #[test]
    fn case_is_ignored() {
        assert!(detect("Grants GRANTS grants Grants funding"));
    }
}
