//! Fuzzy matching for resource names
//!
//! Used only to make "could not resolve" errors more helpful: when a
//! requested workload does not exist, the closest-named deployments and
//! pods are offered as suggestions. Resolution itself never guesses.

use nucleo::{Config, Matcher, Utf32Str};

/// Fuzzy matcher for resource names
pub struct FuzzyMatcher {
    matcher: Matcher,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    /// Create a new fuzzy matcher
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    /// Match a pattern against a list of candidates
    /// Returns sorted matches with scores (highest first)
    pub fn match_candidates<'a>(
        &mut self,
        pattern: &str,
        candidates: &'a [String],
    ) -> Vec<(&'a str, u16)> {
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut pattern_buf = Vec::new();
        let pattern_utf32 = Utf32Str::new(pattern, &mut pattern_buf);

        let mut matches: Vec<(&str, u16)> = candidates
            .iter()
            .filter_map(|candidate| {
                let mut candidate_buf = Vec::new();
                let candidate_utf32 = Utf32Str::new(candidate, &mut candidate_buf);
                self.matcher
                    .fuzzy_match(candidate_utf32, pattern_utf32)
                    .map(|score| (candidate.as_str(), score))
            })
            .collect();

        // Sort by score descending
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        matches
    }
}

/// The best `limit` candidate names for a pattern, best first
pub fn suggestions(pattern: &str, candidates: &[String], limit: usize) -> Vec<String> {
    let mut matcher = FuzzyMatcher::new();
    matcher
        .match_candidates(pattern, candidates)
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_string())
        .collect()
}
