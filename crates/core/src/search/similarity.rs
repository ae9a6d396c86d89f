//! Similarity scoring used for fuzzy matches.

/// Scores how alike two normalized strings are.
///
/// Implementations must be pure: the same pair always yields the same value,
/// in `[0, 1]`, and an empty string on either side yields `0.0`.
pub trait SimilarityScorer: Send + Sync {
    fn similarity(&self, query: &str, candidate: &str) -> f64;
}

/// Normalized Damerau-Levenshtein similarity.
///
/// Adjacent transpositions (`RELAINCE` vs `RELIANCE`) count as one edit,
/// which suits typed tickers better than plain Levenshtein.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceScorer;

impl SimilarityScorer for EditDistanceScorer {
    fn similarity(&self, query: &str, candidate: &str) -> f64 {
        if query.is_empty() || candidate.is_empty() {
            return 0.0;
        }
        strsim::normalized_damerau_levenshtein(query, candidate).clamp(0.0, 1.0)
    }
}
