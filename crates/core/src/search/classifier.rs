//! Match classification: assigns each candidate exactly one match class and a score.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{error, trace};

use super::search_model::{output_score, MatchCandidate, MatchClass};
use super::similarity::SimilarityScorer;
use crate::constants::{EXACT_SCORE, PREFIX_SCORE};
use crate::errors::{Result, SearchError, SearchStage};
use crate::symbols::{normalize_company_name, normalize_symbol};

/// Classifies candidate symbols against a normalized query.
///
/// A candidate gets the highest class it qualifies for: exact, then prefix,
/// then fuzzy. Exact and prefix compare the symbol only. A fuzzy score is the
/// better of the symbol and company name similarities, scaled by the prefix
/// score so fuzzy scores always stay below `PREFIX_SCORE`.
#[derive(Clone)]
pub struct MatchClassifier {
    scorer: Arc<dyn SimilarityScorer>,
}

impl MatchClassifier {
    pub fn new(scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { scorer }
    }

    /// Classifies a single candidate without applying any threshold.
    pub fn classify_one(&self, query: &str, candidate: &str, name: Option<&str>) -> MatchCandidate {
        if !query.is_empty() && candidate == query {
            return MatchCandidate::new(candidate, MatchClass::Exact, EXACT_SCORE);
        }
        if !query.is_empty() && candidate.starts_with(query) {
            return MatchCandidate::new(candidate, MatchClass::Prefix, PREFIX_SCORE);
        }
        MatchCandidate::new(
            candidate,
            MatchClass::Fuzzy,
            self.fuzzy_score(query, candidate, name),
        )
    }

    fn fuzzy_score(&self, query: &str, candidate: &str, name: Option<&str>) -> f64 {
        if query.is_empty() {
            return 0.0;
        }
        let by_symbol = self.similarity(query, candidate);
        let by_name = name.map_or(0.0, |name| self.name_similarity(query, name));
        let scaled = by_symbol.max(by_name) * PREFIX_SCORE;
        scaled.min(PREFIX_SCORE - f64::EPSILON)
    }

    /// Scorer output bounded to `[0, 1]`; NaN and infinities count as no similarity.
    fn similarity(&self, query: &str, value: &str) -> f64 {
        let raw = self.scorer.similarity(query, value);
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// A name that starts with the query is a full match; otherwise it is scored
    /// like a symbol.
    fn name_similarity(&self, query: &str, name: &str) -> f64 {
        let name = normalize_company_name(name).to_uppercase();
        if name.is_empty() {
            return 0.0;
        }
        if name.starts_with(query) {
            return 1.0;
        }
        self.similarity(query, &name)
    }

    /// Classifies candidates, deduplicated by symbol, dropping fuzzy matches
    /// whose output score is below `min_score`. An empty query matches nothing,
    /// whatever the threshold.
    ///
    /// `names` maps symbols to company names used for fuzzy scoring; symbols
    /// missing from it are scored on the symbol alone.
    ///
    /// A candidate that is empty after normalization means the store handed
    /// back a broken row; the query is aborted rather than silently skipping it.
    pub fn classify(
        &self,
        query: &str,
        candidates: &[String],
        names: &BTreeMap<String, String>,
        min_score: f64,
    ) -> Result<Vec<MatchCandidate>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut unique = BTreeSet::new();
        for raw in candidates {
            let symbol = normalize_symbol(raw);
            if symbol.is_empty() {
                error!(
                    "Malformed candidate {:?} returned by symbol store for query '{}'",
                    raw, query
                );
                return Err(SearchError::store_unavailable(
                    SearchStage::Classifying,
                    format!("malformed candidate symbol {:?}", raw),
                )
                .into());
            }
            unique.insert(symbol);
        }

        let classified = unique
            .into_iter()
            .map(|symbol| {
                let name = names.get(&symbol).map(String::as_str);
                self.classify_one(query, &symbol, name)
            })
            .filter(|candidate| {
                let keep = candidate.match_class != MatchClass::Fuzzy
                    || output_score(candidate.match_class, candidate.score) >= min_score;
                if !keep {
                    trace!(
                        "Dropping {} (fuzzy {:.3} < {:.3})",
                        candidate.symbol,
                        candidate.score,
                        min_score
                    );
                }
                keep
            })
            .collect();

        Ok(classified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::similarity::EditDistanceScorer;

    struct FixedScorer(f64);

    impl SimilarityScorer for FixedScorer {
        fn similarity(&self, _query: &str, _candidate: &str) -> f64 {
            self.0
        }
    }

    fn classifier() -> MatchClassifier {
        MatchClassifier::new(Arc::new(EditDistanceScorer))
    }

    fn no_names() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn symbols(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let c = classifier().classify_one("INFY", "INFY", None);
        assert_eq!(c.match_class, MatchClass::Exact);
        assert_eq!(c.score, 1.0);
    }

    #[test]
    fn test_prefix_scores_fixed_value() {
        let c = classifier().classify_one("RELI", "RELIANCE", None);
        assert_eq!(c.match_class, MatchClass::Prefix);
        assert_eq!(c.score, 0.92);
    }

    #[test]
    fn test_typo_is_fuzzy_between_threshold_and_prefix() {
        let c = classifier().classify_one("RELAINCE", "RELIANCE", None);
        assert_eq!(c.match_class, MatchClass::Fuzzy);
        assert!(c.score > 0.60 && c.score < 0.92, "score was {}", c.score);
    }

    #[test]
    fn test_fuzzy_never_reaches_prefix_score() {
        let c = MatchClassifier::new(Arc::new(FixedScorer(1.0))).classify_one("ABC", "XYZ", None);
        assert_eq!(c.match_class, MatchClass::Fuzzy);
        assert!(c.score < PREFIX_SCORE);
        let c = MatchClassifier::new(Arc::new(FixedScorer(0.999))).classify_one("ABC", "XYZ", None);
        assert!(c.score < PREFIX_SCORE);
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        let out = classifier()
            .classify("", &symbols(&["INFY", "TCS"]), &no_names(), 0.0)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(classifier().classify_one("", "INFY", None).score, 0.0);

        let out = classifier()
            .classify("", &symbols(&["INFY", "TCS"]), &no_names(), 0.60)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_candidates_below_threshold_are_dropped() {
        let out = MatchClassifier::new(Arc::new(FixedScorer(0.5)))
            .classify("TCS", &symbols(&["TCS", "TCSX", "WIPRO"]), &no_names(), 0.60)
            .unwrap();
        let names: Vec<_> = out.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(names, vec!["TCS", "TCSX"]);
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let out = classifier()
            .classify("RELI", &symbols(&["RELIANCE", "reliance", " RELIANCE "]), &no_names(), 0.60)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].match_class, MatchClass::Prefix);
    }

    #[test]
    fn test_malformed_candidate_aborts() {
        let err = classifier()
            .classify("INFY", &symbols(&["INFY", "  "]), &no_names(), 0.60)
            .unwrap_err();
        match err.as_search() {
            Some(SearchError::StoreUnavailable { stage, .. }) => {
                assert_eq!(*stage, SearchStage::Classifying)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_threshold_applies_to_returned_score() {
        // ABC vs ABD: 2/3 similarity, 0.61333 scaled, 0.613 once rounded.
        let out = classifier()
            .classify("ABC", &symbols(&["ABD"]), &no_names(), 0.6133)
            .unwrap();
        assert!(out.is_empty());

        let out = classifier()
            .classify("ABC", &symbols(&["ABD"]), &no_names(), 0.613)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(output_score(out[0].match_class, out[0].score), 0.613);
    }

    #[test]
    fn test_threshold_near_prefix_score_uses_pinned_value() {
        let out = MatchClassifier::new(Arc::new(FixedScorer(0.9999)))
            .classify("ABC", &symbols(&["XYZ"]), &no_names(), 0.9195)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_non_finite_similarity_scores_zero() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let c = MatchClassifier::new(Arc::new(FixedScorer(value))).classify_one("ABC", "XYZ", None);
            assert_eq!(c.match_class, MatchClass::Fuzzy);
            assert_eq!(c.score, 0.0);
        }
        let out = MatchClassifier::new(Arc::new(FixedScorer(f64::NAN)))
            .classify("ABC", &symbols(&["XYZ"]), &no_names(), 0.60)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_company_name_lifts_fuzzy_score() {
        let names = BTreeMap::from([("INFY".to_string(), "Infosys  Limited".to_string())]);

        let without = classifier().classify("INFOSYS", &symbols(&["INFY"]), &no_names(), 0.60).unwrap();
        assert!(without.is_empty());

        let with = classifier().classify("INFOSYS", &symbols(&["INFY"]), &names, 0.60).unwrap();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].match_class, MatchClass::Fuzzy);
        assert!(with[0].score < PREFIX_SCORE);
        assert_eq!(output_score(with[0].match_class, with[0].score), 0.919);
    }

    #[test]
    fn test_company_name_never_makes_exact_or_prefix() {
        let c = classifier().classify_one("RELIANCE", "RIL", Some("Reliance Industries"));
        assert_eq!(c.match_class, MatchClass::Fuzzy);

        let typo = classifier().classify_one("RELAINCE IND", "RIL", Some("Reliance Industries"));
        assert_eq!(typo.match_class, MatchClass::Fuzzy);
        assert!(typo.score > 0.0 && typo.score < PREFIX_SCORE);
    }
}
