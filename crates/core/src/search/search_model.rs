//! Search domain models: match classes, candidates, results, requests and configuration.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CANDIDATE_POOL_LIMIT, DEFAULT_FUZZY_MIN_SCORE, DEFAULT_SEARCH_LIMIT, PREFIX_SCORE,
    SCORE_DECIMAL_PLACES,
};
use crate::errors::{Result, SearchError, SearchStage, ValidationError};

/// How a candidate symbol matched the query.
///
/// Variants are declared in precedence order, so the derived `Ord` ranks
/// `Exact` before `Prefix` before `Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchClass {
    Exact,
    Prefix,
    Fuzzy,
}

impl MatchClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchClass::Exact => "exact",
            MatchClass::Prefix => "prefix",
            MatchClass::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified candidate, alive for the duration of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub symbol: String,
    pub match_class: MatchClass,
    pub score: f64,
}

impl MatchCandidate {
    pub fn new(symbol: impl Into<String>, match_class: MatchClass, score: f64) -> Self {
        Self {
            symbol: symbol.into(),
            match_class,
            score,
        }
    }

    /// Result ordering: class precedence, then score descending, then symbol ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.match_class
            .cmp(&other.match_class)
            .then_with(|| other.score.total_cmp(&self.score))
            .then_with(|| self.symbol.cmp(&other.symbol))
    }
}

/// One resolved symbol with the indices it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    /// Company name, when one is recorded for the symbol.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub indices: Vec<String>,
    pub score: f64,
    pub reason: MatchClass,
}

impl SearchResult {
    /// Builds a result from a ranked candidate. Indices are sorted and deduplicated.
    pub fn from_candidate(candidate: MatchCandidate, mut indices: Vec<String>) -> Self {
        indices.sort();
        indices.dedup();
        Self {
            score: output_score(candidate.match_class, candidate.score),
            symbol: candidate.symbol,
            name: String::new(),
            indices,
            reason: candidate.match_class,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Rounds a score for output. Ordering is always decided on the unrounded value.
pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMAL_PLACES);
    (score * factor).round() / factor
}

/// The score a caller sees for a candidate of `match_class`.
///
/// Scores are rounded, and a fuzzy score that would round up to the prefix
/// score is pinned one output step below it. Fuzzy thresholds are applied to
/// this value, so no returned fuzzy score is below the caller's minimum.
pub fn output_score(match_class: MatchClass, score: f64) -> f64 {
    let rounded = round_score(score);
    if match_class == MatchClass::Fuzzy && rounded >= PREFIX_SCORE {
        return round_score(PREFIX_SCORE - 10f64.powi(-SCORE_DECIMAL_PLACES));
    }
    rounded
}

/// Caller parameters for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    /// Maximum number of results; falls back to the configured default.
    pub limit: Option<i64>,
    /// Fuzzy threshold in `[0, 1)`; falls back to the configured default.
    pub fuzzy_min_score: Option<f64>,
    /// Restrict results to members of any of these indices.
    #[serde(default)]
    pub indices: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.fuzzy_min_score = Some(min_score);
        self
    }

    pub fn with_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = indices.into_iter().map(Into::into).collect();
        self
    }
}

/// Tunables for the search facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub default_limit: usize,
    pub fuzzy_min_score: f64,
    /// Upper bound on symbols scanned when fuzzy fallback is needed.
    pub candidate_pool_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            fuzzy_min_score: DEFAULT_FUZZY_MIN_SCORE,
            candidate_pool_limit: DEFAULT_CANDIDATE_POOL_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(invalid_config("default_limit", self.default_limit));
        }
        if !is_valid_min_score(self.fuzzy_min_score) {
            return Err(invalid_config("fuzzy_min_score", self.fuzzy_min_score));
        }
        if self.candidate_pool_limit == 0 {
            return Err(invalid_config(
                "candidate_pool_limit",
                self.candidate_pool_limit,
            ));
        }
        Ok(())
    }
}

fn invalid_config(key: &str, value: impl fmt::Display) -> crate::errors::Error {
    ValidationError::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

pub(crate) fn is_valid_min_score(score: f64) -> bool {
    score.is_finite() && (0.0..1.0).contains(&score)
}

/// External deadline / cancellation signal for one search.
///
/// Checked between pipeline stages only, never in the middle of a store fetch.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl SearchControl {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        let flagged = self
            .cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::SeqCst));
        let expired = self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        flagged || expired
    }

    /// Fails with `Cancelled` if the search must not enter `stage`.
    pub fn check(&self, stage: SearchStage) -> Result<()> {
        if self.is_cancelled() {
            return Err(SearchError::Cancelled { stage }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_match_class_precedence_order() {
        assert!(MatchClass::Exact < MatchClass::Prefix);
        assert!(MatchClass::Prefix < MatchClass::Fuzzy);
    }

    #[test]
    fn test_rank_cmp_breaks_ties_by_symbol() {
        let a = MatchCandidate::new("ABB", MatchClass::Fuzzy, 0.7);
        let b = MatchCandidate::new("ACC", MatchClass::Fuzzy, 0.7);
        let c = MatchCandidate::new("ZEEL", MatchClass::Fuzzy, 0.8);
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
        assert_eq!(c.rank_cmp(&a), Ordering::Less);
    }

    #[test]
    fn test_search_result_serializes_in_wire_shape() {
        let result = SearchResult::from_candidate(
            MatchCandidate::new("RELIANCE", MatchClass::Exact, 1.0),
            vec!["NIFTY50".to_string()],
        );
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"symbol":"RELIANCE","indices":["NIFTY50"],"score":1.0,"reason":"exact"}"#
        );
    }

    #[test]
    fn test_from_candidate_sorts_indices_and_rounds_score() {
        let result = SearchResult::from_candidate(
            MatchCandidate::new("INFY", MatchClass::Fuzzy, 0.805_000_000_000_1),
            vec![
                "NIFTY50".to_string(),
                "NIFTY100".to_string(),
                "NIFTY50".to_string(),
            ],
        );
        assert_eq!(result.indices, vec!["NIFTY100", "NIFTY50"]);
        assert_eq!(result.score, 0.805);
    }

    #[test]
    fn test_fuzzy_output_stays_below_prefix_after_rounding() {
        let result = SearchResult::from_candidate(
            MatchCandidate::new("TCSX", MatchClass::Fuzzy, PREFIX_SCORE - f64::EPSILON),
            Vec::new(),
        );
        assert_eq!(result.score, 0.919);
    }

    #[test]
    fn test_output_score_matches_returned_score() {
        assert_eq!(output_score(MatchClass::Fuzzy, 0.613_333), 0.613);
        assert_eq!(output_score(MatchClass::Fuzzy, 0.9199), 0.919);
        assert_eq!(output_score(MatchClass::Prefix, PREFIX_SCORE), 0.92);
        let result = SearchResult::from_candidate(
            MatchCandidate::new("ABD", MatchClass::Fuzzy, 0.613_333),
            Vec::new(),
        );
        assert_eq!(result.score, output_score(MatchClass::Fuzzy, 0.613_333));
    }

    #[test]
    fn test_name_is_serialized_only_when_known() {
        let result = SearchResult::from_candidate(
            MatchCandidate::new("TCS", MatchClass::Exact, 1.0),
            vec!["NIFTY50".to_string()],
        )
        .with_name("Tata Consultancy Services Ltd");
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"symbol":"TCS","name":"Tata Consultancy Services Ltd","indices":["NIFTY50"],"score":1.0,"reason":"exact"}"#
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SearchConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.fuzzy_min_score, 0.60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_out_of_range_min_score() {
        let config = SearchConfig {
            fuzzy_min_score: 1.0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_control_trips_on_flag_and_deadline() {
        assert!(!SearchControl::none().is_cancelled());

        let flag = Arc::new(AtomicBool::new(false));
        let control = SearchControl::none().with_cancel_flag(flag.clone());
        assert!(control.check(SearchStage::Narrowing).is_ok());
        flag.store(true, AtomicOrdering::SeqCst);
        assert!(control.check(SearchStage::Narrowing).is_err());

        let past = Instant::now()
            .checked_sub(Duration::from_millis(1))
            .unwrap_or_else(Instant::now);
        let expired = SearchControl::none().with_deadline(past);
        assert!(expired.is_cancelled());
    }
}
