use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::classifier::MatchClassifier;
use super::ranker::Ranker;
use super::search_model::{is_valid_min_score, SearchConfig, SearchControl, SearchRequest, SearchResult};
use super::search_traits::SymbolSearchServiceTrait;
use super::similarity::{EditDistanceScorer, SimilarityScorer};
use crate::errors::{Error, Result, SearchError, SearchStage};
use crate::symbols::{normalize_index_name, normalize_symbol, SymbolStoreTrait};

/// Candidates gathered while narrowing.
enum Narrowed {
    /// The query names a stored symbol; nothing else is considered.
    Exact(String),
    /// Enough prefix matches to fill the limit; fuzzy fallback skipped.
    Prefix(Vec<String>),
    /// Prefix matches merged with the bounded candidate pool, plus the
    /// company names of those candidates for fuzzy scoring.
    Pool(Vec<String>, BTreeMap<String, String>),
}

impl Narrowed {
    /// Candidate symbols, and their names when they were needed for scoring.
    fn into_parts(self) -> (Vec<String>, Option<BTreeMap<String, String>>) {
        match self {
            Narrowed::Exact(symbol) => (vec![symbol], None),
            Narrowed::Prefix(symbols) => (symbols, None),
            Narrowed::Pool(symbols, names) => (symbols, Some(names)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Narrowed::Exact(_) => "exact",
            Narrowed::Prefix(_) => "prefix",
            Narrowed::Pool(..) => "pool",
        }
    }
}

/// Service resolving ticker fragments to symbols and their indices.
///
/// Pipeline: normalize the query, narrow candidates through the store,
/// classify them, then rank and annotate with memberships and company names.
/// Each call is synchronous and owns only its transient candidates, so one
/// instance can serve concurrent callers.
pub struct SymbolSearchService {
    store: Arc<dyn SymbolStoreTrait>,
    classifier: MatchClassifier,
    ranker: Ranker,
    config: SearchConfig,
}

impl SymbolSearchService {
    /// Creates a service using the edit-distance scorer for fuzzy matches.
    pub fn new(store: Arc<dyn SymbolStoreTrait>, config: SearchConfig) -> Result<Self> {
        Self::with_scorer(store, Arc::new(EditDistanceScorer), config)
    }

    /// Creates a service with a custom similarity scorer.
    pub fn with_scorer(
        store: Arc<dyn SymbolStoreTrait>,
        scorer: Arc<dyn SimilarityScorer>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ranker: Ranker::new(store.clone()),
            classifier: MatchClassifier::new(scorer),
            store,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn resolve_limit(&self, requested: Option<i64>) -> Result<usize> {
        match requested {
            None => Ok(self.config.default_limit),
            Some(limit) if limit > 0 => {
                usize::try_from(limit).map_err(|_| SearchError::InvalidLimit(limit).into())
            }
            Some(limit) => Err(SearchError::InvalidLimit(limit).into()),
        }
    }

    fn resolve_min_score(&self, requested: Option<f64>) -> Result<f64> {
        match requested {
            None => Ok(self.config.fuzzy_min_score),
            Some(score) if is_valid_min_score(score) => Ok(score),
            Some(score) => Err(SearchError::InvalidMinScore(score).into()),
        }
    }

    fn narrow(&self, query: &str, limit: usize) -> Result<Narrowed> {
        let unavailable = |e: Error| -> Error {
            SearchError::store_unavailable(SearchStage::Narrowing, e).into()
        };

        if let Some(symbol) = self.store.fetch_exact(query).map_err(unavailable)? {
            return Ok(Narrowed::Exact(symbol));
        }

        let prefixed = self
            .store
            .fetch_by_prefix(query, limit)
            .map_err(unavailable)?;
        if prefixed.len() >= limit {
            return Ok(Narrowed::Prefix(prefixed));
        }

        let mut merged = prefixed;
        merged.extend(
            self.store
                .fetch_candidate_pool(self.config.candidate_pool_limit)
                .map_err(unavailable)?,
        );
        let names = self.store.fetch_names(&merged).map_err(unavailable)?;
        Ok(Narrowed::Pool(merged, names))
    }
}

impl SymbolSearchServiceTrait for SymbolSearchService {
    fn search(&self, request: SearchRequest) -> Result<Vec<SearchResult>> {
        self.search_with_control(request, &SearchControl::none())
    }

    fn search_with_control(
        &self,
        request: SearchRequest,
        control: &SearchControl,
    ) -> Result<Vec<SearchResult>> {
        // NORMALIZING
        let limit = self.resolve_limit(request.limit)?;
        let min_score = self.resolve_min_score(request.fuzzy_min_score)?;
        let query = normalize_symbol(&request.query);
        if query.is_empty() {
            debug!("Empty query after normalization, returning no results");
            return Ok(Vec::new());
        }
        let index_filter: Vec<String> = request
            .indices
            .iter()
            .map(|i| normalize_index_name(i))
            .filter(|i| !i.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // NARROWING
        control.check(SearchStage::Narrowing)?;
        let narrowed = self.narrow(&query, limit)?;
        let narrowed_by = narrowed.label();
        let (candidates, names) = narrowed.into_parts();
        debug!(
            "Narrowed '{}' by {} to {} candidates",
            query,
            narrowed_by,
            candidates.len()
        );

        // RANKED
        control.check(SearchStage::Classifying)?;
        let no_names = BTreeMap::new();
        let classified = self.classifier.classify(
            &query,
            &candidates,
            names.as_ref().unwrap_or(&no_names),
            min_score,
        )?;
        control.check(SearchStage::Ranking)?;
        let results = self
            .ranker
            .rank(classified, limit, &index_filter, names.as_ref())?;

        info!(
            "search query='{}' narrowed_by={} candidates={} returned={}",
            query,
            narrowed_by,
            candidates.len(),
            results.len()
        );
        Ok(results)
    }
}
