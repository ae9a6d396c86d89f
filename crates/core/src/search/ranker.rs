//! Ranking: orders classified candidates, truncates them and attaches index memberships.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;

use super::search_model::{MatchCandidate, SearchResult};
use crate::errors::{Result, SearchError, SearchStage};
use crate::symbols::SymbolStoreTrait;

/// Sorts candidates by class precedence, score descending, then symbol ascending.
pub fn sort_candidates(candidates: &mut [MatchCandidate]) {
    candidates.sort_by(|a, b| a.rank_cmp(b));
}

/// Turns classified candidates into the final, annotated result list.
pub struct Ranker {
    store: Arc<dyn SymbolStoreTrait>,
}

impl Ranker {
    pub fn new(store: Arc<dyn SymbolStoreTrait>) -> Self {
        Self { store }
    }

    /// Orders `candidates`, keeps the top `limit`, and attaches memberships and names.
    ///
    /// With a non-empty `index_filter`, only candidates belonging to at least
    /// one of those indices are kept, and the filter runs before truncation.
    /// `known_names` holds names already fetched for every candidate; when it
    /// is `None` the names of the surviving results are fetched here.
    pub fn rank(
        &self,
        mut candidates: Vec<MatchCandidate>,
        limit: usize,
        index_filter: &[String],
        known_names: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<SearchResult>> {
        sort_candidates(&mut candidates);

        let memberships = if index_filter.is_empty() {
            candidates.truncate(limit);
            self.memberships_for(&candidates)?
        } else {
            let memberships = self.memberships_for(&candidates)?;
            let wanted: BTreeSet<&str> = index_filter.iter().map(String::as_str).collect();
            let before = candidates.len();
            candidates.retain(|candidate| {
                memberships
                    .get(&candidate.symbol)
                    .is_some_and(|indices| indices.iter().any(|i| wanted.contains(i.as_str())))
            });
            debug!(
                "Index filter {:?} kept {} of {} candidates",
                index_filter,
                candidates.len(),
                before
            );
            candidates.truncate(limit);
            memberships
        };

        let names = match known_names {
            Some(names) => names.clone(),
            None => self.names_for(&candidates)?,
        };
        Ok(attach(candidates, memberships, names))
    }

    fn memberships_for(
        &self,
        candidates: &[MatchCandidate],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        if candidates.is_empty() {
            return Ok(BTreeMap::new());
        }
        let symbols: Vec<String> = candidates.iter().map(|c| c.symbol.clone()).collect();
        self.store
            .fetch_memberships(&symbols)
            .map_err(|e| SearchError::store_unavailable(SearchStage::Ranking, e).into())
    }

    fn names_for(&self, candidates: &[MatchCandidate]) -> Result<BTreeMap<String, String>> {
        if candidates.is_empty() {
            return Ok(BTreeMap::new());
        }
        let symbols: Vec<String> = candidates.iter().map(|c| c.symbol.clone()).collect();
        self.store
            .fetch_names(&symbols)
            .map_err(|e| SearchError::store_unavailable(SearchStage::Ranking, e).into())
    }
}

fn attach(
    candidates: Vec<MatchCandidate>,
    mut memberships: BTreeMap<String, Vec<String>>,
    mut names: BTreeMap<String, String>,
) -> Vec<SearchResult> {
    candidates
        .into_iter()
        .map(|candidate| {
            let indices = memberships.remove(&candidate.symbol).unwrap_or_default();
            let name = names.remove(&candidate.symbol).unwrap_or_default();
            SearchResult::from_candidate(candidate, indices).with_name(name)
        })
        .collect()
}
