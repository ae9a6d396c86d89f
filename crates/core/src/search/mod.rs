//! Search module - match classification, ranking and the query facade.

mod classifier;
mod ranker;
mod search_model;
mod search_service;
mod search_traits;
mod similarity;


// Re-export the public interface
pub use classifier::MatchClassifier;
pub use ranker::{sort_candidates, Ranker};
pub use search_model::{
    output_score, round_score, MatchCandidate, MatchClass, SearchConfig, SearchControl, SearchRequest,
    SearchResult,
};
pub use search_service::SymbolSearchService;
pub use search_traits::SymbolSearchServiceTrait;
pub use similarity::{EditDistanceScorer, SimilarityScorer};
