use super::search_model::{SearchControl, SearchRequest, SearchResult};
use crate::errors::Result;

/// Trait defining the contract for symbol search operations.
pub trait SymbolSearchServiceTrait: Send + Sync {
    /// Resolves a ticker fragment to ranked symbols with their index memberships.
    fn search(&self, request: SearchRequest) -> Result<Vec<SearchResult>>;

    /// Same as [`search`](Self::search), aborting between stages once `control` trips.
    fn search_with_control(
        &self,
        request: SearchRequest,
        control: &SearchControl,
    ) -> Result<Vec<SearchResult>>;
}
