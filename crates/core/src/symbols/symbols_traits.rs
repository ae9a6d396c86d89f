use std::collections::BTreeMap;

use super::symbols_model::{EquityName, IndexSummary, Membership};
use crate::errors::Result;

/// Read-only queries the search engine issues against the symbol store.
///
/// Every argument is already normalized (trimmed, uppercase) and every symbol
/// returned is normalized too.
pub trait SymbolStoreTrait: Send + Sync {
    /// Returns the stored symbol equal to `query`, if any.
    fn fetch_exact(&self, query: &str) -> Result<Option<String>>;

    /// Symbols starting with `prefix`, in lexical order, at most `limit` of them.
    fn fetch_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// A bounded scan used as the universe for fuzzy scoring.
    /// Ordering must be stable across calls on unchanged data.
    fn fetch_candidate_pool(&self, limit: usize) -> Result<Vec<String>>;

    /// Index memberships for the given symbols, indices sorted lexically.
    /// Symbols without memberships may be absent from the map.
    fn fetch_memberships(&self, symbols: &[String]) -> Result<BTreeMap<String, Vec<String>>>;

    /// Company names for the given symbols. Symbols without a name are absent from the map.
    fn fetch_names(&self, symbols: &[String]) -> Result<BTreeMap<String, String>>;
}

/// Write and bookkeeping operations used by ingestion.
pub trait SymbolRepositoryTrait: Send + Sync {
    /// Inserts symbols that are not yet stored. Returns the number inserted.
    fn upsert_symbols(&self, symbols: &[String]) -> Result<usize>;

    /// Inserts memberships that are not yet stored. Returns the number inserted.
    fn upsert_memberships(&self, memberships: &[Membership]) -> Result<usize>;

    /// Inserts new names and replaces changed ones. Returns the number of rows written;
    /// a symbol whose stored name is unchanged is not rewritten.
    fn upsert_names(&self, names: &[EquityName]) -> Result<usize>;

    fn count_symbols(&self) -> Result<i64>;

    fn count_names(&self) -> Result<i64>;

    /// Counts memberships, optionally restricted to one index.
    fn count_memberships(&self, index: Option<&str>) -> Result<i64>;

    /// Every index with its member count, sorted by index name.
    fn list_indices(&self) -> Result<Vec<IndexSummary>>;
}
