/// Score assigned to a candidate equal to the query
pub const EXACT_SCORE: f64 = 1.0;

/// Score assigned to a candidate that starts with the query
pub const PREFIX_SCORE: f64 = 0.92;

/// Default number of results returned by a search
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Default minimum similarity for a fuzzy candidate to be kept
pub const DEFAULT_FUZZY_MIN_SCORE: f64 = 0.60;

/// Default upper bound on symbols scanned for fuzzy scoring
pub const DEFAULT_CANDIDATE_POOL_LIMIT: usize = 5000;

/// Decimal places kept on scores in search output
pub const SCORE_DECIMAL_PLACES: i32 = 3;

/// Tickers accepted by ingestion: letters, digits and `& . -`
pub const TICKER_PATTERN: &str = r"^[A-Z0-9&.\-]+$";
