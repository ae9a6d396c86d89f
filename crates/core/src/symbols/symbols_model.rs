//! Symbol and membership domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalizes a ticker for storage and comparison: trimmed and uppercased.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalizes an index name the same way symbols are normalized.
pub fn normalize_index_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Tidies a company name for storage: surrounding and repeated whitespace removed.
pub fn normalize_company_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A `(symbol, index)` fact. The pair is unique in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub symbol: String,
    pub index: String,
}

impl Membership {
    /// Builds a membership from raw values, normalizing both sides.
    pub fn new(symbol: &str, index: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            index: normalize_index_name(index),
        }
    }
}

/// Company name recorded for a symbol, with where and when it was learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityName {
    pub symbol: String,
    pub name: String,
    pub source: Option<String>,
    pub as_of: DateTime<Utc>,
}

impl EquityName {
    pub fn new(symbol: &str, name: &str, source: Option<&str>) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            name: normalize_company_name(name),
            source: source.map(str::to_string),
            as_of: Utc::now(),
        }
    }
}

/// An index name with the number of symbols that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub index: String,
    pub members: i64,
}

/// Snapshot of what the store currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolStats {
    pub symbols: i64,
    pub memberships: i64,
    pub names: i64,
    pub indices: Vec<IndexSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize_symbol("  reliance\t"), "RELIANCE");
        assert_eq!(normalize_symbol("m&m"), "M&M");
        assert_eq!(normalize_symbol("   "), "");
    }

    #[test]
    fn test_membership_new_normalizes_both_sides() {
        let m = Membership::new(" infy ", "nifty50");
        assert_eq!(m.symbol, "INFY");
        assert_eq!(m.index, "NIFTY50");
    }

    #[test]
    fn test_equity_name_tidies_name_and_symbol() {
        let n = EquityName::new(" tcs ", "  Tata   Consultancy\tServices Ltd ", Some("csv:names.csv"));
        assert_eq!(n.symbol, "TCS");
        assert_eq!(n.name, "Tata Consultancy Services Ltd");
        assert_eq!(n.source.as_deref(), Some("csv:names.csv"));
    }
}
