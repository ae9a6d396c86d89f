use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of ingesting one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIngestReport {
    pub path: String,
    pub index: String,
    /// Distinct tickers found in the file.
    pub symbols_found: usize,
    pub symbols_inserted: usize,
    pub memberships_inserted: usize,
}

/// Outcome of an ingestion run across one or more files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub files: Vec<FileIngestReport>,
    pub symbols_inserted: usize,
    pub memberships_inserted: usize,
    pub total_symbols: i64,
    pub total_memberships: i64,
    pub completed_at: DateTime<Utc>,
}

impl IngestReport {
    pub(crate) fn new(files: Vec<FileIngestReport>, total_symbols: i64, total_memberships: i64) -> Self {
        Self {
            symbols_inserted: files.iter().map(|f| f.symbols_inserted).sum(),
            memberships_inserted: files.iter().map(|f| f.memberships_inserted).sum(),
            files,
            total_symbols,
            total_memberships,
            completed_at: Utc::now(),
        }
    }
}

/// Outcome of loading one company name list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIngestReport {
    pub path: String,
    pub source: String,
    /// Distinct symbols with a name found in the file.
    pub names_found: usize,
    /// Names inserted or replaced; unchanged names are not counted.
    pub names_written: usize,
    pub total_names: i64,
    pub completed_at: DateTime<Utc>,
}
