use std::path::{Path, PathBuf};

use super::ingest_model::{IngestReport, NameIngestReport};
use crate::errors::Result;
use crate::symbols::SymbolStats;

/// Trait defining the contract for loading index constituents into the store.
pub trait IngestServiceTrait: Send + Sync {
    /// Ingests CSV files and directories of CSV files.
    ///
    /// Each file's symbols become members of `index_override` when given,
    /// otherwise of the index named by the file stem (`nifty50.csv` -> `NIFTY50`).
    /// The run stops at the first file that cannot be read.
    fn ingest_paths(&self, paths: &[PathBuf], index_override: Option<&str>) -> Result<IngestReport>;

    /// Loads a company name list (a symbol/name CSV or an instrument master).
    ///
    /// Names are tagged with `source`, or with `csv:<file name>` when absent.
    /// Re-loading an unchanged file writes nothing.
    fn ingest_names(&self, path: &Path, source: Option<&str>) -> Result<NameIngestReport>;

    /// Current symbol, membership, name and per-index counts.
    fn stats(&self) -> Result<SymbolStats>;
}
