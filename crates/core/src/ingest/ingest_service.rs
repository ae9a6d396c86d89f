use chrono::Utc;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::extract::{extract_names, extract_symbols};
use super::ingest_model::{FileIngestReport, IngestReport, NameIngestReport};
use super::ingest_traits::IngestServiceTrait;
use crate::errors::{IngestError, Result};
use crate::symbols::{
    normalize_index_name, EquityName, Membership, SymbolRepositoryTrait, SymbolStats,
};

/// Derives the index name from a file stem: `nifty_50.csv` -> `NIFTY_50`.
pub fn index_name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = normalize_index_name(stem);
    (!name.is_empty()).then_some(name)
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Expands directories into their CSV files, sorted by path.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(IngestError::from)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_csv(p))
                .collect();
            entries.sort();
            debug!("Found {} CSV files in {}", entries.len(), path.display());
            files.extend(entries);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(IngestError::PathNotFound(path.display().to_string()).into());
        }
    }
    Ok(files)
}

/// Default source tag for a name list: `csv:<file name>`.
fn default_name_source(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("csv:{file}")
}

/// Service loading index constituent files and company names into the symbol repository.
pub struct IngestService {
    repository: Arc<dyn SymbolRepositoryTrait>,
}

impl IngestService {
    pub fn new(repository: Arc<dyn SymbolRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn ingest_file(&self, path: &Path, index_override: Option<&str>) -> Result<FileIngestReport> {
        let source = path.display().to_string();
        let index = match index_override {
            Some(name) => Some(normalize_index_name(name)).filter(|n| !n.is_empty()),
            None => index_name_from_path(path),
        }
        .ok_or_else(|| IngestError::EmptyIndexName {
            path: source.clone(),
        })?;

        let symbols = extract_symbols(path)?;
        let memberships: Vec<Membership> = symbols
            .iter()
            .map(|symbol| Membership::new(symbol, &index))
            .collect();

        let symbols_inserted = self.repository.upsert_symbols(&symbols)?;
        let memberships_inserted = self.repository.upsert_memberships(&memberships)?;

        info!(
            "Ingested {}: index={} found={} new_symbols={} new_memberships={}",
            source,
            index,
            symbols.len(),
            symbols_inserted,
            memberships_inserted
        );

        Ok(FileIngestReport {
            path: source,
            index,
            symbols_found: symbols.len(),
            symbols_inserted,
            memberships_inserted,
        })
    }
}

impl IngestServiceTrait for IngestService {
    fn ingest_paths(&self, paths: &[PathBuf], index_override: Option<&str>) -> Result<IngestReport> {
        let files = expand_paths(paths)?;
        let reports = files
            .iter()
            .map(|file| self.ingest_file(file, index_override))
            .collect::<Result<Vec<_>>>()?;

        let report = IngestReport::new(
            reports,
            self.repository.count_symbols()?,
            self.repository.count_memberships(None)?,
        );
        info!(
            "Ingestion complete: files={} new_symbols={} new_memberships={} total_symbols={}",
            report.files.len(),
            report.symbols_inserted,
            report.memberships_inserted,
            report.total_symbols
        );
        Ok(report)
    }

    fn ingest_names(&self, path: &Path, source: Option<&str>) -> Result<NameIngestReport> {
        let source = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| default_name_source(path), str::to_string);

        let pairs = extract_names(path)?;
        let names: Vec<EquityName> = pairs
            .iter()
            .map(|(symbol, name)| EquityName::new(symbol, name, Some(&source)))
            .collect();
        let names_written = self.repository.upsert_names(&names)?;
        let total_names = self.repository.count_names()?;

        info!(
            "Ingested names from {}: source={} found={} written={} total={}",
            path.display(),
            source,
            names.len(),
            names_written,
            total_names
        );

        Ok(NameIngestReport {
            path: path.display().to_string(),
            source,
            names_found: names.len(),
            names_written,
            total_names,
            completed_at: Utc::now(),
        })
    }

    fn stats(&self) -> Result<SymbolStats> {
        Ok(SymbolStats {
            symbols: self.repository.count_symbols()?,
            memberships: self.repository.count_memberships(None)?,
            names: self.repository.count_names()?,
            indices: self.repository.list_indices()?,
        })
    }
}
