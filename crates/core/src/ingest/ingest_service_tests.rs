use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tempfile::tempdir;

use super::*;
use crate::errors::{Error, IngestError, Result};
use crate::symbols::{EquityName, IndexSummary, Membership, SymbolRepositoryTrait};

#[derive(Default)]
struct MockSymbolRepository {
    symbols: RwLock<BTreeSet<String>>,
    memberships: RwLock<BTreeSet<Membership>>,
    names: RwLock<BTreeMap<String, EquityName>>,
}

impl SymbolRepositoryTrait for MockSymbolRepository {
    fn upsert_symbols(&self, symbols: &[String]) -> Result<usize> {
        let mut stored = self.symbols.write().unwrap();
        Ok(symbols.iter().filter(|s| stored.insert((*s).clone())).count())
    }

    fn upsert_memberships(&self, memberships: &[Membership]) -> Result<usize> {
        let mut stored = self.memberships.write().unwrap();
        Ok(memberships
            .iter()
            .filter(|m| stored.insert((*m).clone()))
            .count())
    }

    fn upsert_names(&self, names: &[EquityName]) -> Result<usize> {
        let mut stored = self.names.write().unwrap();
        let mut written = 0;
        for name in names {
            if stored.get(&name.symbol).is_some_and(|n| n.name == name.name) {
                continue;
            }
            stored.insert(name.symbol.clone(), name.clone());
            written += 1;
        }
        Ok(written)
    }

    fn count_symbols(&self) -> Result<i64> {
        Ok(self.symbols.read().unwrap().len() as i64)
    }

    fn count_names(&self) -> Result<i64> {
        Ok(self.names.read().unwrap().len() as i64)
    }

    fn count_memberships(&self, index: Option<&str>) -> Result<i64> {
        let stored = self.memberships.read().unwrap();
        Ok(stored
            .iter()
            .filter(|m| index.is_none() || index == Some(m.index.as_str()))
            .count() as i64)
    }

    fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for m in self.memberships.read().unwrap().iter() {
            *counts.entry(m.index.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(index, members)| IndexSummary { index, members })
            .collect())
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn service() -> (IngestService, Arc<MockSymbolRepository>) {
    let repo = Arc::new(MockSymbolRepository::default());
    (IngestService::new(repo.clone()), repo)
}

const NIFTY50: &str = "SYMBOL \n,OPEN \nNIFTY 50,24802.60\nTCS,000\nRELIANCE,000\nINFY,000\n";

#[test]
fn test_index_name_comes_from_file_stem() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "nifty50.csv", NIFTY50);
    let (svc, repo) = service();

    let report = svc.ingest_paths(&[path], None).unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].index, "NIFTY50");
    assert_eq!(report.files[0].symbols_found, 3);
    assert_eq!(report.symbols_inserted, 3);
    assert_eq!(report.memberships_inserted, 3);
    assert_eq!(repo.count_memberships(Some("NIFTY50")).unwrap(), 3);
}

#[test]
fn test_reingest_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "nifty50.csv", NIFTY50);
    let (svc, _repo) = service();

    let first = svc.ingest_paths(&[path.clone()], None).unwrap();
    let second = svc.ingest_paths(&[path], None).unwrap();

    assert_eq!(second.symbols_inserted, 0);
    assert_eq!(second.memberships_inserted, 0);
    assert_eq!(first.total_symbols, second.total_symbols);
    assert_eq!(first.total_memberships, second.total_memberships);
}

#[test]
fn test_index_override_applies_to_every_file() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "SYMBOL\nTCS\n");
    let b = write(dir.path(), "b.csv", "SYMBOL\nWIPRO\n");
    let (svc, repo) = service();

    svc.ingest_paths(&[a, b], Some(" niftyit ")).unwrap();

    assert_eq!(
        repo.list_indices().unwrap(),
        vec![IndexSummary {
            index: "NIFTYIT".to_string(),
            members: 2
        }]
    );
}

#[test]
fn test_directory_is_expanded_to_csv_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nifty50.csv", "SYMBOL\nTCS\nINFY\n");
    write(dir.path(), "niftyit.CSV", "SYMBOL\nINFY\nWIPRO\n");
    write(dir.path(), "notes.txt", "SYMBOL\nIGNORED\n");
    let (svc, repo) = service();

    let report = svc.ingest_paths(&[dir.path().to_path_buf()], None).unwrap();

    let indices: Vec<_> = report.files.iter().map(|f| f.index.as_str()).collect();
    assert_eq!(indices, vec!["NIFTY50", "NIFTYIT"]);
    assert_eq!(report.symbols_inserted, 3);
    assert_eq!(report.memberships_inserted, 4);

    let stats = svc.stats().unwrap();
    assert_eq!(stats.symbols, 3);
    assert_eq!(stats.memberships, 4);
    assert_eq!(repo.count_memberships(Some("NIFTYIT")).unwrap(), 2);
}

#[test]
fn test_missing_path_is_reported() {
    let (svc, _repo) = service();
    let err = svc
        .ingest_paths(&[PathBuf::from("/no/such/dir/nifty50.csv")], None)
        .unwrap_err();
    assert!(matches!(err, Error::Ingest(IngestError::PathNotFound(_))));
}

#[test]
fn test_blank_index_override_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "nifty50.csv", NIFTY50);
    let (svc, repo) = service();

    let err = svc.ingest_paths(&[path], Some("   ")).unwrap_err();
    assert!(matches!(
        err,
        Error::Ingest(IngestError::EmptyIndexName { .. })
    ));
    assert_eq!(repo.count_symbols().unwrap(), 0);
}

#[test]
fn test_file_without_symbol_column_stops_the_run() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "bad.csv", "NAME,OPEN\nFoo,1\n");
    let (svc, _repo) = service();

    let err = svc.ingest_paths(&[path], None).unwrap_err();
    assert!(err.to_string().contains("No column starting with 'SYMBOL'"));
}

#[test]
fn test_index_name_from_path() {
    assert_eq!(
        index_name_from_path(Path::new("data/nifty_next50.csv")).as_deref(),
        Some("NIFTY_NEXT50")
    );
    assert_eq!(index_name_from_path(Path::new("/")), None);
}

#[test]
fn test_saved_html_export_is_ingested() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "niftyit.csv",
        include_str!("../../tests/fixtures/niftyit_saved.csv"),
    );
    let (svc, repo) = service();

    let report = svc.ingest_paths(&[path], None).unwrap();

    assert_eq!(report.files[0].index, "NIFTYIT");
    assert_eq!(report.files[0].symbols_found, 5);
    assert_eq!(repo.count_memberships(Some("NIFTYIT")).unwrap(), 5);
    assert!(repo.symbols.read().unwrap().contains("M&M"));
}

const SCRIP_MASTER: &str = "SEM_INSTRUMENT_NAME,SEM_TRADING_SYMBOL,SEM_SERIES,SM_SYMBOL_NAME\n\
                            EQUITY,TCS-EQ,EQ,TATA CONSULTANCY SERV LT\n\
                            EQUITY,INFY,EQ,INFOSYS LIMITED\n\
                            OPTSTK,INFY-Jan2025-1900-CE,,INFOSYS LIMITED\n";

#[test]
fn test_name_list_is_loaded_with_default_source() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "api-scrip-master.csv", SCRIP_MASTER);
    let (svc, repo) = service();

    let report = svc.ingest_names(&path, None).unwrap();

    assert_eq!(report.source, "csv:api-scrip-master.csv");
    assert_eq!(report.names_found, 2);
    assert_eq!(report.names_written, 2);
    assert_eq!(report.total_names, 2);
    let stored = repo.names.read().unwrap();
    assert_eq!(stored["TCS"].name, "TATA CONSULTANCY SERV LT");
    assert_eq!(stored["TCS"].source.as_deref(), Some("csv:api-scrip-master.csv"));
}

#[test]
fn test_reloading_names_only_writes_changes() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "names.csv", "SYMBOL,NAME\nTCS,Tata Consultancy\nINFY,Infosys\n");
    let (svc, _repo) = service();

    svc.ingest_names(&first, Some("manual")).unwrap();
    let again = svc.ingest_names(&first, Some("manual")).unwrap();
    assert_eq!(again.names_written, 0);

    let changed = write(
        dir.path(),
        "names_v2.csv",
        "SYMBOL,NAME\nTCS,Tata Consultancy Services\nINFY,Infosys\n",
    );
    let report = svc.ingest_names(&changed, Some("  ")).unwrap();
    assert_eq!(report.names_written, 1);
    assert_eq!(report.total_names, 2);
    assert_eq!(report.source, "csv:names_v2.csv");

    assert_eq!(svc.stats().unwrap().names, 2);
}

#[test]
fn test_name_list_without_name_column_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "nifty50.csv", NIFTY50);
    let (svc, _repo) = service();

    let err = svc.ingest_names(&path, None).unwrap_err();
    assert!(matches!(
        err,
        Error::Ingest(IngestError::MissingNameColumns { .. })
    ));
}
