//! Ingestion of index constituent exports and company name lists into the symbol store.

mod extract;
mod ingest_model;
mod ingest_service;
mod ingest_traits;

#[cfg(test)]
mod ingest_service_tests;

pub use extract::{
    extract_names, extract_names_from_str, extract_symbols, extract_symbols_from_str, is_ticker,
    looks_like_html, merge_split_header, parse_html_table, strip_series_suffix, HtmlTable,
};
pub use ingest_model::{FileIngestReport, IngestReport, NameIngestReport};
pub use ingest_service::{index_name_from_path, IngestService};
pub use ingest_traits::IngestServiceTrait;
