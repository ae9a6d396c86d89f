//! Core error types for symdex.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for symdex.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Pipeline stage of a symbol search, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
    Normalizing,
    Narrowing,
    Classifying,
    Ranking,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStage::Normalizing => "normalizing",
            SearchStage::Narrowing => "narrowing",
            SearchStage::Classifying => "classifying",
            SearchStage::Ranking => "ranking",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the symbol search facade.
///
/// `InvalidLimit` and `InvalidMinScore` are caller mistakes and are reported
/// before the store is touched. `StoreUnavailable` aborts the whole query; no
/// partial results are ever returned alongside it.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid limit {0}: must be greater than zero")]
    InvalidLimit(i64),

    #[error("Invalid fuzzy min score {0}: must be in [0, 1)")]
    InvalidMinScore(f64),

    #[error("Symbol store unavailable during {stage}: {message}")]
    StoreUnavailable { stage: SearchStage, message: String },

    #[error("Search cancelled before {stage}")]
    Cancelled { stage: SearchStage },
}

impl SearchError {
    /// Wraps a store failure with the stage it happened in.
    pub fn store_unavailable(stage: SearchStage, err: impl fmt::Display) -> Self {
        SearchError::StoreUnavailable {
            stage,
            message: err.to_string(),
        }
    }

    /// Whether a caller may reasonably retry the same request.
    ///
    /// Only store failures qualify; the facade itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::StoreUnavailable { .. })
    }

    /// Stage the failure is attributed to, if any.
    pub fn stage(&self) -> Option<SearchStage> {
        match self {
            SearchError::InvalidLimit(_) | SearchError::InvalidMinScore(_) => {
                Some(SearchStage::Normalizing)
            }
            SearchError::StoreUnavailable { stage, .. } | SearchError::Cancelled { stage } => {
                Some(*stage)
            }
        }
    }
}

/// Errors raised while extracting symbols from source files.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No column starting with 'SYMBOL' in {path}")]
    MissingSymbolColumn { path: String },

    #[error("No symbol and company name columns in {path}")]
    MissingNameColumns { path: String },

    #[error("Unsupported source format in {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("Index name is empty for {path}")]
    EmptyIndexName { path: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Validation errors for configuration values.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfigValue { key: String, value: String },
}

impl Error {
    /// Returns the search error if this is one.
    pub fn as_search(&self) -> Option<&SearchError> {
        match self {
            Error::Search(err) => Some(err),
            _ => None,
        }
    }
}

// === From implementations for common error types ===

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Ingest(IngestError::from(err))
    }
}
