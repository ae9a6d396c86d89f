//! Symdex Core - Symbol resolution and ranking.
//!
//! This crate resolves free-form ticker fragments to equity symbols and the
//! market indices they belong to. It is database-agnostic and defines traits
//! that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod ingest;
pub mod search;
pub mod symbols;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
