use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "symdex")]
#[command(about = "Resolve ticker fragments to equity symbols and their index memberships", version)]
pub struct Cli {
    /// SQLite database path (overrides SYMDEX_DB_PATH).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log filter such as `debug` or `symdex_core=trace` (overrides RUST_LOG).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search symbols by exact, prefix or fuzzy match.
    Search(SearchArgs),
    /// Load index constituent CSV files into the database.
    Ingest(IngestArgs),
    /// Load company names from a symbol/name CSV file.
    IngestNames(IngestNamesArgs),
    /// Print symbol, name, membership and per-index counts.
    Stats,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub min_score: Option<f64>,

    /// Only return members of this index; repeatable.
    #[arg(long = "index")]
    pub indices: Vec<String>,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV files or directories of CSV files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Index name for every file instead of the file stem.
    #[arg(long)]
    pub index: Option<String>,
}

#[derive(Debug, Args)]
pub struct IngestNamesArgs {
    /// CSV file with symbol and company name columns.
    pub path: PathBuf,

    /// Provenance recorded with each name (defaults to `csv:<file name>`).
    #[arg(long)]
    pub source: Option<String>,
}
