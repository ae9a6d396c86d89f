use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use symdex_core::ingest::{IngestService, IngestServiceTrait};
use symdex_core::search::{SearchRequest, SymbolSearchService, SymbolSearchServiceTrait};
use symdex_storage_sqlite::{create_pool, init, run_migrations, SymbolRepository};

use crate::cli::{Commands, IngestArgs, IngestNamesArgs, SearchArgs};
use crate::config::Config;

pub fn run(config: &Config, command: Commands) -> Result<()> {
    let repository = open_repository(&config.db_path)?;
    let output = match command {
        Commands::Search(args) => search(config, repository, args)?,
        Commands::Ingest(args) => ingest(repository, args)?,
        Commands::IngestNames(args) => ingest_names(repository, args)?,
        Commands::Stats => stats(repository)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn open_repository(db_path: &str) -> Result<Arc<SymbolRepository>> {
    let db_path = init(db_path).with_context(|| format!("failed to open database {db_path}"))?;
    tracing::debug!("Database path in use: {}", db_path);
    let pool = create_pool(&db_path).context("failed to create connection pool")?;
    run_migrations(&pool).context("failed to migrate database")?;
    Ok(Arc::new(SymbolRepository::new(pool)))
}

fn search(config: &Config, repository: Arc<SymbolRepository>, args: SearchArgs) -> Result<Value> {
    let service = SymbolSearchService::new(repository, config.search.clone())
        .context("invalid search configuration")?;

    let mut request = SearchRequest::new(args.query).with_indices(args.indices);
    if let Some(limit) = args.limit {
        request = request.with_limit(limit);
    }
    if let Some(min_score) = args.min_score {
        request = request.with_min_score(min_score);
    }

    let results = service.search(request).context("search failed")?;
    Ok(serde_json::to_value(results)?)
}

fn ingest(repository: Arc<SymbolRepository>, args: IngestArgs) -> Result<Value> {
    let service = IngestService::new(repository);
    let report = service
        .ingest_paths(&args.paths, args.index.as_deref())
        .context("ingestion failed")?;
    Ok(serde_json::to_value(report)?)
}

fn ingest_names(repository: Arc<SymbolRepository>, args: IngestNamesArgs) -> Result<Value> {
    let report = IngestService::new(repository)
        .ingest_names(&args.path, args.source.as_deref())
        .context("name ingestion failed")?;
    Ok(serde_json::to_value(report)?)
}

fn stats(repository: Arc<SymbolRepository>) -> Result<Value> {
    let stats = IngestService::new(repository)
        .stats()
        .context("failed to read store statistics")?;
    Ok(serde_json::to_value(stats)?)
}
