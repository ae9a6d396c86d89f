use std::str::FromStr;

use symdex_core::constants::{
    DEFAULT_CANDIDATE_POOL_LIMIT, DEFAULT_FUZZY_MIN_SCORE, DEFAULT_SEARCH_LIMIT,
};
use symdex_core::errors::{Result, ValidationError};
use symdex_core::search::SearchConfig;

const DEFAULT_DB_PATH: &str = "./data/universe.db";

pub struct Config {
    pub db_path: String,
    pub search: SearchConfig,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("SYMDEX_DB_PATH")
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());

        let search = SearchConfig {
            default_limit: parse_or(&lookup, "SYMDEX_SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?,
            fuzzy_min_score: parse_or(&lookup, "SYMDEX_FUZZY_MIN_SCORE", DEFAULT_FUZZY_MIN_SCORE)?,
            candidate_pool_limit: parse_or(
                &lookup,
                "SYMDEX_CANDIDATE_POOL_LIMIT",
                DEFAULT_CANDIDATE_POOL_LIMIT,
            )?,
        };
        search.validate()?;

        let log_format = lookup("SYMDEX_LOG_FORMAT").unwrap_or_else(|| "text".into());

        Ok(Self {
            db_path,
            search,
            log_format,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ValidationError::InvalidConfigValue {
                key: key.to_string(),
                value: raw,
            }
            .into()
        }),
    }
}
