//! Application configuration loaded from environment variables.
//!
//! Call `dotenv::dotenv().ok()` first to pick up a local `.env` file.

use anyhow::{anyhow, Result};
use tracing::Level;

pub const TABLE_VAR: &str = "STORE_AWS_DYNAMODB_TABLE_STORE";
pub const REGION_VAR: &str = "STORE_AWS_REGION";
pub const LOG_LEVEL_VAR: &str = "STORE_LOG_LEVEL";
pub const LOG_PRETTY_VAR: &str = "STORE_LOG_PRETTY";

/// Settings for the cart store binary.
///
/// Reads from environment variables:
/// - `STORE_AWS_DYNAMODB_TABLE_STORE`: store table name (required)
/// - `STORE_AWS_REGION`: AWS region override (default: the SDK's own lookup)
/// - `STORE_LOG_LEVEL`: `error`, `warn`, `info`, `debug` or `trace` (default: `info`)
/// - `STORE_LOG_PRETTY`: `pretty` for multi-line human readable logs
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
    pub region: Option<String>,
    pub log_level: Level,
    pub log_pretty: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let table_name =
            lookup(TABLE_VAR).ok_or_else(|| anyhow!("{TABLE_VAR} is not set"))?;

        Ok(Self {
            table_name,
            region: lookup(REGION_VAR).filter(|region| !region.is_empty()),
            log_level: parse_level(lookup(LOG_LEVEL_VAR).as_deref()),
            log_pretty: lookup(LOG_PRETTY_VAR).as_deref() == Some("pretty"),
        })
    }
}

fn parse_level(value: Option<&str>) -> Level {
    match value {
        Some("fatal" | "error") => Level::ERROR,
        Some("warn") => Level::WARN,
        Some("debug") => Level::DEBUG,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    }
}
