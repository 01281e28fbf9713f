//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// API server configuration.
///
/// Gateway connection settings are read by
/// `whatsapp_gateway::GatewayConfig::from_env`, and sweep settings by
/// `lifecycle::ReEngagementConfig::from_env`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Bearer token protecting the API. When unset the API is open
    /// (development mode).
    pub api_token: Option<String>,
    /// Semantic index service base URL.
    pub index_url: Option<String>,
    /// Semantic index bearer token.
    pub index_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLA_API_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:parla.db?mode=rwc` |
    /// | `PARLA_API_TOKEN` | API bearer token | (none - open) |
    /// | `PARLA_INDEX_URL` | Semantic index base URL | (none - selector off) |
    /// | `PARLA_INDEX_TOKEN` | Semantic index bearer token | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PARLA_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:parla.db?mode=rwc".to_string());

        Ok(Self {
            addr,
            database_url,
            api_token: env::var("PARLA_API_TOKEN").ok(),
            index_url: env::var("PARLA_INDEX_URL").ok(),
            index_token: env::var("PARLA_INDEX_TOKEN").ok(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PARLA_API_ADDR format")]
    InvalidAddr,
}
