//! Configuration management for the Badevand MCP Server
//!
//! Handles environment variables, defaults, and data source selection.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Where beach records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Fetch from the badevand.dk API on every tool call
    Live,

    /// Serve a bundled JSON file with the upstream response shape
    Fixture(PathBuf),
}

/// Configuration for the Badevand MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream beach API endpoint
    pub api_url: String,

    /// Upper bound for a single upstream fetch
    pub request_timeout: Duration,

    /// Directory holding the built widget HTML and static assets
    pub assets_dir: PathBuf,

    /// Beach data source
    pub data_source: DataSource,

    /// Bind address for the HTTP transport
    pub host: String,

    /// Port for the HTTP transport
    pub port: u16,
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Result<Self> {
        let api_url =
            std::env::var("BADEVAND_API_URL").unwrap_or_else(|_| badevand::API_URL.to_string());

        let timeout_secs = match std::env::var("BADEVAND_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidConfig {
                message: format!("BADEVAND_TIMEOUT_SECS must be a whole number, got '{}'", raw),
            })?,
            Err(_) => badevand::DEFAULT_TIMEOUT_SECS,
        };

        let assets_dir = std::env::var("BADEVAND_ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("assets"));

        let data_source = std::env::var("BADEVAND_FIXTURE_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(|p| DataSource::Fixture(PathBuf::from(p)))
            .unwrap_or(DataSource::Live);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        // Non-numeric PORT falls back to the default
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            assets_dir,
            data_source,
            host,
            port,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: badevand::API_URL.to_string(),
            request_timeout: Duration::from_secs(badevand::DEFAULT_TIMEOUT_SECS),
            assets_dir: PathBuf::from("assets"),
            data_source: DataSource::Live,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Badevand API constants
pub mod badevand {
    /// Endpoint listing every monitored Danish beach
    pub const API_URL: &str = "https://api.badevand.dk/api/beaches/dk";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Thumbnail pool, indexed by beach id
    pub const THUMBNAILS: [&str; 4] = [
        "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=400",
        "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400",
        "https://images.unsplash.com/photo-1559827260-dc66d52bef19?w=400",
        "https://images.unsplash.com/photo-1471922694854-ff1b63b20054?w=400",
    ];

    /// Lowercase marker for an active bathing prohibition in beach comments
    pub const SWIMMING_BAN_MARKER: &str = "badeforbud";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, badevand::API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.data_source, DataSource::Live);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_thumbnail_pool() {
        assert_eq!(badevand::THUMBNAILS.len(), 4);
        assert!(badevand::THUMBNAILS.iter().all(|t| t.starts_with("https://")));
    }
}
