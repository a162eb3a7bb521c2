//! Beach data sources
//!
//! [`BeachSource`] is the capability the tool layer fetches records through.
//! [`LiveBeachSource`] calls the badevand.dk API once per fetch;
//! [`FixtureBeachSource`] serves a dataset loaded from disk at startup.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::beaches::types::RawBeachRecord;
use crate::config::{Config, DataSource};
use crate::error::{ConfigError, Result, UpstreamError};

/// Provider of raw beach records
#[async_trait]
pub trait BeachSource: Send + Sync {
    /// Fetch the current list of beaches
    ///
    /// Returns an owned copy; callers may consume it freely.
    async fn fetch_beaches(&self) -> Result<Vec<RawBeachRecord>>;
}

/// Build the source selected by configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn BeachSource>> {
    match &config.data_source {
        DataSource::Live => Ok(Arc::new(LiveBeachSource::new(config)?)),
        DataSource::Fixture(path) => Ok(Arc::new(FixtureBeachSource::load(path)?)),
    }
}

/// badevand.dk API client
pub struct LiveBeachSource {
    /// HTTP client
    http_client: reqwest::Client,

    /// Beach list endpoint
    api_url: String,
}

impl LiveBeachSource {
    /// Create a new client with the configured endpoint and timeout
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl BeachSource for LiveBeachSource {
    async fn fetch_beaches(&self) -> Result<Vec<RawBeachRecord>> {
        tracing::debug!(url = %self.api_url, "Fetching beaches");

        let response = self
            .http_client
            .get(&self.api_url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                message: if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Unavailable {
                message: format!("Beach API returned {}: {}", status, text),
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                message: e.to_string(),
            })?;

        let beaches: Vec<RawBeachRecord> =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed {
                message: e.to_string(),
            })?;

        if let Some(id) = duplicate_id(&beaches) {
            return Err(UpstreamError::Malformed {
                message: format!("duplicate beach id {}", id),
            }
            .into());
        }

        tracing::debug!(count = beaches.len(), "Fetched beaches");
        Ok(beaches)
    }
}

/// Static dataset with the upstream response shape
#[derive(Debug, Clone)]
pub struct FixtureBeachSource {
    records: Arc<Vec<RawBeachRecord>>,
}

impl FixtureBeachSource {
    pub fn new(records: Vec<RawBeachRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Load a JSON array of beach records from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let fixture_error = |message: String| ConfigError::FixtureLoadFailed {
            path: path.display().to_string(),
            message,
        };

        let text = std::fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let records: Vec<RawBeachRecord> =
            serde_json::from_str(&text).map_err(|e| fixture_error(e.to_string()))?;
        if let Some(id) = duplicate_id(&records) {
            return Err(fixture_error(format!("duplicate beach id {}", id)).into());
        }

        tracing::info!(path = %path.display(), count = records.len(), "Loaded beach fixture");
        Ok(Self::new(records))
    }
}

/// First id that appears more than once
fn duplicate_id(records: &[RawBeachRecord]) -> Option<u64> {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().map(|r| r.id).find(|id| !seen.insert(*id))
}

#[async_trait]
impl BeachSource for FixtureBeachSource {
    async fn fetch_beaches(&self) -> Result<Vec<RawBeachRecord>> {
        Ok(self.records.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beaches::transform::tests::raw_beach;
    use crate::error::BadevandError;

    #[test]
    fn test_fixture_hands_out_copies() {
        let source = FixtureBeachSource::new(vec![raw_beach(1, "Aarhus", vec![])]);

        let mut first = tokio_test::block_on(source.fetch_beaches()).unwrap();
        first[0].name = "Changed".to_string();
        first.clear();

        let second = tokio_test::block_on(source.fetch_beaches()).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Strand 1");
    }

    #[test]
    fn test_fixture_load_missing_file() {
        let err = FixtureBeachSource::load(Path::new("/nonexistent/beaches.json")).unwrap_err();
        assert!(matches!(
            err,
            BadevandError::Config(ConfigError::FixtureLoadFailed { .. })
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let unique = vec![raw_beach(1, "Aarhus", vec![]), raw_beach(2, "Aarhus", vec![])];
        assert_eq!(duplicate_id(&unique), None);

        let repeated = vec![
            raw_beach(1, "Aarhus", vec![]),
            raw_beach(2, "Odense", vec![]),
            raw_beach(1, "Køge", vec![]),
        ];
        assert_eq!(duplicate_id(&repeated), Some(1));
    }

    #[test]
    fn test_fixture_load_rejects_duplicate_ids() {
        let path = std::env::temp_dir().join(format!("badevand-dup-{}.json", std::process::id()));
        let records = vec![raw_beach(4, "Aarhus", vec![]), raw_beach(4, "Aarhus", vec![])];
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let err = FixtureBeachSource::load(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        match err {
            BadevandError::Config(ConfigError::FixtureLoadFailed { message, .. }) => {
                assert!(message.contains("duplicate beach id 4"));
            }
            other => panic!("expected FixtureLoadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_live_source_unreachable() {
        let config = Config {
            // Port 9 (discard) on localhost is expected to refuse connections
            api_url: "http://127.0.0.1:9/api/beaches/dk".to_string(),
            ..Config::default()
        };
        let source = LiveBeachSource::new(&config).unwrap();

        let err = source.fetch_beaches().await.unwrap_err();
        assert!(matches!(
            err,
            BadevandError::Upstream(UpstreamError::Unavailable { .. })
        ));
    }
}
