//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Production Propel service
pub const DEFAULT_BASE_URL: &str = "https://app.propel.valory.xyz";

/// Configuration for the Propel HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Propel service
    pub base_url: String,

    /// Retries for connection-level failures
    pub http_retries: u32,

    /// Backoff factor in seconds; retry n waits `factor * 2^(n-1)`
    pub backoff_factor: f64,

    /// Per-request timeout in seconds
    #[serde(with = "duration_secs")]
    pub http_timeout: Duration,

    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,

    /// Override for the credentials file location
    pub credentials_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_retries: 10,
            backoff_factor: 0.05,
            http_timeout: Duration::from_secs(120),
            accept_invalid_certs: false,
            credentials_path: None,
        }
    }
}

impl ClientConfig {
    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
