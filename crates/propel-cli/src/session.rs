//! Per-invocation state shared by every command

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use propel_core::config::{self, ClientConfig};
use propel_core::PropelClient;

/// Connection options accepted by every command
///
/// Unset options fall back to the config file, then to built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Base URL of the Propel service [default: https://app.propel.valory.xyz]
    #[arg(short = 'U', long, env = "PROPEL_URL", global = true)]
    pub url: Option<String>,

    /// Retries for unreachable servers [default: 10]
    #[arg(long, global = true)]
    pub http_retries: Option<u32>,

    /// Backoff factor in seconds between retries [default: 0.05]
    #[arg(long, global = true)]
    pub backoff_factor: Option<f64>,

    /// Request timeout in seconds [default: 120]
    #[arg(long, global = true)]
    pub http_timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Apply the options given on the command line over `config`
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(retries) = self.http_retries {
            config.http_retries = retries;
        }
        if let Some(factor) = self.backoff_factor {
            config.backoff_factor = factor;
        }
        if let Some(secs) = self.http_timeout {
            config.http_timeout = Duration::from_secs(secs);
        }
    }
}

/// Effective configuration and the client built from it
pub struct Session {
    pub config_path: PathBuf,
    pub config: ClientConfig,
    pub client: PropelClient,
}

impl Session {
    pub fn new(config_path: Option<PathBuf>, args: &ConnectionArgs) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(config::default_config_path);
        let mut config = config::load_client_config(Some(&config_path))
            .with_context(|| format!("Failed to load config from {:?}", config_path))?;
        args.apply(&mut config);

        tracing::debug!(url = %config.base_url, "Using Propel service");
        let client = PropelClient::from_config(&config).context("Failed to create client")?;

        Ok(Self {
            config_path,
            config,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propel_core::config::DEFAULT_BASE_URL;

    #[test]
    fn test_flags_override_file_values() {
        let mut config = ClientConfig {
            base_url: "http://from-file".to_string(),
            http_retries: 3,
            ..ClientConfig::default()
        };
        let args = ConnectionArgs {
            url: Some("http://from-flag".to_string()),
            http_timeout: Some(7),
            ..ConnectionArgs::default()
        };

        args.apply(&mut config);

        assert_eq!(config.base_url, "http://from-flag");
        assert_eq!(config.http_retries, 3);
        assert_eq!(config.http_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_session_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(
            Some(dir.path().join("config.toml")),
            &ConnectionArgs::default(),
        )
        .unwrap();

        assert_eq!(session.config.base_url, DEFAULT_BASE_URL);
        assert_eq!(session.client.base_url(), DEFAULT_BASE_URL);
    }
}
