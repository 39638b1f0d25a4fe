//! Core error types for the Propel client

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Propel client operations
#[derive(Error, Debug)]
pub enum PropelError {
    /// No credential stored; the user has to log in first
    #[error("No credentials found! Please, login first!")]
    NoCredentials,

    /// Bad username/password or a login response without a token
    #[error("Login failed: {0}")]
    Login(String),

    /// Response status outside the expected success set
    #[error("Bad status code: {code}. Content: {body}")]
    Http {
        /// HTTP status code
        code: u16,
        /// Raw response body
        body: String,
    },

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Polling budget exhausted before the agent reached the awaited state
    #[error("[Agent: {agent}] Timeout during wait for {waiting_for}")]
    Timeout {
        /// Agent name or id
        agent: String,
        /// What was being awaited
        waiting_for: String,
    },

    /// Server answered a not-found check with an unexpected payload
    #[error("Bad response from server: {0}")]
    DataIntegrity(String),

    /// Seat check found no free capacity
    #[error("No seats")]
    NoSeats,

    /// Response body could not be decoded
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Credential storage error
    #[error("Credential storage error: {0}")]
    Credentials(#[from] CredentialError),

    /// Service descriptor could not be read
    #[error("Service descriptor error: {0}")]
    Descriptor(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PropelError {
    /// True for connection-level failures the poller tolerates
    pub fn is_connectivity(&self) -> bool {
        matches!(self, PropelError::Transport(e) if e.is_connectivity())
    }

    /// Status code of an HTTP failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PropelError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Transport-level errors
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Could not reach the server (refused, DNS, reset during connect)
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other request failure (timeouts while reading, protocol errors)
    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether this error means the server was unreachable
    pub fn is_connectivity(&self) -> bool {
        matches!(self, TransportError::Connect(_))
    }
}

/// Credential storage errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Could not determine where to keep credentials
    #[error("Could not find home directory")]
    NoHomeDir,

    /// I/O error
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored credentials are not a flat JSON object of strings
    #[error("Malformed credentials file {path:?}: {source}")]
    Malformed {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result alias used across the crate
pub type Result<T, E = PropelError> = std::result::Result<T, E>;
