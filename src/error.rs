use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::retry::Transient;

/// Failure of a single price-feed attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived with a non-200 status.
    #[error("feed returned status {0}")]
    Status(StatusCode),

    /// A 200 response arrived but did not have the expected shape.
    #[error("unexpected response format: {0}")]
    Protocol(String),
}

impl Transient for FetchError {
    fn is_transient(&self) -> bool {
        // Don't retry on a response we already received, only on failure to receive one.
        !matches!(self, FetchError::Protocol(_))
    }
}

/// Failure to write to the durable price log.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("price log I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed price log row {line} in {}: {details}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        details: String,
    },
}

/// Failure to load or validate the daemon configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
