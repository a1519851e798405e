//! Daemon configuration record.
//!
//! Loaded once at startup and handed to the daemon by value; nothing reads
//! interval or retry settings from ambient state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::api::retry::RetryPolicy;
use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "revenant";
const ENV_PREFIX: &str = "REVENANT";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    pub price_log_path: PathBuf,
    pub app_log_path: PathBuf,
    pub heartbeat_interval_secs: u64,
    pub check_interval_secs: u64,
    pub sleep_slice_ms: u64,
    pub feed: FeedConfig,
    pub retry: RetryConfig,
}

/// Price feed endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    /// Key of the ticker entry under `result` in the response body.
    pub pair: String,
    pub request_timeout_secs: u64,
}

/// Backoff retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub backoff_unit_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            price_log_path: PathBuf::from("revenant_price_log.csv"),
            app_log_path: PathBuf::from("revenant_bot.log"),
            heartbeat_interval_secs: 3600, // 1 hour
            check_interval_secs: 60,       // 1 min
            sleep_slice_ms: 1000,
            feed: FeedConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://api.kraken.com/0/public/Ticker?pair=XBTUSD".to_string(),
            pair: "XXBTZUSD".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 2.0,
            backoff_unit_ms: 1000,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional TOML file and
    /// `REVENANT__*` environment variables, in increasing precedence.
    ///
    /// When `path` is `None` an optional `revenant.toml` in the working
    /// directory is consulted.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default(
                "price_log_path",
                defaults.price_log_path.to_string_lossy().into_owned(),
            )?
            .set_default(
                "app_log_path",
                defaults.app_log_path.to_string_lossy().into_owned(),
            )?
            .set_default("heartbeat_interval_secs", defaults.heartbeat_interval_secs as i64)?
            .set_default("check_interval_secs", defaults.check_interval_secs as i64)?
            .set_default("sleep_slice_ms", defaults.sleep_slice_ms as i64)?
            .set_default("feed.url", defaults.feed.url)?
            .set_default("feed.pair", defaults.feed.pair)?
            .set_default("feed.request_timeout_secs", defaults.feed.request_timeout_secs as i64)?
            .set_default("retry.max_retries", i64::from(defaults.retry.max_retries))?
            .set_default("retry.backoff_factor", defaults.retry.backoff_factor)?
            .set_default("retry.backoff_unit_ms", defaults.retry.backoff_unit_ms as i64)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_retries must be at least 1".to_string(),
            ));
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.backoff_factor must be a positive number, got {}",
                self.retry.backoff_factor
            )));
        }
        if self.retry.backoff_unit_ms == 0 {
            return Err(ConfigError::Invalid(
                "retry.backoff_unit_ms must be positive".to_string(),
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "check_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.sleep_slice_ms == 0 {
            return Err(ConfigError::Invalid(
                "sleep_slice_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn sleep_slice(&self) -> Duration {
        Duration::from_millis(self.sleep_slice_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.feed.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            self.retry.backoff_factor,
            Duration::from_millis(self.retry.backoff_unit_ms),
        )
    }
}
