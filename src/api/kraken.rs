use super::retry::{RetryError, RetryPolicy};
use super::PriceSource;
use crate::config::DaemonConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

const KRAKEN_TICKER_URL: &str = "https://api.kraken.com/0/public/Ticker?pair=XBTUSD";
const KRAKEN_PAIR: &str = "XXBTZUSD";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the Kraken public ticker
#[derive(Clone)]
pub struct KrakenClient {
    client: Client,
    url: String,
    pair: String,
    policy: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    result: Option<HashMap<String, TickerInfo>>,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: `[price, lot volume]`
    c: Vec<String>,
}

impl KrakenClient {
    pub fn new(
        url: impl Into<String>,
        pair: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            pair: pair.into(),
            policy,
        })
    }

    pub fn from_config(config: &DaemonConfig) -> Result<Self, FetchError> {
        Self::new(
            config.feed.url.clone(),
            config.feed.pair.clone(),
            config.request_timeout(),
            config.retry_policy(),
        )
    }

    /// Get the last-trade price, retrying transport failures with backoff
    pub async fn get_price(&self) -> Result<Decimal, RetryError<FetchError>> {
        let mut attempt = 0u32;

        self.policy
            .run(|| {
                attempt += 1;
                let n = attempt;
                async move { self.fetch_price_once(n).await }
            })
            .await
    }

    /// Internal method to fetch price once (without retry logic)
    async fn fetch_price_once(&self, attempt: u32) -> Result<Decimal, FetchError> {
        let response = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    attempt,
                    error_kind = request_error_kind(&e),
                    "Connection error: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                attempt,
                status = status.as_u16(),
                "API returned status code {}",
                status
            );
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(
                attempt,
                error_kind = request_error_kind(&e),
                "Error reading response body: {}",
                e
            );
            FetchError::from(e)
        })?;

        parse_ticker(&body, &self.pair).inspect_err(|e| {
            tracing::error!(attempt, "{}", e);
        })
    }
}

impl Default for KrakenClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            url: KRAKEN_TICKER_URL.to_string(),
            pair: KRAKEN_PAIR.to_string(),
            policy: RetryPolicy::default(),
        }
    }
}

#[async_trait]
impl PriceSource for KrakenClient {
    async fn fetch_price(&self) -> Option<Decimal> {
        match self.get_price().await {
            Ok(price) => Some(price),
            Err(RetryError::Exhausted { attempts, .. }) => {
                tracing::error!("Failed to fetch price after {} attempts", attempts);
                None
            }
            Err(RetryError::Permanent(e)) => {
                tracing::warn!("Skipping this tick: {}", e);
                None
            }
        }
    }
}

/// Extract the last-trade price for `pair` from a ticker body
fn parse_ticker(body: &[u8], pair: &str) -> Result<Decimal, FetchError> {
    let response: TickerResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::Protocol(format!("invalid ticker body: {}", e)))?;

    let last_trade = response
        .result
        .as_ref()
        .and_then(|result| result.get(pair))
        .and_then(|info| info.c.first())
        .ok_or_else(|| {
            FetchError::Protocol(format!(
                "missing result.{}.c[0] in {}",
                pair,
                String::from_utf8_lossy(body)
            ))
        })?;

    Decimal::from_str(last_trade)
        .map_err(|e| FetchError::Protocol(format!("bad price '{}': {}", last_trade, e)))
}

fn request_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    }
}
