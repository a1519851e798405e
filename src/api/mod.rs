pub mod kraken;
pub mod retry;

pub use kraken::KrakenClient;
pub use retry::{RetryError, RetryPolicy, Transient};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Something that can observe the current price, or report that it could not
///
/// Failures are logged by the implementation; callers only learn that no
/// price is available this cycle.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self) -> Option<Decimal>;
}
