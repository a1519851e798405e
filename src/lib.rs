// Core modules
pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod models;
pub mod persistence;
pub mod telemetry;

// Collaborators
pub mod guardian;
pub mod notify;
pub mod reaper;

// Re-export commonly used types
pub use api::{KrakenClient, PriceSource, RetryError, RetryPolicy};
pub use config::DaemonConfig;
pub use daemon::{Daemon, ShutdownFlag, TickOutcome};
pub use models::*;
pub use persistence::TrendLogger;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
