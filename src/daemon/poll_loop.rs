use super::heartbeat;
use super::signals::ShutdownFlag;
use crate::api::PriceSource;
use crate::config::DaemonConfig;
use crate::error::PersistenceError;
use crate::models::{DaemonState, Observation};
use crate::persistence::TrendLogger;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Lifecycle of the daemon. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

/// What one fetch → log → heartbeat cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Logged(Observation),
    /// The source had no price this cycle (exhausted retries or bad response).
    NoPrice,
    /// A price was fetched but the row could not be written; state not advanced.
    WriteFailed,
}

/// Price monitoring daemon
///
/// Owns the previous-price state and drives one cycle per tick until the
/// shutdown flag is cleared.
pub struct Daemon<S> {
    config: DaemonConfig,
    source: S,
    logger: TrendLogger,
    state: DaemonState,
    shutdown: ShutdownFlag,
    phase: Phase,
}

impl<S: PriceSource> Daemon<S> {
    pub fn new(config: DaemonConfig, source: S, shutdown: ShutdownFlag) -> Self {
        let logger = TrendLogger::new(config.price_log_path.clone());

        Self {
            config,
            source,
            logger,
            state: DaemonState::new(Instant::now()),
            shutdown,
            phase: Phase::Starting,
        }
    }

    pub fn state(&self) -> &DaemonState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Prepare the price log and reset the heartbeat clock.
    ///
    /// Failing to create the log is the one unrecoverable error.
    pub fn start(&mut self) -> Result<(), PersistenceError> {
        self.logger.initialize()?;
        self.state.last_heartbeat = Instant::now();
        self.phase = Phase::Running;
        Ok(())
    }

    /// Run one fetch → log → heartbeat cycle
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = match self.source.fetch_price().await {
            Some(price) => match self.logger.append(price, self.state.last_price) {
                Ok(observation) => {
                    self.state.last_price = Some(observation.price);
                    tracing::info!(
                        price = %observation.price,
                        movement = %observation.trend,
                        "Price checked: ${:.2}",
                        observation.price
                    );
                    TickOutcome::Logged(observation)
                }
                Err(e) => {
                    tracing::error!("Failed to write to CSV: {}", e);
                    TickOutcome::WriteFailed
                }
            },
            None => TickOutcome::NoPrice,
        };

        self.check_heartbeat();
        outcome
    }

    fn check_heartbeat(&mut self) {
        self.state.last_heartbeat = heartbeat::emit_if_due(
            Instant::now(),
            self.state.last_heartbeat,
            self.config.heartbeat_interval(),
        );
    }

    /// Sleep for the check interval in slices, returning early once shutdown
    /// is requested.
    pub async fn sleep_until_next_tick(&self) {
        let slice = self.config.sleep_slice();
        let mut remaining = self.config.check_interval();

        // Let the signal task run even when there is nothing to wait for
        if remaining.is_zero() {
            tokio::task::yield_now().await;
        }

        while !remaining.is_zero() && self.shutdown.is_running() {
            let step = remaining.min(slice);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
    }

    /// Drive the daemon until the shutdown flag is cleared
    pub async fn run(&mut self) -> Result<(), PersistenceError> {
        tracing::info!("Revenant Bot is starting...");
        self.start()?;

        while self.shutdown.is_running() {
            // A panicking cycle is logged and skipped, never fatal
            if AssertUnwindSafe(self.tick()).catch_unwind().await.is_err() {
                tracing::error!("Error in price check task: tick panicked, continuing");
                self.check_heartbeat();
            }

            self.sleep_until_next_tick().await;
        }

        self.phase = Phase::ShuttingDown;
        tracing::info!(
            last_price = ?self.state.last_price,
            "Revenant Bot has shut down"
        );
        self.phase = Phase::Stopped;
        Ok(())
    }
}
