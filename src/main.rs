use anyhow::Context;
use clap::Parser;
use revenant::api::KrakenClient;
use revenant::daemon::{signals, Daemon, ShutdownFlag};
use revenant::telemetry;
use revenant::DaemonConfig;
use std::path::PathBuf;

/// Long-running BTC price monitor
#[derive(Debug, Parser)]
#[command(name = "revenant", version)]
struct Args {
    /// Path to a TOML config file (defaults to ./revenant.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = DaemonConfig::load(args.config.as_deref()).context("Failed to load config")?;
    telemetry::init_logging(&config.app_log_path).with_context(|| {
        format!("Failed to open log file {}", config.app_log_path.display())
    })?;

    tracing::info!(
        check_interval_secs = config.check_interval_secs,
        heartbeat_interval_secs = config.heartbeat_interval_secs,
        max_retries = config.retry.max_retries,
        price_log = %config.price_log_path.display(),
        "Configuration loaded"
    );

    let client = KrakenClient::from_config(&config).context("Failed to build HTTP client")?;

    let shutdown = ShutdownFlag::new();
    signals::install(shutdown.clone()).context("Failed to install signal handlers")?;

    let mut daemon = Daemon::new(config, client, shutdown);
    daemon.run().await.context("Failed to initialize price log")?;

    Ok(())
}
