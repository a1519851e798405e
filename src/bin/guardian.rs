use revenant::guardian::{load_memory, MemoryPaths};
use revenant::notify::TelegramNotifier;
use revenant::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_console_logging();

    let brain = load_memory(&MemoryPaths::default());
    tracing::info!("Guardian memory loaded.");
    println!("{}", serde_json::to_string_pretty(&brain)?);

    let notifier = TelegramNotifier::from_env()?;
    notifier.send("Guardian has launched and is online.").await?;

    Ok(())
}
