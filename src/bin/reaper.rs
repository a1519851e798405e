use clap::Parser;
use revenant::reaper::{reap, ProcessMatcher};
use revenant::telemetry;
use revenant::Result;

/// Kill running revenant daemons
#[derive(Debug, Parser)]
#[command(name = "reaper")]
struct Args {
    /// Executable name prefix to match (case-insensitive)
    #[arg(long, default_value = "revenant")]
    name_prefix: String,

    /// Substring the command line must contain
    #[arg(long, default_value = "revenant")]
    cmdline: String,
}

fn main() -> Result<()> {
    telemetry::init_console_logging();
    let args = Args::parse();

    let matcher = ProcessMatcher::new(args.name_prefix, args.cmdline);
    let killed = reap(&matcher)?;

    for pid in &killed {
        println!("Killed process {} (revenant)", pid);
    }
    println!("Revenant Bot processes terminated.");

    Ok(())
}
