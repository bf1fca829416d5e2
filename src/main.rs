use atzwatch::config::Config;
use atzwatch::log_format::CycleLogFormat;
use atzwatch::publisher::ConsolePublisher;
use atzwatch::scheduler::Scheduler;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// ADS-B ground-station event-detection pipeline: polls a JSON aircraft
/// snapshot, runs it through the filter framework, and publishes alerts.
#[derive(Parser, Debug)]
#[command(name = "atzwatch", about = "ADS-B event-detection pipeline")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Run a single cycle and exit, instead of polling on the configured interval
    #[arg(long)]
    once: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "warn"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(CycleLogFormat)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args);

    let config = Config::load(&args.config)?;
    info!(config = %args.config.display(), link = %config.link, "loaded configuration");

    let scheduler = Scheduler::new(config, Box::new(ConsolePublisher))?;

    if args.once {
        scheduler.run_once().await?;
    } else {
        scheduler.run().await?;
    }

    Ok(())
}
