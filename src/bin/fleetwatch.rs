use std::sync::Arc;

use clap::Parser;
use fleetwatch::{config::read_config_file, notify::TelegramNotifier, orchestrator::start_monitoring};
use tracing::{debug, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![("fleetwatch", LevelFilter::TRACE)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = read_config_file(&args.file)?;

    if let Ok(token) = std::env::var("FLEETWATCH_BOT_TOKEN") {
        config.telegram.bot_token = token;
    }

    let profiles = config.resolve();
    if profiles.is_empty() && config.sites.is_none() {
        anyhow::bail!("nothing to monitor: no servers or sites configured");
    }

    let notifier = Arc::new(TelegramNotifier::new(&config.telegram));
    let monitor = start_monitoring(&profiles, config.sites.as_ref(), notifier);

    debug!(
        "monitoring started: {} loops across {} servers",
        monitor.poller_count(),
        profiles.len()
    );

    tokio::signal::ctrl_c().await?;
    debug!("shutting down");
    monitor.shutdown().await;

    Ok(())
}
