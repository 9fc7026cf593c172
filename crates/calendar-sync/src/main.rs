use anyhow::Result;
use calendar_sync::config::Config;
use calendar_sync::db::{self, DbPool};
use calendar_sync::handler;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::time::interval;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calendar-sync")]
#[command(about = "Reload today's calendar events for every user with an active webhook")]
#[command(
    long_about = "Truncates the events table, then fetches each registered user's Google Calendar \
    events for the day window and inserts them.\n\n\
    All settings come from the environment (a .env file is loaded if present)."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single sync and print the invocation response as JSON (default)
    ///
    /// Exits with a non-zero status when the response is not 200.
    Once,

    /// Run a sync on a fixed interval until interrupted
    Poll {
        /// Seconds between runs. Overrides SYNC_INTERVAL_SECS.
        #[arg(short, long, value_name = "SECS")]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendar_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Connections are opened lazily on first checkout.
    let pool = db::establish_connection_pool(&config.database)?;

    match cli.command.unwrap_or(Command::Once) {
        Command::Once => {
            let response = handler::handle(&pool, &config, Utc::now()).await;
            println!("{}", serde_json::to_string(&response)?);

            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Command::Poll { interval_secs } => {
            let period = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.sync.interval);
            run_polling(&pool, &config, period).await?;
        }
    }

    Ok(())
}

async fn run_polling(pool: &DbPool, config: &Config, period: Duration) -> Result<()> {
    tracing::info!("Calendar sync polling started (interval: {:?})", period);

    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let response = handler::handle(pool, config, Utc::now()).await;
                if response.is_success() {
                    tracing::debug!("Calendar sync cycle finished");
                } else {
                    // Keep polling; the next cycle reloads the table from scratch.
                    tracing::warn!("Calendar sync cycle returned {}", response.status_code);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping...");
                break;
            }
        }
    }

    Ok(())
}
