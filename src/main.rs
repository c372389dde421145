use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notice_sentinel::config::{Config, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "notice-sentinel",
    version,
    about = "Slot-aligned announcement poller with Redis pub/sub fan-out",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides SENTINEL_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll forever and publish new announcements
    Run {
        /// Offset inside each period in seconds (random when omitted)
        #[arg(short, long)]
        slot: Option<u32>,

        /// Seconds between polls
        #[arg(short, long)]
        period: Option<u32>,

        /// Initial dedup watermark
        #[arg(long)]
        start_id: Option<i64>,

        /// Publish to an in-process channel instead of Redis
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Issue a single request and print the normalized result
    Probe {
        /// Also print the Prometheus metrics recorded by the request
        #[arg(long, default_value = "false")]
        metrics: bool,
    },

    /// Print the ticker extracted from an announcement title
    Ticker {
        /// Announcement title
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A file config carries its own logging section; otherwise read the
    // logging variables first so warnings from the rest of the environment
    // are not lost.
    let file_config = cli.config.as_deref().map(Config::from_file).transpose()?;
    let logging = file_config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(LoggingConfig::from_env);
    let format = cli.log_format.as_deref().unwrap_or(&logging.format);
    setup_tracing(format, &logging.level, cli.verbose)?;

    let config = match file_config {
        Some(config) => config,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Run {
            slot,
            period,
            start_id,
            dry_run,
        } => {
            tracing::debug!(
                slot = ?slot,
                period = ?period,
                start_id = ?start_id,
                dry_run = %dry_run,
                "Starting run command"
            );
            commands::run(
                config,
                commands::RunOverrides {
                    slot,
                    period,
                    start_id,
                    dry_run,
                },
            )
            .await?;
        }

        Commands::Probe { metrics } => {
            commands::probe(config, metrics).await?;
        }

        Commands::Ticker { title } => {
            commands::ticker(&title);
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("notice_sentinel=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("notice_sentinel={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    }

    Ok(())
}
