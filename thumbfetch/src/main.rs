//! thumbfetch - display URL enrichment for post batches
//!
//! Subcommands:
//! - `process [INPUT]`: enrich every post in the input batch, resuming after the
//!   last completed item
//! - `retry`: re-attempt every record in the failed namespace
//! - `status`: show namespace counts and the resume point
//!
//! Exit codes: 0 success, 1 fatal error, 2 unreadable or invalid input,
//! 3 retry finished with records still failing.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thumbfetch::services::store_status;
use thumbfetch::Pipeline;
use thumbfetch_common::config::ConfigOverrides;
use thumbfetch_common::FetchConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_RETRY_PENDING: u8 = 3;

/// Command-line arguments for thumbfetch
#[derive(Parser, Debug)]
#[command(name = "thumbfetch")]
#[command(about = "Fetch display image URLs for a batch of posts")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for completed records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for failed records
    #[arg(long, global = true)]
    error_dir: Option<PathBuf>,

    /// Forward proxy for HTTP and HTTPS (overrides PROXY_URL)
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    /// Worker pool size for the selected command
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich every post in a JSON batch
    Process {
        /// JSON array of posts (defaults to the configured input file)
        input: Option<PathBuf>,
    },
    /// Re-attempt records in the failed namespace
    Retry,
    /// Show namespace counts and resume point
    Status,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let (batch_workers, retry_workers) = match self.command {
            Command::Process { .. } => (self.workers, None),
            Command::Retry => (None, self.workers),
            Command::Status => (None, None),
        };

        ConfigOverrides {
            config_path: self.config.clone(),
            data_dir: self.data_dir.clone(),
            error_dir: self.error_dir.clone(),
            proxy_url: self.proxy_url.clone().filter(|p| !p.trim().is_empty()),
            batch_workers,
            retry_workers,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbfetch=info,thumbfetch_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting thumbfetch v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = FetchConfig::resolve(&args.overrides()).context("Failed to load configuration")?;
    info!(
        "Completed: {}, failed: {}",
        config.data_dir.display(),
        config.error_dir.display()
    );

    let pipeline = Pipeline::with_graphql(config).context("Failed to build lookup client")?;
    pipeline
        .init()
        .await
        .context("Failed to create record directories")?;

    match args.command {
        Command::Process { input } => {
            let input = input.unwrap_or_else(|| pipeline.config.input_file.clone());
            info!("Input: {}", input.display());

            match pipeline.batch_processor().process_file(&input).await {
                Ok(_) => Ok(ExitCode::SUCCESS),
                // Already logged by the processor
                Err(_) => Ok(ExitCode::from(EXIT_INVALID_INPUT)),
            }
        }
        Command::Retry => {
            let report = pipeline
                .retry_processor()
                .retry_failed()
                .await
                .context("Failed to list failed records")?;

            if report.remaining() > 0 {
                info!("{} records still failing", report.remaining());
                Ok(ExitCode::from(EXIT_RETRY_PENDING))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Status => {
            let status = store_status(&pipeline.store, &pipeline.progress)
                .await
                .context("Failed to read record directories")?;
            info!("{}", status);
            Ok(ExitCode::SUCCESS)
        }
    }
}
