//! Client Import - flat-file client base loader

use anyhow::Result;
use clap::Parser;
use client_import::config::Config;
use client_import::ingest::clients;
use client_import_common::logging::{init_logging, LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "client-import")]
#[command(author, version, about = "Import the client base into PostgreSQL")]
struct Cli {
    /// Input file (header line followed by one client per line)
    #[arg(short, long, env = "IMPORT_INPUT_PATH")]
    input: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Records per committed batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("client-import")
        .build()
        .with_env_overrides()?;

    let _guard = init_logging(&log_config)?;

    let mut config = Config::from_env();
    if let Some(input) = cli.input {
        config.input.path = input;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(batch_size) = cli.batch_size {
        config.pipeline.batch_size = batch_size;
    }
    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }

    let stats = clients::run_import(&config).await?;

    info!(
        records_written = stats.records_written,
        records_lost = stats.records_lost,
        "Import complete"
    );
    Ok(())
}
