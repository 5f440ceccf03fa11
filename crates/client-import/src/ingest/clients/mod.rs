//! Client base import
//!
//! Loads the flat-file client base into the `clients` relation. A run goes through
//! bootstrapping (connection and schema), draining (reading and dispatching lines) and
//! flushing (workers committing what they still hold).
//!
//! # Input format
//!
//! A header line, then one client per line with 8 whitespace-separated columns:
//!
//! ```text
//! CPF                PRIVATE  INCOMPLETO  DATA DA ÚLTIMA COMPRA  TICKET MÉDIO  TICKET DA ÚLTIMA COMPRA  LOJA MAIS FREQUÊNTE  LOJA DA ÚLTIMA COMPRA
//! 041.091.641-25     0        0           NULL                   NULL          NULL                     NULL                 NULL
//! 058.189.421-98     0        0           2010-05-13             186,37        186,37                   79.379.491/0008-50   79.379.491/0008-50
//! ```

pub mod models;
pub mod parser;
pub mod pipeline;
pub mod sanitizer;
pub mod storage;
pub mod validation;

pub use models::{ClientRecord, Field};
pub use parser::{parse_fields, parse_line, split_line, ParseError, FIELD_COUNT};
pub use pipeline::{ClientPipeline, PipelineError, PipelineStats, RunPhase};
pub use sanitizer::cleanse;
pub use storage::{BatchWriteError, BatchWriter, PgClientStorage};
pub use validation::validate;

use crate::config::Config;
use crate::db::{connect_with_retry, ensure_schema, DbError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::io::BufReader;
use tracing::{error, info};

/// Fatal errors that abort an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Failed to open input file {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Run a whole import: connect, ensure the schema, then stream the input file through
/// the pipeline.
pub async fn run_import(config: &Config) -> Result<PipelineStats, ImportError> {
    let start = Instant::now();

    let result = bootstrap_and_run(config).await;

    match &result {
        Ok(stats) => info!(
            phase = %RunPhase::Done,
            elapsed_ms = start.elapsed().as_millis() as u64,
            lines_read = stats.lines_read,
            lines_skipped = stats.lines_skipped,
            records_written = stats.records_written,
            batches_written = stats.batches_written,
            batches_failed = stats.batches_failed,
            records_lost = stats.records_lost,
            "Import finished in {:?}",
            start.elapsed()
        ),
        Err(e) => error!(
            phase = %RunPhase::FatalAborted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            error = %e,
            "Import aborted"
        ),
    }

    result
}

async fn bootstrap_and_run(config: &Config) -> Result<PipelineStats, ImportError> {
    config
        .validate()
        .map_err(|e| ImportError::Config(e.to_string()))?;

    info!(phase = %RunPhase::Bootstrapping, "Connecting to database");
    let pool = connect_with_retry(&config.database).await?;

    ensure_schema(&pool).await?;

    let path = &config.input.path;
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ImportError::OpenInput {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), "Importing client base");

    let storage = Arc::new(PgClientStorage::new(pool.clone()));
    let pipeline = ClientPipeline::new(storage, config.pipeline);
    let stats = pipeline.run(BufReader::new(file)).await;

    pool.close().await;

    Ok(stats?)
}
