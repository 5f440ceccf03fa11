//! Pipeline coordinator
//!
//! One producer reads the input line by line, parses each line and pushes the record onto a
//! bounded queue. A fixed pool of workers shares the receiving end; each worker cleanses and
//! validates what it pulls, buffers it, and flushes the buffer through the [`BatchWriter`]
//! when it fills up and once more when the queue closes.
//!
//! Failures below the run level are isolated: a malformed line is skipped, a failed batch
//! is logged and counted, and neither stops the producer or any other worker.

use super::parser::parse_line;
use super::sanitizer::cleanse;
use super::storage::BatchWriter;
use super::validation::validate;
use super::ClientRecord;
use crate::config::PipelineConfig;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Run-level pipeline failures
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Empty file or header problem: no header line found")]
    MissingHeader,

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Stage of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Bootstrapping,
    Draining,
    Flushing,
    Done,
    FatalAborted,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Bootstrapping => "bootstrapping",
            RunPhase::Draining => "draining",
            RunPhase::Flushing => "flushing",
            RunPhase::Done => "done",
            RunPhase::FatalAborted => "fatal_aborted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Data lines read after the header
    pub lines_read: usize,
    /// Lines skipped for a wrong token count or an unparsable field
    pub lines_skipped: usize,
    /// Records handed to the worker pool
    pub records_dispatched: usize,
    /// Records in committed batches
    pub records_written: usize,
    pub batches_written: usize,
    pub batches_failed: usize,
    /// Records in failed batches; never retried
    pub records_lost: usize,
}

impl PipelineStats {
    fn absorb(&mut self, worker: &WorkerStats) {
        self.records_written += worker.records_written;
        self.batches_written += worker.batches_written;
        self.batches_failed += worker.batches_failed;
        self.records_lost += worker.records_lost;
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    records_written: usize,
    batches_written: usize,
    batches_failed: usize,
    records_lost: usize,
}

/// Bounded-queue fan-out from a line reader to a pool of batching workers
pub struct ClientPipeline<W> {
    writer: Arc<W>,
    config: PipelineConfig,
}

impl<W> ClientPipeline<W>
where
    W: BatchWriter + 'static,
{
    pub fn new(writer: Arc<W>, config: PipelineConfig) -> Self {
        Self { writer, config }
    }

    /// Consume `reader` to the end and wait for every worker to finish.
    ///
    /// The first line is the header and is discarded; an input without one fails with
    /// [`PipelineError::MissingHeader`] before any worker starts.
    pub async fn run<R>(&self, reader: R) -> Result<PipelineStats, PipelineError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.split(b'\n');

        if lines.next_segment().await?.is_none() {
            return Err(PipelineError::MissingHeader);
        }

        let workers = self.config.workers.max(1);
        let batch_size = self.config.batch_size.max(1);
        let (sender, receiver) = mpsc::channel::<ClientRecord>(self.config.queue_capacity().max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let writer = Arc::clone(&self.writer);
                tokio::spawn(run_worker(worker_id, receiver, writer, batch_size))
            })
            .collect();

        info!(phase = %RunPhase::Draining, workers, batch_size, "Reading input");

        let mut stats = PipelineStats::default();
        let mut line_number: usize = 1;

        loop {
            let mut segment = match lines.next_segment().await {
                Ok(Some(segment)) => segment,
                Ok(None) => break,
                Err(e) => {
                    error!(line_number = line_number + 1, error = %e, "Error reading input file");
                    break;
                },
            };
            line_number += 1;
            stats.lines_read += 1;

            if segment.last() == Some(&b'\r') {
                segment.pop();
            }
            let line = String::from_utf8_lossy(&segment);

            let record = match parse_line(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line_number, line = %line, error = %e, "Skipping line");
                    stats.lines_skipped += 1;
                    continue;
                },
            };

            if sender.send(record).await.is_err() {
                error!(line_number, "All workers stopped; no longer dispatching records");
                break;
            }
            stats.records_dispatched += 1;
        }

        // Closing the queue is what lets the workers finish
        drop(sender);
        debug!(phase = %RunPhase::Flushing, "Input exhausted, waiting for workers");

        for result in futures::future::join_all(handles).await {
            stats.absorb(&result?);
        }

        Ok(stats)
    }
}

async fn run_worker<W>(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ClientRecord>>>,
    writer: Arc<W>,
    batch_size: usize,
) -> WorkerStats
where
    W: BatchWriter,
{
    let mut stats = WorkerStats::default();
    let mut batch: Vec<ClientRecord> = Vec::with_capacity(batch_size);

    loop {
        let next = {
            let mut rx = receiver.lock().await;
            rx.recv().await
        };

        let Some(record) = next else {
            break;
        };

        batch.push(validate(cleanse(record)));

        if batch.len() >= batch_size {
            flush(worker_id, writer.as_ref(), &mut batch, &mut stats).await;
        }
    }

    if !batch.is_empty() {
        flush(worker_id, writer.as_ref(), &mut batch, &mut stats).await;
    }

    debug!(
        worker_id,
        records_written = stats.records_written,
        batches_failed = stats.batches_failed,
        "Worker finished"
    );

    stats
}

async fn flush<W>(worker_id: usize, writer: &W, batch: &mut Vec<ClientRecord>, stats: &mut WorkerStats)
where
    W: BatchWriter + ?Sized,
{
    let rows = batch.len();

    match writer.write_batch(batch).await {
        Ok(()) => {
            stats.records_written += rows;
            stats.batches_written += 1;
        },
        Err(e) => {
            error!(worker_id, rows, error = %e, "Error inserting batch");
            stats.records_lost += rows;
            stats.batches_failed += 1;
        },
    }

    batch.clear();
}
