// Client storage layer

use crate::config::MAX_BATCH_SIZE;
use crate::ingest::clients::ClientRecord;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::debug;

/// Failure to persist one batch. The whole batch is rolled back.
#[derive(Debug, Error)]
pub enum BatchWriteError {
    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("Failed to insert batch of {rows} rows: {source}")]
    Insert {
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),

    #[error("Batch of {rows} rows exceeds the {max_rows} rows a single statement can bind")]
    TooManyRows { rows: usize, max_rows: usize },
}

/// Persists a batch of records all-or-nothing.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Insert every record in one transaction. An empty batch succeeds without touching
    /// the store.
    async fn write_batch(&self, records: &[ClientRecord]) -> Result<(), BatchWriteError>;
}

/// Postgres-backed writer for the `clients` relation
#[derive(Clone)]
pub struct PgClientStorage {
    db: PgPool,
}

impl PgClientStorage {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BatchWriter for PgClientStorage {
    async fn write_batch(&self, records: &[ClientRecord]) -> Result<(), BatchWriteError> {
        if records.is_empty() {
            return Ok(());
        }

        if records.len() > MAX_BATCH_SIZE {
            return Err(BatchWriteError::TooManyRows {
                rows: records.len(),
                max_rows: MAX_BATCH_SIZE,
            });
        }

        let mut tx = self.db.begin().await.map_err(BatchWriteError::Begin)?;

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            INSERT INTO clients (
                cpf,
                private,
                incomplete,
                last_purchase_date,
                avg_ticket,
                last_purchase_ticket,
                most_frequent_store,
                last_purchase_store,
                is_cpf_valid,
                is_most_frequent_store_cnpj_valid,
                is_last_purchase_store_cnpj_valid
            )
            "#,
        );

        query_builder.push_values(records, |mut b, record| {
            b.push_bind(&record.cpf)
                .push_bind(record.private)
                .push_bind(record.incomplete)
                .push_bind(record.last_purchase_date)
                .push_bind(&record.avg_ticket)
                .push_bind(&record.last_purchase_ticket)
                .push_bind(&record.most_frequent_store)
                .push_bind(&record.last_purchase_store)
                .push_bind(record.is_cpf_valid)
                .push_bind(record.is_most_frequent_store_cnpj_valid)
                .push_bind(record.is_last_purchase_store_cnpj_valid);
        });

        // Dropping `tx` on the error path rolls the batch back
        query_builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|source| BatchWriteError::Insert {
                rows: records.len(),
                source,
            })?;

        tx.commit().await.map_err(BatchWriteError::Commit)?;

        debug!(rows = records.len(), "Batch committed");

        Ok(())
    }
}
