//! Shared test utilities for client-import integration tests
//!
//! PostgreSQL-backed tests spin up a throwaway container with testcontainers and need a
//! running Docker daemon; they are `#[ignore]`d by default. Run them with
//! `cargo test -p client-import -- --ignored`.

#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use client_import::db::ensure_schema;
use client_import::ingest::clients::{BatchWriteError, BatchWriter, ClientRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Mutex;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with the `clients` schema applied
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        ensure_schema(&pool)
            .await
            .context("Failed to create clients schema")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub async fn client_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// In-memory batch writer
// ============================================================================

/// Collects committed batches in memory; batches containing a record whose `cpf` is in
/// `fail_on` are rejected whole.
#[derive(Default)]
pub struct MemoryWriter {
    committed: Mutex<Vec<Vec<ClientRecord>>>,
    fail_on: Vec<String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(cpfs: &[&str]) -> Self {
        Self {
            committed: Mutex::new(Vec::new()),
            fail_on: cpfs.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn batches(&self) -> Vec<Vec<ClientRecord>> {
        self.committed.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<ClientRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl BatchWriter for MemoryWriter {
    async fn write_batch(&self, records: &[ClientRecord]) -> Result<(), BatchWriteError> {
        if records.iter().any(|r| self.fail_on.contains(&r.cpf)) {
            return Err(BatchWriteError::Insert {
                rows: records.len(),
                source: sqlx::Error::Protocol("injected failure".to_string()),
            });
        }
        self.committed.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Data line with only the identifier set
pub fn bare_line(cpf: &str) -> String {
    format!("{} 0 0 NULL NULL NULL NULL NULL", cpf)
}

/// Initialize tracing for tests
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,client_import=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
