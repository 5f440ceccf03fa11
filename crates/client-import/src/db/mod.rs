//! Database access: connection bootstrap, health checks and schema setup

pub mod bootstrap;

pub use bootstrap::{connect_with_retry, retry_linear, RetryExhausted, RetryPolicy};

use sqlx::postgres::PgPool;
use thiserror::Error;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// Every connection attempt failed
    #[error("Failed to connect to the database after {attempts} attempts: {source}")]
    ConnectRetriesExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Schema migration failed
    #[error("Failed to ensure database schema: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Liveness check used by the bootstrapper before handing out a pool.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Create the `clients` relation if it does not exist.
///
/// Safe to run on every start; already-applied migrations are skipped.
pub async fn ensure_schema(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Table 'clients' created/verified");
    Ok(())
}
