//! Connection bootstrap with bounded linear backoff
//!
//! The database may still be starting when the importer launches (e.g. under
//! docker-compose), so the first connection is retried: attempt `n` that fails waits
//! `n × delay_unit` before attempt `n + 1`. A failed attempt closes its pool before the
//! next one opens. Only this initial acquisition retries; everything downstream is one-shot.

use super::{health_check, DbError, DbResult};
use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many times to try and how long to wait between tries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_unit: Duration) -> Self {
        Self {
            max_attempts,
            delay_unit,
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay_unit.saturating_mul(attempt)
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self::new(config.connect_attempts, config.retry_delay())
    }
}

/// The operation failed on every attempt; carries the last error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// `operation` receives the 1-based attempt number. A policy with zero attempts still
/// makes one attempt.
pub async fn retry_linear<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: error,
                });
            },
            Err(error) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
        }
    }
}

/// Acquire a live connection pool, retrying per the configured policy.
///
/// A malformed URL fails immediately with [`DbError::Config`]. Exhausting all attempts
/// yields [`DbError::ConnectRetriesExhausted`] wrapping the last connection error.
pub async fn connect_with_retry(config: &DatabaseConfig) -> DbResult<PgPool> {
    let options: PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| DbError::config(format!("invalid database URL: {}", e)))?;

    let policy = RetryPolicy::from(config);

    let pool = retry_linear(&policy, move |attempt| {
        let options = options.clone();
        async move {
            debug!(attempt, "Opening database connection");
            open_and_ping(config, options).await
        }
    })
    .await
    .map_err(|exhausted| DbError::ConnectRetriesExhausted {
        attempts: exhausted.attempts,
        source: exhausted.last_error,
    })?;

    info!(
        max_connections = config.max_connections,
        "Connection to PostgreSQL established"
    );

    Ok(pool)
}

async fn open_and_ping(
    config: &DatabaseConfig,
    options: PgConnectOptions,
) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .connect_lazy_with(options);

    if let Err(error) = health_check(&pool).await {
        pool.close().await;
        return Err(error);
    }

    Ok(pool)
}
