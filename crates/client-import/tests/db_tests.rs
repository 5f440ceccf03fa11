//! PostgreSQL-backed tests for schema setup, batch atomicity and a full import run
//!
//! Require Docker; run with `cargo test -p client-import --test db_tests -- --ignored`.

mod common;

use client_import::config::{Config, DatabaseConfig, PipelineConfig};
use client_import::db::{connect_with_retry, ensure_schema, health_check};
use client_import::ingest::clients::{
    cleanse, parse_line, run_import, validate, BatchWriteError, BatchWriter, ClientRecord,
    PgClientStorage,
};
use common::{init_test_tracing, TestPostgres};
use sqlx::types::BigDecimal;
use std::io::Write;
use std::str::FromStr;

fn record(line: &str) -> ClientRecord {
    validate(cleanse(parse_line(line).unwrap()))
}

fn sample_batch(size: usize) -> Vec<ClientRecord> {
    (0..size)
        .map(|i| record(&format!("{:011} 0 1 2020-01-{:02} 10,50 NULL NULL NULL", i, i % 28 + 1)))
        .collect()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ensure_schema_is_idempotent() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();

    // already applied once by TestPostgres::start
    ensure_schema(pg.pool()).await.unwrap();
    ensure_schema(pg.pool()).await.unwrap();

    health_check(pg.pool()).await.unwrap();
    assert_eq!(pg.client_count().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_successful_batch_stores_every_row() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();
    let storage = PgClientStorage::new(pg.pool_clone());

    storage.write_batch(&sample_batch(25)).await.unwrap();

    assert_eq!(pg.client_count().await.unwrap(), 25);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_batch_leaves_no_rows() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();
    let storage = PgClientStorage::new(pg.pool_clone());

    let mut batch = sample_batch(10);
    // NUMERIC(10, 2) holds at most 8 integer digits
    batch[7].avg_ticket = Some(BigDecimal::from_str("1000000000000").unwrap());

    let err = storage.write_batch(&batch).await.unwrap_err();
    assert!(matches!(err, BatchWriteError::Insert { rows: 10, .. }));
    assert_eq!(pg.client_count().await.unwrap(), 0);

    // the writer stays usable after a failure
    storage.write_batch(&sample_batch(3)).await.unwrap();
    assert_eq!(pg.client_count().await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_largest_batch_fits_one_statement() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();
    let storage = PgClientStorage::new(pg.pool_clone());

    let size = client_import::config::MAX_BATCH_SIZE;
    storage.write_batch(&sample_batch(size)).await.unwrap();

    assert_eq!(pg.client_count().await.unwrap(), size as i64);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_run_import_end_to_end() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "CPF PRIVATE INCOMPLETO DATA DA ÚLTIMA COMPRA TICKET MÉDIO TICKET DA ÚLTIMA COMPRA LOJA MAIS FREQUÊNTE LOJA DA ÚLTIMA COMPRA"
    )
    .unwrap();
    writeln!(file, "111.444.777-35 0 0 2013-05-05 1000,50 NULL 11.222.333/0001-81 NULL").unwrap();
    writeln!(file, "529.982.247-25 1 1 NULL NULL 12,00 04.252.011/0001-10 NULL").unwrap();
    writeln!(file, "111.444.777-36 0 1 2012-12-24 89,90 89,90 NULL NULL").unwrap();
    file.flush().unwrap();

    let config = Config {
        input: client_import::config::InputConfig {
            path: file.path().to_path_buf(),
        },
        database: DatabaseConfig {
            url: pg.connection_string().to_string(),
            max_connections: 4,
            connect_timeout_secs: 10,
            connect_attempts: 3,
            retry_delay_ms: 100,
        },
        pipeline: PipelineConfig {
            batch_size: 2,
            workers: 2,
        },
    };

    let stats = run_import(&config).await.unwrap();
    assert_eq!(stats.records_written, 3);
    assert_eq!(stats.batches_failed, 0);

    let rows: Vec<(String, bool)> =
        sqlx::query_as("SELECT cpf, is_cpf_valid FROM clients ORDER BY cpf")
            .fetch_all(pg.pool())
            .await
            .unwrap();

    assert_eq!(
        rows,
        vec![
            ("11144477735".to_string(), true),
            ("11144477736".to_string(), false),
            ("52998224725".to_string(), true),
        ]
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_connect_with_retry_against_container() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();

    let config = DatabaseConfig {
        url: pg.connection_string().to_string(),
        max_connections: 2,
        connect_timeout_secs: 5,
        connect_attempts: 3,
        retry_delay_ms: 100,
    };

    let pool = connect_with_retry(&config).await.unwrap();
    health_check(&pool).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_run_import_missing_file_is_fatal() {
    init_test_tracing();
    let pg = TestPostgres::start().await.unwrap();

    let mut config = Config::default();
    config.input.path = "/nonexistent/base_teste.txt".into();
    config.database.url = pg.connection_string().to_string();

    let err = run_import(&config).await.unwrap_err();
    assert!(matches!(
        err,
        client_import::ingest::clients::ImportError::OpenInput { .. }
    ));
}
