//! Client base importer
//!
//! Bulk-loads the flat-file client base into PostgreSQL. Each line is parsed, its
//! identifiers are cleansed and checksum-validated, and records are committed in
//! fixed-size batches by a pool of concurrent workers.
//!
//! # Example
//!
//! ```no_run
//! use client_import::{config::Config, ingest::clients};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let stats = clients::run_import(&config).await?;
//!     println!("{} records written", stats.records_written);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod db;
pub mod ingest;
