//! Data ingestion
//!
//! Each submodule owns one source format end to end: parsing, normalization and storage.

pub mod clients;
