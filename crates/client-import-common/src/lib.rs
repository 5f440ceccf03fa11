//! Client Import Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared building blocks for the client import workspace.
//!
//! # Overview
//!
//! - **Checksums**: CPF and CNPJ check-digit validation
//! - **Normalization**: accent folding and digit filtering for identifier fields
//! - **Logging**: centralized `tracing` subscriber setup
//!
//! # Example
//!
//! ```
//! use client_import_common::checksum::{is_valid_cnpj, is_valid_cpf};
//! use client_import_common::normalize::digits_only;
//!
//! assert!(is_valid_cpf(&digits_only("111.444.777-35")));
//! assert!(is_valid_cnpj("11222333000181"));
//! ```

pub mod checksum;
pub mod logging;
pub mod normalize;

// Re-export commonly used functions
pub use checksum::{is_valid_cnpj, is_valid_cpf};
