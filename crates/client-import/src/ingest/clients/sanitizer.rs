//! Identifier cleansing
//!
//! Store identifiers are accent-folded and then reduced to digits; the individual
//! identifier is reduced to digits. Every other field passes through untouched.

use super::ClientRecord;
use client_import_common::normalize::{digits_only, fold_accents};

/// Normalize the identifier fields of `record`.
///
/// Idempotent: cleansing an already-cleansed record returns it unchanged.
pub fn cleanse(mut record: ClientRecord) -> ClientRecord {
    record.cpf = digits_only(&record.cpf);
    record.most_frequent_store = cleanse_store(&record.most_frequent_store);
    record.last_purchase_store = cleanse_store(&record.last_purchase_store);
    record
}

fn cleanse_store(raw: &str) -> String {
    digits_only(&fold_accents(raw))
}
