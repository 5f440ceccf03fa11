//! Validity flags for cleansed records

use super::ClientRecord;
use client_import_common::{is_valid_cnpj, is_valid_cpf};

/// Set the three validity flags from the record's current identifiers.
///
/// Meant to run on a cleansed record; invalid identifiers are flagged, never rejected.
pub fn validate(mut record: ClientRecord) -> ClientRecord {
    record.is_cpf_valid = is_valid_cpf(&record.cpf);
    record.is_most_frequent_store_cnpj_valid = is_valid_cnpj(&record.most_frequent_store);
    record.is_last_purchase_store_cnpj_valid = is_valid_cnpj(&record.last_purchase_store);
    record
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ingest::clients::{parser::parse_line, sanitizer::cleanse};

    fn process(line: &str) -> ClientRecord {
        validate(cleanse(parse_line(line).unwrap()))
    }

    #[test]
    fn test_valid_identifiers() {
        let record = process("111.444.777-35 0 0 NULL NULL NULL 11.222.333/0001-81 04.252.011/0001-10");
        assert!(record.is_cpf_valid);
        assert!(record.is_most_frequent_store_cnpj_valid);
        assert!(record.is_last_purchase_store_cnpj_valid);
    }

    #[test]
    fn test_invalid_identifiers_are_flagged() {
        let record = process("111.444.777-36 0 0 NULL NULL NULL 11.222.333/0001-82 NULL");
        assert!(!record.is_cpf_valid);
        assert!(!record.is_most_frequent_store_cnpj_valid);
        assert!(!record.is_last_purchase_store_cnpj_valid);
        // the record itself is kept intact
        assert_eq!(record.cpf, "11144477736");
    }

    #[test]
    fn test_repeated_digits_are_invalid() {
        let record = process("000.000.000-00 0 0 NULL NULL NULL 00.000.000/0000-00 NULL");
        assert!(!record.is_cpf_valid);
        assert!(!record.is_most_frequent_store_cnpj_valid);
    }

    #[test]
    fn test_validate_overwrites_stale_flags() {
        let mut record = process("111.444.777-35 0 0 NULL NULL NULL NULL NULL");
        record.cpf = "123".to_string();
        record.is_last_purchase_store_cnpj_valid = true;

        let record = validate(record);
        assert!(!record.is_cpf_valid);
        assert!(!record.is_last_purchase_store_cnpj_valid);
    }
}
