// Client base line parser
//
// Each data line holds 8 whitespace-separated tokens:
//   CPF PRIVATE INCOMPLETE LAST_PURCHASE_DATE AVG_TICKET LAST_PURCHASE_TICKET
//   MOST_FREQUENT_STORE LAST_PURCHASE_STORE
//
// Optional columns use an empty token or the literal NULL for "absent"; decimals may use a
// comma separator. Identifier columns are kept verbatim here and cleansed later.

use crate::ingest::clients::{ClientRecord, Field};
use chrono::NaiveDate;
use sqlx::types::BigDecimal;
use std::str::FromStr;
use thiserror::Error;

/// Number of tokens on a data line
pub const FIELD_COUNT: usize = Field::ALL.len();

/// Token standing for an absent optional value
pub const NULL_TOKEN: &str = "NULL";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field-scoped parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field} value '{raw}': {reason}")]
    InvalidField {
        field: Field,
        raw: String,
        reason: String,
    },
}

impl ParseError {
    fn invalid(field: Field, raw: &str, reason: impl ToString) -> Self {
        Self::InvalidField {
            field,
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Split a raw line on runs of whitespace.
pub fn split_line(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Split and parse one raw data line.
pub fn parse_line(line: &str) -> Result<ClientRecord, ParseError> {
    parse_fields(&split_line(line))
}

/// Build a record from exactly [`FIELD_COUNT`] tokens.
///
/// Validity flags are left `false`; they are assigned after cleansing.
pub fn parse_fields(fields: &[&str]) -> Result<ClientRecord, ParseError> {
    let [cpf, private, incomplete, last_purchase_date, avg_ticket, last_purchase_ticket, most_frequent_store, last_purchase_store] =
        fields
    else {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    };

    Ok(ClientRecord {
        cpf: cpf.trim().to_string(),
        private: parse_flag(Field::Private, private)?,
        incomplete: parse_flag(Field::Incomplete, incomplete)?,
        last_purchase_date: parse_optional_date(Field::LastPurchaseDate, last_purchase_date)?,
        avg_ticket: parse_optional_decimal(Field::AvgTicket, avg_ticket)?,
        last_purchase_ticket: parse_optional_decimal(
            Field::LastPurchaseTicket,
            last_purchase_ticket,
        )?,
        most_frequent_store: most_frequent_store.trim().to_string(),
        last_purchase_store: last_purchase_store.trim().to_string(),
        is_cpf_valid: false,
        is_most_frequent_store_cnpj_valid: false,
        is_last_purchase_store_cnpj_valid: false,
    })
}

/// `1` is true, any other integer is false.
fn parse_flag(field: Field, raw: &str) -> Result<bool, ParseError> {
    raw.trim()
        .parse::<i64>()
        .map(|value| value == 1)
        .map_err(|e| ParseError::invalid(field, raw, e))
}

fn is_absent(value: &str) -> bool {
    value.is_empty() || value == NULL_TOKEN
}

fn parse_optional_date(field: Field, raw: &str) -> Result<Option<NaiveDate>, ParseError> {
    let value = raw.trim();
    if is_absent(value) {
        return Ok(None);
    }

    // chrono accepts signed years and unpadded months and days; the base never has them
    let bytes = value.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if matches!(i, 4 | 7) { *b == b'-' } else { b.is_ascii_digit() });
    if !well_shaped {
        return Err(ParseError::invalid(field, raw, "expected YYYY-MM-DD"));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|e| ParseError::invalid(field, raw, e))
}

fn parse_optional_decimal(field: Field, raw: &str) -> Result<Option<BigDecimal>, ParseError> {
    let value = raw.trim();
    if is_absent(value) {
        return Ok(None);
    }

    BigDecimal::from_str(&value.replace(',', "."))
        .map(Some)
        .map_err(|e| ParseError::invalid(field, raw, e))
}
