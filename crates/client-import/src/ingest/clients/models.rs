// Client import data models

use chrono::NaiveDate;
use sqlx::types::BigDecimal;
use std::fmt;

/// One client line of the import base.
///
/// Built by the parser with the validity flags unset, cleansed and validated inside
/// exactly one worker, then handed to the batch writer, which only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    /// Individual identifier (11 digits once cleansed)
    pub cpf: String,
    pub private: bool,
    pub incomplete: bool,
    pub last_purchase_date: Option<NaiveDate>,
    pub avg_ticket: Option<BigDecimal>,
    pub last_purchase_ticket: Option<BigDecimal>,
    /// Organization identifier of the most frequent store (14 digits once cleansed)
    pub most_frequent_store: String,
    /// Organization identifier of the last purchase store (14 digits once cleansed)
    pub last_purchase_store: String,
    pub is_cpf_valid: bool,
    pub is_most_frequent_store_cnpj_valid: bool,
    pub is_last_purchase_store_cnpj_valid: bool,
}

/// Source columns, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Cpf,
    Private,
    Incomplete,
    LastPurchaseDate,
    AvgTicket,
    LastPurchaseTicket,
    MostFrequentStore,
    LastPurchaseStore,
}

impl Field {
    /// All fields in the order they appear on a line
    pub const ALL: [Field; 8] = [
        Field::Cpf,
        Field::Private,
        Field::Incomplete,
        Field::LastPurchaseDate,
        Field::AvgTicket,
        Field::LastPurchaseTicket,
        Field::MostFrequentStore,
        Field::LastPurchaseStore,
    ];

    /// Header name of the column in the source file
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Cpf => "CPF",
            Field::Private => "PRIVATE",
            Field::Incomplete => "INCOMPLETO",
            Field::LastPurchaseDate => "DATA DA ÚLTIMA COMPRA",
            Field::AvgTicket => "TICKET MÉDIO",
            Field::LastPurchaseTicket => "TICKET DA ÚLTIMA COMPRA",
            Field::MostFrequentStore => "LOJA MAIS FREQUÊNTE",
            Field::LastPurchaseStore => "LOJA DA ÚLTIMA COMPRA",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
