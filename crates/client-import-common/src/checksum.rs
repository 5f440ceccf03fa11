//! Check-digit validation for Brazilian national identifiers
//!
//! Both identifiers end in two check digits computed with the same modulus-11 rule:
//! `d = 11 - (weighted_sum mod 11)`, with results of 10 or 11 collapsing to 0. The second
//! check digit is computed over the base digits followed by the first check digit.
//!
//! - **CPF**: 11 digits, weights 10..2 then 11..2
//! - **CNPJ**: 14 digits, weights `5,4,3,2,9,8,7,6,5,4,3,2` then `6,5,4,3,2,9,8,7,6,5,4,3,2`
//!
//! Inputs are digit-filtered before validation, so `"111.444.777-35"` and `"11144477735"`
//! are equivalent.

use crate::normalize::digits_only;

/// Number of digits in a CPF
pub const CPF_LENGTH: usize = 11;

/// Number of digits in a CNPJ
pub const CNPJ_LENGTH: usize = 14;

/// Weights for the first CPF check digit (over digits 0..9)
pub const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the second CPF check digit (over digits 0..10)
pub const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the first CNPJ check digit (over digits 0..12)
pub const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Weights for the second CNPJ check digit (over digits 0..13)
pub const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Compute a modulus-11 check digit for `digits` using `weights`.
///
/// Only the first `weights.len()` digits are considered. `digits` holds numeric values
/// (0-9), not ASCII characters.
pub fn check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(digit, weight)| u32::from(*digit) * weight)
        .sum();

    let digit = 11 - (sum % 11);
    if digit >= 10 {
        0
    } else {
        digit as u8
    }
}

/// Check whether `cpf` is a numerically valid CPF.
pub fn is_valid_cpf(cpf: &str) -> bool {
    validate(cpf, CPF_LENGTH, &CPF_FIRST_WEIGHTS, &CPF_SECOND_WEIGHTS)
}

/// Check whether `cnpj` is a numerically valid CNPJ.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    validate(cnpj, CNPJ_LENGTH, &CNPJ_FIRST_WEIGHTS, &CNPJ_SECOND_WEIGHTS)
}

fn validate(raw: &str, length: usize, first_weights: &[u32], second_weights: &[u32]) -> bool {
    let Some(digits) = to_digits(raw, length) else {
        return false;
    };

    // Sequences like 00000000000 pass the arithmetic but are never issued
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = check_digit(&digits, first_weights);
    if digits[length - 2] != first {
        return false;
    }

    let second = check_digit(&digits, second_weights);
    digits[length - 1] == second
}

/// Digit-filter `raw` and convert it into numeric digit values when exactly `length` remain.
fn to_digits(raw: &str, length: usize) -> Option<Vec<u8>> {
    let filtered = digits_only(raw);
    if filtered.len() != length {
        return None;
    }

    Some(filtered.bytes().map(|b| b - b'0').collect())
}
