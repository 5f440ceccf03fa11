//! Text normalization primitives

/// Uppercase `s` and replace accented Latin vowels and `Ç` with their plain equivalents.
///
/// Only the fixed table below is folded; any other character passes through uppercased.
pub fn fold_accents(s: &str) -> String {
    s.to_uppercase().chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'Á' | 'À' | 'Ã' | 'Â' => 'A',
        'É' | 'Ê' => 'E',
        'Í' => 'I',
        'Ó' | 'Õ' | 'Ô' => 'O',
        'Ú' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

/// Keep only ASCII digits from `s`.
///
/// Other Unicode decimal digits (Arabic-Indic, fullwidth, ...) are dropped rather than kept,
/// so they never reach the check-digit arithmetic and never appear in a stored identifier.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
