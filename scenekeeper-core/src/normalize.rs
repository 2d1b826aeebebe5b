//! Text and date normalization used by every matcher.
//!
//! All functions here are total: bad input yields an empty string, an empty
//! token list or `None`, never an error.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

/// Default tolerance, in days, for two dates to be considered the same release.
pub const DEFAULT_DATE_WINDOW_DAYS: i64 = 7;

/// Casefold, strip everything that is not a word character or whitespace,
/// collapse whitespace runs to one space and trim.
///
/// Word characters are Unicode alphanumerics and `_`.
pub fn normalize_text(value: &str) -> String {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim and lowercase without touching punctuation.
///
/// This is the key used for acquisition-side title lookups, where titles
/// are expected to match exactly apart from case.
pub fn fold_title(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Aggressive normalization for studio names: NFKD-decompose, lowercase,
/// then keep ASCII word characters only, with no whitespace at all.
///
/// `"Bound Gang-Bangs!"` and `"boundgangbangs"` normalize to the same key,
/// as do `"Pokémon"` and `"pokemon"`.
pub fn normalize_name_loose(value: &str) -> String {
    value
        .nfkd()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Maximal runs of ASCII digits, in order of appearance.
pub fn number_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in value.char_indices() {
        match (c.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(&value[s..i]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// Hard gate for fuzzy title matching: both titles must carry the same
/// numbers in the same order (compared by value, so `"02"` equals `"2"`).
///
/// Two titles without any numbers are compatible.
pub fn numbers_compatible(a: &str, b: &str) -> bool {
    let ta = number_tokens(a);
    let tb = number_tokens(b);
    ta.len() == tb.len()
        && ta
            .iter()
            .zip(tb.iter())
            .all(|(x, y)| strip_leading_zeros(x) == strip_leading_zeros(y))
}

fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Whether two optional dates fall within `window_days` of each other.
///
/// A missing or unparseable date on either side is a wildcard and matches
/// anything.
pub fn date_match(a: Option<&str>, b: Option<&str>, window_days: i64) -> bool {
    match (a.and_then(parse_date), b.and_then(parse_date)) {
        (Some(da), Some(db)) => (da - db).num_days().abs() <= window_days,
        _ => true,
    }
}

/// Similarity of two (already normalized) titles in `[0, 1]`.
///
/// Two empty titles are identical (`1.0`); exactly one empty title never
/// matches (`0.0`).
pub fn title_similarity(a: &str, b: &str) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => strsim::normalized_levenshtein(a, b),
    }
}

/// Whether `value` has the hyphenated 8-4-4-4-12 shape of a UUID.
pub fn looks_like_uuid(value: &str) -> bool {
    let value = value.trim();
    if value.len() != 36 {
        return false;
    }
    let lengths: Vec<usize> = value.split('-').map(str::len).collect();
    lengths == [8, 4, 4, 4, 12]
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
