//! Word count: one record per alphabetic token.
//!

use crate::Record;

/// Split `line` on runs of whitespace and emit `(word, 1)` for every token
/// that still has letters left after [`normalize`].
pub fn map(line: &str) -> Vec<Record> {
    line.split_whitespace()
        .map(normalize)
        .filter(|word| !word.is_empty())
        .map(Record::one)
        .collect()
}

/// Drop every character that is not an ASCII letter and lowercase the rest.
pub fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
