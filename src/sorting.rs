//! Natural ordering and listing sort.

use crate::types::{DirConfig, DisplayRecord, SortKey, SortOrder};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// A run of digits or a run of everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Number(String),
}

/// Split a name into text and digit runs. Text is NFC-normalized and lowercased.
pub fn tokenize(name: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in name.nfc() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            tokens.push(finish(std::mem::take(&mut current), in_digits));
        }
        in_digits = is_digit;
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(finish(current, in_digits));
    }
    tokens
}

fn finish(run: String, digits: bool) -> Token {
    if digits {
        Token::Number(run)
    } else {
        Token::Text(run)
    }
}

fn cmp_numbers(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Compare names the way people read them: `ep2` before `ep10`, case-insensitive.
///
/// Names equal under that reading fall back to plain string order, so the
/// result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ta = tokenize(a);
    let tb = tokenize(b);

    for (x, y) in ta.iter().zip(tb.iter()) {
        let ord = match (x, y) {
            (Token::Number(x), Token::Number(y)) => cmp_numbers(x, y),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
            (Token::Text(x), Token::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ta.len().cmp(&tb.len()).then_with(|| a.cmp(b))
}

/// Order display records by a directory's preference.
///
/// Size and date ties fall back to ascending natural name order.
pub fn sort_records(records: &mut [DisplayRecord], config: &DirConfig) {
    records.sort_by(|a, b| {
        let primary = match config.sort {
            SortKey::Name => natural_cmp(&a.name, &b.name),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::DateModified => a.date_modified.cmp(&b.date_modified),
        };
        let primary = match config.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| natural_cmp(&a.name, &b.name))
    });
}
