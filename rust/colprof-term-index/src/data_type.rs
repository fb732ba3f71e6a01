//! Type labels attached to terms.

use std::fmt;

use colprof_common::{Result, error::Error};

/// Detected type of a term value, stored in the term index by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Text = 0,
    Integer = 1,
    Decimal = 2,
    Date = 3,
}

impl DataType {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<DataType> {
        match id {
            0 => Ok(DataType::Text),
            1 => Ok(DataType::Integer),
            2 => Ok(DataType::Decimal),
            3 => Ok(DataType::Date),
            _ => Err(Error::invalid_arg("type_id", format!("unknown type id {id}"))),
        }
    }

    pub fn is_text(self) -> bool {
        self == DataType::Text
    }

    /// Detects the type of an already normalized value.
    ///
    /// Recognizes signed integers, signed decimals (with optional `,`
    /// thousands separators) and `YYYY-MM-DD` / `MM/DD/YYYY` dates. Anything
    /// else is text.
    pub fn detect(value: &str) -> DataType {
        if is_date(value) {
            DataType::Date
        } else if let Some(has_fraction) = numeric_shape(value) {
            if has_fraction {
                DataType::Decimal
            } else {
                DataType::Integer
            }
        } else {
            DataType::Text
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
        };
        f.write_str(name)
    }
}

/// Returns `Some(has_fraction)` if `value` is a plain number.
fn numeric_shape(value: &str) -> Option<bool> {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    if whole.is_empty() && fraction.is_none_or(str::is_empty) {
        return None;
    }
    if !is_grouped_digits(whole) {
        return None;
    }
    match fraction {
        Some(fraction) if !fraction.bytes().all(|b| b.is_ascii_digit()) => None,
        Some(fraction) => Some(!fraction.is_empty() || whole.is_empty()),
        None => Some(false),
    }
}

/// Plain digits, or digit groups of three separated by commas.
fn is_grouped_digits(s: &str) -> bool {
    if !s.contains(',') {
        return s.bytes().all(|b| b.is_ascii_digit());
    }
    let mut groups = s.split(',');
    let first = groups.next().unwrap_or_default();
    (1..=3).contains(&first.len())
        && first.bytes().all(|b| b.is_ascii_digit())
        && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn is_date(value: &str) -> bool {
    let parts = |sep: char| value.split(sep).collect::<Vec<_>>();
    let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    let in_range = |s: &str, lo: u32, hi: u32| s.parse::<u32>().is_ok_and(|n| (lo..=hi).contains(&n));

    let iso = parts('-');
    if iso.len() == 3 && all_digits(iso[0], 4) && all_digits(iso[1], 2) && all_digits(iso[2], 2) {
        return in_range(iso[1], 1, 12) && in_range(iso[2], 1, 31);
    }
    let us = parts('/');
    if us.len() == 3
        && (1..=2).contains(&us[0].len())
        && (1..=2).contains(&us[1].len())
        && all_digits(us[2], 4)
    {
        return in_range(us[0], 1, 12) && in_range(us[1], 1, 31);
    }
    false
}
