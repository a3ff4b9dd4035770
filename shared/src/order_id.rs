//! Order identifier codec
//!
//! # Format
//!
//! ```text
//! D D M M S S S S
//! └─┘ └─┘ └─────┘
//! day month sequence (zero-padded, 1..=999)
//! ```
//!
//! Example: `"14010001"` = 14 January, first order of the day.
//!
//! The date key is the same day/month pair as an integer (`day * 100 + month`),
//! so the first four characters of an ID always equal its zero-padded date key.
//! Calendar correctness is not checked: 30 February encodes and parses fine.

use std::fmt;
use thiserror::Error;

/// Total length of an order ID
pub const ORDER_ID_LEN: usize = 8;

/// Width of the sequence field
pub const SEQUENCE_WIDTH: usize = 4;

/// Highest sequence number a single date can hand out
pub const MAX_SEQUENCE: u32 = 999;

/// Smallest plausible date key (1 January)
pub const MIN_DATE_KEY: u32 = 101;

/// Largest plausible date key (31 December)
pub const MAX_DATE_KEY: u32 = 3112;

/// Field of an order ID, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    Day,
    Month,
    Sequence,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdField::Day => write!(f, "day"),
            IdField::Month => write!(f, "month"),
            IdField::Sequence => write!(f, "sequence"),
        }
    }
}

impl IdField {
    fn bounds(self) -> (u32, u32) {
        match self {
            IdField::Day => (1, 31),
            IdField::Month => (1, 12),
            IdField::Sequence => (1, MAX_SEQUENCE),
        }
    }

    fn check(self, value: u32) -> Result<u32, OrderIdError> {
        let (min, max) = self.bounds();
        if value < min || value > max {
            return Err(OrderIdError::Range { field: self, value });
        }
        Ok(value)
    }
}

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderIdError {
    /// A component is outside its valid numeric range (generation side)
    #[error("{field} out of range: {value}")]
    Range { field: IdField, value: u32 },

    /// The string is not a well-formed order ID (parsing side)
    #[error("invalid order ID: {0}")]
    Format(String),
}

impl OrderIdError {
    /// `true` when the sequence component overflowed
    pub fn is_sequence_exhausted(&self) -> bool {
        matches!(
            self,
            OrderIdError::Range {
                field: IdField::Sequence,
                value,
            } if *value > MAX_SEQUENCE
        )
    }
}

/// Decoded components of an order ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIdParts {
    pub day: u32,
    pub month: u32,
    pub sequence: u32,
}

impl OrderIdParts {
    pub fn date_key(&self) -> u32 {
        encode_date_key(self.day, self.month)
    }
}

/// `day * 100 + month`, e.g. 14 January → 1401
pub fn encode_date_key(day: u32, month: u32) -> u32 {
    day * 100 + month
}

/// Split a date key back into `(day, month)` without validating either part
pub fn decode_date_key(date_key: u32) -> (u32, u32) {
    (date_key / 100, date_key % 100)
}

/// Mint an order ID from its components
pub fn generate_order_id(day: u32, month: u32, sequence: u32) -> Result<String, OrderIdError> {
    IdField::Day.check(day)?;
    IdField::Month.check(month)?;
    IdField::Sequence.check(sequence)?;

    Ok(format!(
        "{:02}{:02}{:0width$}",
        day,
        month,
        sequence,
        width = SEQUENCE_WIDTH
    ))
}

/// Parse an order ID into its components
pub fn parse_order_id(id: &str) -> Result<OrderIdParts, OrderIdError> {
    if id.len() != ORDER_ID_LEN {
        return Err(OrderIdError::Format(format!(
            "expected {} characters, got {}",
            ORDER_ID_LEN,
            id.len()
        )));
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OrderIdError::Format(format!("non-digit character in {:?}", id)));
    }

    let day = parse_field(id, 0..2, IdField::Day)?;
    let month = parse_field(id, 2..4, IdField::Month)?;
    let sequence = parse_field(id, 4..ORDER_ID_LEN, IdField::Sequence)?;

    Ok(OrderIdParts {
        day,
        month,
        sequence,
    })
}

fn parse_field(id: &str, range: std::ops::Range<usize>, field: IdField) -> Result<u32, OrderIdError> {
    let raw = &id[range];
    let value: u32 = raw
        .parse()
        .map_err(|_| OrderIdError::Format(format!("invalid {} {:?}", field, raw)))?;
    field
        .check(value)
        .map_err(|_| OrderIdError::Format(format!("{} out of range: {}", field, value)))
}

/// `true` iff `id` parses and carries `expected_date_key`
pub fn validate_order_id_format(id: &str, expected_date_key: u32) -> bool {
    parse_order_id(id)
        .map(|parts| parts.date_key() == expected_date_key)
        .unwrap_or(false)
}
