//! Coercion of raw filter literals into typed operands.
//!
//! Filter values arrive as strings. Each leaf converts its value once, at
//! compile time, into the [`Operand`] matching the field's [`FieldKind`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::field::FieldKind;
use crate::value::{fold_case, Number, Timestamp};

/// Owned comparison value stored in a compiled filter leaf.
///
/// Unlike [`Value`](crate::Value), which borrows from a record, an operand
/// owns its data. String operands are stored case-folded.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Case-folded string.
    String(String),
    /// Numeric value.
    Number(Number),
    /// Timestamp value.
    Timestamp(Timestamp),
    /// Enum discriminant.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
}

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Converts `raw` into an operand for a field of `kind`.
///
/// Returns `None` when the literal cannot be read as that kind.
///
/// ```
/// use tabquery::{coerce, FieldKind, Number, Operand};
///
/// assert_eq!(coerce(FieldKind::Integer, " 42 "), Some(Operand::Number(Number::I64(42))));
/// assert_eq!(coerce(FieldKind::Bool, "TRUE"), Some(Operand::Bool(true)));
/// assert_eq!(coerce(FieldKind::Integer, "4.5"), None);
/// ```
pub fn coerce(kind: FieldKind, raw: &str) -> Option<Operand> {
    match kind {
        FieldKind::String => Some(Operand::String(fold_case(raw).into_owned())),
        FieldKind::Bool => parse_bool(raw.trim()).map(Operand::Bool),
        FieldKind::Integer => parse_integer(raw.trim()).map(Operand::Number),
        FieldKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| Operand::Number(Number::F64(f))),
        FieldKind::Timestamp => parse_timestamp(raw.trim()).map(Operand::Timestamp),
        FieldKind::Enum(variants) => {
            let raw = raw.trim();
            variants
                .iter()
                .find(|v| v.name.eq_ignore_ascii_case(raw))
                .or_else(|| {
                    let discriminant = raw.parse::<u32>().ok()?;
                    variants.iter().find(|v| v.discriminant == discriminant)
                })
                .map(|v| Operand::Enum(v.discriminant))
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_integer(raw: &str) -> Option<Number> {
    raw.parse::<i64>()
        .map(Number::I64)
        .or_else(|_| raw.parse::<u64>().map(Number::U64))
        .ok()
}

/// Parses the date/time spellings a grid is likely to send.
///
/// Accepts RFC 3339, naive date-times (read as UTC), plain dates, and
/// integer milliseconds since the Unix epoch.
pub(crate) fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Some(Timestamp::from_millis(millis));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp::from_millis(dt.timestamp_millis()));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Timestamp::from_millis(dt.and_utc().timestamp_millis()));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| Timestamp::from_millis(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis()))
}
