//! Runtime value types for field comparison.
//!
//! The [`Value`] enum is what a field getter hands back for one record. It
//! borrows string data from the record, so reading a field never allocates.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};

/// Runtime value of a field, borrowed from the source record.
///
/// # Example
///
/// ```
/// use tabquery::{Number, Value};
///
/// struct Order {
///     customer: String,
///     quantity: u32,
///     note: Option<String>,
/// }
///
/// fn customer(order: &Order) -> Value<'_> {
///     Value::String(&order.customer)
/// }
///
/// fn note(order: &Order) -> Value<'_> {
///     match &order.note {
///         Some(note) => Value::String(note),
///         None => Value::Null,
///     }
/// }
///
/// let order = Order { customer: "Acme".into(), quantity: 3, note: None };
/// assert_eq!(customer(&order), Value::String("Acme"));
/// assert!(note(&order).is_null());
/// assert_eq!(Value::Number(Number::from(order.quantity)).as_number(), Some(Number::U64(3)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Enum discriminant value.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
    /// The field holds no value.
    Null,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Compares two field values of the same type.
///
/// Strings compare case-insensitively. `Null` orders before every other
/// value. Returns `None` for mismatched types and for NaN.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(compare_folded(a, b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),

        _ => None,
    }
}

/// Lower-cases a string for case-insensitive comparison.
///
/// ASCII input takes the cheap path; anything else goes through full
/// Unicode lower-casing.
pub(crate) fn fold_case(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(s.to_ascii_lowercase())
        } else {
            Cow::Borrowed(s)
        }
    } else {
        Cow::Owned(s.to_lowercase())
    }
}

pub(crate) fn compare_folded(a: &str, b: &str) -> Ordering {
    fold_case(a).cmp(&fold_case(b))
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Comparisons between different numeric types are handled by converting
/// to the appropriate common type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Widens integer variants to `i128`. Floats return `None`.
    pub fn to_i128(self) -> Option<i128> {
        match self {
            Number::I64(n) => Some(n as i128),
            Number::U64(n) => Some(n as i128),
            Number::F64(_) => None,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),

            // Integer pairs stay exact; anything involving a float goes through f64
            (Number::I64(a), Number::U64(b)) => Some((a as i128).cmp(&(b as i128))),
            (Number::U64(a), Number::I64(b)) => Some((a as i128).cmp(&(b as i128))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident, $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $wide)
                }
            }
        )*
    };
}

number_from!(I64, i64: i8, i16, i32, i64, isize);
number_from!(U64, u64: u8, u16, u32, u64, usize);
number_from!(F64, f64: f64);

impl From<f32> for Number {
    /// Widens through the shortest decimal form, so `0.1f32` reads as `0.1`
    /// rather than `0.10000000149011612`.
    fn from(n: f32) -> Self {
        Number::F64(n.to_string().parse().unwrap_or(n as f64))
    }
}

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// Record types convert their own date/time representation into this
/// through [`RecordTimestamp`](crate::RecordTimestamp).
///
/// ```
/// use tabquery::Timestamp;
///
/// let ts = Timestamp::from_secs(1_706_500_000);
/// assert_eq!(ts.to_rfc3339().as_deref(), Some("2024-01-29T03:46:40.000Z"));
/// assert!(Timestamp(1000) < Timestamp(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Converts to a UTC date/time, if it is within chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Formats as an RFC 3339 string with millisecond precision.
    pub fn to_rfc3339(self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));
        assert_eq!(
            Value::Number(Number::I64(42)).as_number(),
            Some(Number::I64(42))
        );
        assert!(Value::Null.is_null());

        // Wrong type returns None
        assert_eq!(Value::String("test").as_number(), None);
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Number::U64(10).compare(Number::F64(5.5)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn number_nan_comparison() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
        assert_eq!(Number::F64(1.0).compare(Number::I64(1)), Some(Ordering::Equal));
    }

    #[test]
    fn number_conversions() {
        assert_eq!(Number::from(42i16), Number::I64(42));
        assert_eq!(Number::from(42u8), Number::U64(42));
        assert_eq!(Number::from(2.5f32), Number::F64(2.5));
        assert_eq!(Number::from(0.1f32), Number::F64(0.1));
        assert_eq!(Number::from(-3.3f32), Number::F64(-3.3));
        assert_eq!(Number::from(7usize).to_i128(), Some(7));
        assert_eq!(Number::F64(1.0).to_i128(), None);
    }

    #[test]
    fn compare_values_nulls_first() {
        assert_eq!(
            compare_values(&Value::Null, &Value::Number(Number::I64(0))),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Bool(false), &Value::Null),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&Value::Null, &Value::Null), Some(Ordering::Equal));
    }

    #[test]
    fn compare_values_strings_ignore_case() {
        assert_eq!(
            compare_values(&Value::String("apple"), &Value::String("Banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::String("ÉCOLE"), &Value::String("école")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&Value::String("a"), &Value::Bool(true)),
            None
        );
    }

    #[test]
    fn fold_case_borrows_when_already_lower() {
        assert!(matches!(fold_case("abc"), Cow::Borrowed(_)));
        assert_eq!(fold_case("AbC"), "abc");
    }

    #[test]
    fn timestamp_conversions() {
        assert_eq!(Timestamp::from_secs(1).as_millis(), 1000);
        assert_eq!(Timestamp::from_millis(-1).as_secs(), -1);
        assert_eq!(
            Timestamp(0).to_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
    }
}
