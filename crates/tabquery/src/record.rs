//! Record registration traits.
//!
//! [`Record`] is usually derived with `#[derive(Record)]`, but can be
//! implemented by hand by returning a static [`FieldDescriptor`] table.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::field::{EnumVariant, FieldDescriptor};
use crate::value::Timestamp;

/// A type whose fields can be filtered, sorted and aggregated by name.
///
/// # Derive Usage
///
/// ```
/// use tabquery::{Record, Schema};
///
/// #[derive(Record)]
/// struct Order {
///     customer_name: String,
///     quantity: u32,
///     discount: Option<f64>,
///     #[record(skip)]
///     internal_ref: Vec<u8>,
/// }
///
/// let schema = Schema::<Order>::new().unwrap();
/// assert_eq!(schema.resolve("customerName").unwrap().name(), "CustomerName");
/// assert!(schema.resolve("discount").unwrap().is_nullable());
/// assert!(schema.resolve("internalRef").is_err());
/// assert_eq!(Order::CUSTOMER_NAME, "customerName");
/// ```
///
/// # Manual Implementation
///
/// ```
/// use tabquery::{FieldDescriptor, FieldKind, Record, Value};
///
/// struct Tag {
///     label: String,
/// }
///
/// fn label(tag: &Tag) -> Value<'_> {
///     Value::String(&tag.label)
/// }
///
/// static TAG_FIELDS: &[FieldDescriptor<Tag>] =
///     &[FieldDescriptor::new("Label", FieldKind::String, label)];
///
/// impl Record for Tag {
///     fn fields() -> &'static [FieldDescriptor<Self>] {
///         TAG_FIELDS
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    /// Returns the static table of queryable fields.
    fn fields() -> &'static [FieldDescriptor<Self>];
}

/// Enum types usable as record fields.
///
/// Filter values name a variant (case-insensitively) or give its
/// discriminant; ordering follows the discriminant.
///
/// ```
/// use tabquery::{EnumVariant, RecordEnum};
///
/// #[derive(Clone, Copy)]
/// enum Status {
///     Pending,
///     Shipped,
/// }
///
/// impl RecordEnum for Status {
///     const VARIANTS: &'static [EnumVariant] = &[
///         EnumVariant::new("Pending", 0),
///         EnumVariant::new("Shipped", 1),
///     ];
///
///     fn discriminant(&self) -> u32 {
///         match self {
///             Status::Pending => 0,
///             Status::Shipped => 1,
///         }
///     }
/// }
///
/// assert_eq!(Status::Shipped.discriminant(), 1);
/// ```
pub trait RecordEnum {
    /// Every variant with its stable discriminant.
    const VARIANTS: &'static [EnumVariant];

    /// Returns the discriminant for this variant. Must match [`Self::VARIANTS`].
    fn discriminant(&self) -> u32;
}

/// Date/time types usable as record fields.
pub trait RecordTimestamp {
    /// Converts this value to a [`Timestamp`] for comparison.
    fn record_timestamp(&self) -> Timestamp;
}

impl RecordTimestamp for Timestamp {
    fn record_timestamp(&self) -> Timestamp {
        *self
    }
}

impl RecordTimestamp for i64 {
    fn record_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self)
    }
}

impl RecordTimestamp for u64 {
    fn record_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(i64::try_from(*self).unwrap_or(i64::MAX))
    }
}

impl RecordTimestamp for SystemTime {
    fn record_timestamp(&self) -> Timestamp {
        let millis = match self.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        Timestamp::from_millis(millis)
    }
}

impl RecordTimestamp for DateTime<Utc> {
    fn record_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(self.timestamp_millis())
    }
}

impl RecordTimestamp for NaiveDateTime {
    fn record_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(self.and_utc().timestamp_millis())
    }
}

impl RecordTimestamp for NaiveDate {
    fn record_timestamp(&self) -> Timestamp {
        self.and_time(NaiveTime::MIN).record_timestamp()
    }
}
