//! Field resolution: external names to typed accessors.
//!
//! A record type registers a static table of [`FieldDescriptor`]s. A
//! [`Schema`] indexes that table once, then resolves the lower-camel-case
//! names a grid sends (`"customerName"`) to the descriptor registered under
//! the upper-camel form (`"CustomerName"`).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::record::Record;
use crate::value::Value;

/// Semantic type of a field, independent of its Rust representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text.
    String,
    /// `true` / `false`.
    Bool,
    /// Signed or unsigned integer of any width.
    Integer,
    /// `f32` / `f64`.
    Float,
    /// Date/time, compared as milliseconds since the Unix epoch.
    Timestamp,
    /// Enumeration with a fixed variant table.
    Enum(&'static [EnumVariant]),
}

impl FieldKind {
    /// Returns `true` if values of this kind have a natural order usable by
    /// `lt`/`gt` style operators.
    pub fn is_orderable(self) -> bool {
        !matches!(self, FieldKind::Bool)
    }

    /// Returns `true` for integer and float fields.
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }

    /// Looks up the variant name for an enum discriminant.
    pub fn variant_name(self, discriminant: u32) -> Option<&'static str> {
        match self {
            FieldKind::Enum(variants) => variants
                .iter()
                .find(|v| v.discriminant == discriminant)
                .map(|v| v.name),
            _ => None,
        }
    }

    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One variant of an enum field: its name and stable discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    pub name: &'static str,
    pub discriminant: u32,
}

impl EnumVariant {
    pub const fn new(name: &'static str, discriminant: u32) -> Self {
        EnumVariant { name, discriminant }
    }
}

/// Reads one field of a record.
pub type Getter<T> = for<'a> fn(&'a T) -> Value<'a>;

/// Resolved metadata and accessor for one record field.
///
/// Descriptors are plain data (a name, a kind and a function pointer), so
/// tables of them can live in `static` items.
///
/// ```
/// use tabquery::{FieldDescriptor, FieldKind, Number, Value};
///
/// struct Line {
///     quantity: u32,
///     discount: Option<f64>,
/// }
///
/// fn quantity(line: &Line) -> Value<'_> {
///     Value::Number(Number::from(line.quantity))
/// }
///
/// fn discount(line: &Line) -> Value<'_> {
///     line.discount.map_or(Value::Null, |d| Value::Number(Number::from(d)))
/// }
///
/// static FIELDS: &[FieldDescriptor<Line>] = &[
///     FieldDescriptor::new("Quantity", FieldKind::Integer, quantity),
///     FieldDescriptor::new("Discount", FieldKind::Float, discount).nullable(),
/// ];
///
/// let line = Line { quantity: 4, discount: None };
/// assert!(FIELDS[1].is_nullable());
/// assert!(FIELDS[1].value(&line).is_null());
/// ```
pub struct FieldDescriptor<T: 'static> {
    name: &'static str,
    kind: FieldKind,
    nullable: bool,
    getter: Getter<T>,
}

impl<T: 'static> FieldDescriptor<T> {
    /// Creates a non-nullable descriptor.
    ///
    /// `name` is the registered (upper-camel-case) name.
    pub const fn new(name: &'static str, kind: FieldKind, getter: Getter<T>) -> Self {
        FieldDescriptor {
            name,
            kind,
            nullable: false,
            getter,
        }
    }

    /// Marks the field as nullable (its getter may return [`Value::Null`]).
    pub const fn nullable(self) -> Self {
        FieldDescriptor {
            nullable: true,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Reads this field from a record.
    #[inline]
    pub fn value<'a>(&self, record: &'a T) -> Value<'a> {
        (self.getter)(record)
    }
}

impl<T: 'static> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for FieldDescriptor<T> {}

impl<T: 'static> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Uppercases the first character, leaving the remainder unchanged.
///
/// ```
/// use tabquery::to_upper_camel_case;
///
/// assert_eq!(to_upper_camel_case("customerName"), "CustomerName");
/// assert_eq!(to_upper_camel_case("Total"), "Total");
/// ```
pub fn to_upper_camel_case(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            let mut out = String::with_capacity(name.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(name),
    }
}

/// Name index over a record type's field table.
///
/// Built once per record type and reused for every query against it.
pub struct Schema<T: 'static> {
    fields: &'static [FieldDescriptor<T>],
    index: HashMap<&'static str, usize>,
}

impl<T: Record> Schema<T> {
    /// Indexes the fields registered by `T`.
    pub fn new() -> Result<Self> {
        Schema::from_fields(T::fields())
    }
}

impl<T: 'static> Schema<T> {
    /// Indexes an explicit field table.
    ///
    /// Fails on empty or duplicate registered names.
    pub fn from_fields(fields: &'static [FieldDescriptor<T>]) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(QueryError::InvalidSchema {
                    reason: format!("field #{} has an empty name", position),
                });
            }
            if index.insert(field.name, position).is_some() {
                return Err(QueryError::InvalidSchema {
                    reason: format!("field '{}' is registered more than once", field.name),
                });
            }
        }
        Ok(Schema { fields, index })
    }

    /// Resolves an external (lower-camel-case) field name.
    pub fn resolve(&self, external: &str) -> Result<&FieldDescriptor<T>> {
        let registered = to_upper_camel_case(external);
        self.index
            .get(&*registered)
            .map(|&position| &self.fields[position])
            .ok_or_else(|| QueryError::FieldNotFound {
                field: external.to_string(),
            })
    }

    /// Returns the registered field table.
    pub fn fields(&self) -> &'static [FieldDescriptor<T>] {
        self.fields
    }
}

impl<T: 'static> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|field| field.name))
            .finish()
    }
}

impl<T: 'static> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Schema {
            fields: self.fields,
            index: self.index.clone(),
        }
    }
}
