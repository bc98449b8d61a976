//! Proc macros for tabquery.
//!
//! This crate provides the [`Record`] derive, which turns a plain struct
//! into a queryable record type by generating its static field registry at
//! compile time. Use it through the `tabquery` crate, which re-exports it
//! alongside the trait of the same name.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for a struct with named fields.
///
/// # Field Kinds
///
/// Each field's kind is inferred from its type, or set explicitly:
///
/// | Attribute | Inferred from | Operators |
/// |-----------|---------------|-----------|
/// | `String` | `String` | all |
/// | `Integer` | `i8`..`i64`, `u8`..`u64`, `isize`, `usize` | equality, ordering, null |
/// | `Float` | `f32`, `f64` | equality, ordering, null |
/// | `Timestamp` | `Timestamp`, `SystemTime`, `DateTime`, `NaiveDateTime`, `NaiveDate` | equality, ordering, null |
/// | `Bool` | `bool` | equality, null |
/// | `Enum` (or `ty = "enum"`) | never; requires a `RecordEnum` impl | equality, ordering, null |
///
/// `Option<T>` fields register as nullable with the kind of `T`. Fields
/// whose kind cannot be inferred and has no attribute are left out.
///
/// # Other Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | External name to use instead of the lower-camel field name |
///
/// # Generated Code
///
/// 1. External name constants (e.g., `Order::CUSTOMER_NAME == "customerName"`)
/// 2. One hidden getter per registered field
/// 3. `Record::fields()`, returning a static table in which `customer_name`
///    is registered as `"CustomerName"`
///
/// # Example
///
/// ```ignore
/// use tabquery::{Record, RecordEnum};
///
/// #[derive(Record)]
/// struct Ticket {
///     title: String,
///     priority: u8,
///     #[record(Enum)]
///     status: Status,
///     closed_at: Option<chrono::DateTime<chrono::Utc>>,
///     #[record(skip)]
///     attachments: Vec<Vec<u8>>,
/// }
/// ```
///
/// # Compile-Time Errors
///
/// The macro fails to compile if:
/// - the input is an enum, a union, or a tuple struct
/// - the struct has generic parameters
/// - two fields register the same name
/// - a `#[record(...)]` attribute is malformed
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
