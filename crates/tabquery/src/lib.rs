//! Tabquery - Tabular query engine for in-memory record collections.
//!
//! Tabquery answers the requests a data grid sends: filter a collection by a
//! tree of field comparisons, count the matches, compute per-field
//! aggregates, sort by several keys and return one page. Field names,
//! operators and values arrive as strings at runtime; each record type
//! registers a static table of typed field accessors that those names
//! resolve against.
//!
//! # Quick Start
//!
//! ```rust
//! use tabquery::{AggregateValue, FilterExpression, QueryEngine, Record, TabularQuery};
//!
//! #[derive(Record)]
//! struct Order {
//!     customer_name: String,
//!     quantity: u32,
//!     discount: Option<f64>,
//! }
//!
//! let orders = vec![
//!     Order { customer_name: "Acme".into(), quantity: 12, discount: None },
//!     Order { customer_name: "Globex".into(), quantity: 3, discount: Some(0.1) },
//!     Order { customer_name: "acme labs".into(), quantity: 7, discount: Some(0.05) },
//! ];
//!
//! let engine = QueryEngine::<Order>::new().unwrap();
//!
//! // The shape a grid widget sends
//! let query: TabularQuery = serde_json::from_str(r#"{
//!     "take": 10,
//!     "filter": { "logic": "and", "filters": [
//!         { "field": "customerName", "operator": "startswith", "value": "ACME" }
//!     ]},
//!     "sort": [{ "field": "quantity", "dir": "asc" }],
//!     "aggregate": [{ "field": "quantity", "aggregate": "sum" }]
//! }"#).unwrap();
//!
//! let response = engine.apply(&orders, &query).unwrap();
//! assert_eq!(response.count, 2);
//! assert_eq!(response.items[0].customer_name, "acme labs");
//!
//! let aggregates = response.aggregates.unwrap();
//! assert_eq!(aggregates.get("quantity", "sum"), Some(&AggregateValue::Int(19)));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! filter -> count -> aggregate -> sort -> skip/take
//! ```
//!
//! `count` and the aggregates describe every matching record; only `items`
//! is paged. `take <= 0` means no page limit.
//!
//! # Field Kinds and Operators
//!
//! | Kind | Operators |
//! |------|-----------|
//! | String | `eq`, `neq`, `lt`, `lte`, `gt`, `gte`, `startswith`, `endswith`, `contains`, `doesnotcontain`, `isempty`, `isnotempty` |
//! | Integer, Float, Timestamp, Enum | `eq`, `neq`, `lt`, `lte`, `gt`, `gte` |
//! | Bool | `eq`, `neq` |
//!
//! Every kind also accepts `isnull` and `isnotnull`. String comparisons
//! ignore case.
//!
//! # Unusable Query Parts
//!
//! By default the engine is permissive: a filter leaf naming an unknown
//! field, an unknown operator, or a value that does not parse is dropped
//! (and logged through `tracing` at debug level), and the rest of the query
//! still runs. Inside a group the dropped child is removed, so
//! `bogus OR real` filters by `real`. Build the engine with
//! [`QueryEngineBuilder::strict`] to get the first problem back as a
//! [`QueryError`] instead.

mod aggregate;
mod clause;
mod coerce;
mod config;
mod engine;
mod error;
mod field;
mod filter;
mod op;
mod query;
mod record;
mod response;
mod sort;
mod value;

pub use aggregate::{
    AggregateExpression, AggregateFunction, AggregateValue, Aggregates, CompiledAggregates,
    FieldAggregates,
};
pub use clause::Clause;
pub use coerce::{coerce, Operand};
pub use config::{EngineConfig, ResolutionMode};
pub use engine::{CompiledQuery, QueryEngine, QueryEngineBuilder};
pub use error::{QueryError, Result};
pub use field::{to_upper_camel_case, EnumVariant, FieldDescriptor, FieldKind, Getter, Schema};
pub use filter::{CompiledFilter, FilterExpression, Logic};
pub use op::Op;
pub use query::TabularQuery;
pub use record::{Record, RecordEnum, RecordTimestamp};
pub use response::TabularResponse;
pub use sort::{CompiledSort, Dir, SortExpression, SortKey};
pub use value::{compare_values, Number, Timestamp, Value};

#[cfg(feature = "derive")]
pub use tabquery_macros::Record;
