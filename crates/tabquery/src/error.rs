//! Error types for the tabquery crate.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors that can occur when compiling or running a tabular query.
///
/// In permissive mode every per-query variant is recorded and the offending
/// node is dropped; only [`QueryError::InvalidSchema`] can reach the caller.
/// In strict mode the first recorded error is returned from
/// [`QueryEngine::apply`](crate::QueryEngine::apply).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The external field name does not map to any registered field.
    #[error("field '{field}' not found")]
    FieldNotFound { field: String },

    /// The operator token is not one of the supported tokens.
    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },

    /// The operator exists but cannot be applied to the field's type.
    #[error("operator '{operator}' is not valid for {kind} field '{field}'")]
    UnsupportedOperator {
        operator: &'static str,
        field: String,
        kind: FieldKind,
    },

    /// The filter value cannot be parsed into the field's type.
    #[error("value '{value}' is not a valid {kind} for field '{field}'")]
    InvalidValue {
        field: String,
        value: String,
        kind: FieldKind,
    },

    /// Structurally unusable expression node.
    #[error("malformed expression: {reason}")]
    MalformedExpression { reason: String },

    /// The aggregate function token is not supported.
    #[error("unknown aggregate '{aggregate}'")]
    UnknownAggregate { aggregate: String },

    /// The aggregate function cannot be computed over the field's type.
    #[error("aggregate '{aggregate}' is not valid for {kind} field '{field}'")]
    UnsupportedAggregate {
        aggregate: &'static str,
        field: String,
        kind: FieldKind,
    },

    /// The record type registered an unusable field table.
    #[error("invalid record schema: {reason}")]
    InvalidSchema { reason: String },
}

impl QueryError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        QueryError::MalformedExpression {
            reason: reason.into(),
        }
    }
}

/// Result type for tabquery operations.
pub type Result<T> = std::result::Result<T, QueryError>;
