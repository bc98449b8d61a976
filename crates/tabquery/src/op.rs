//! Comparison operators for filter leaves.
//!
//! The [`Op`] enum defines the operator tokens a grid sends, organized by the
//! field kinds they apply to. Not all operators are valid for all kinds.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;
use crate::field::FieldKind;

/// Comparison operator for a filter leaf.
///
/// Operators are grouped by the kinds they support:
/// - **Universal**: `Eq`, `Neq`, `IsNull`, `IsNotNull`
/// - **Ordering**: `Lt`, `Lte`, `Gt`, `Gte` (every kind except bool)
/// - **String**: `StartsWith`, `EndsWith`, `Contains`, `DoesNotContain`,
///   `IsEmpty`, `IsNotEmpty`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // Universal operators
    /// Equal. Case-insensitive for strings.
    Eq,
    /// Not equal.
    Neq,

    // Ordering operators
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,

    // String operators
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// String contains substring.
    Contains,
    /// String does not contain substring.
    DoesNotContain,
    /// String is present and empty.
    IsEmpty,
    /// String is not [`Op::IsEmpty`].
    IsNotEmpty,

    // Nullability
    /// Field holds no value.
    IsNull,
    /// Field holds a value.
    IsNotNull,
}

impl Op {
    /// Every operator, in token order.
    pub const ALL: [Op; 14] = [
        Op::Eq,
        Op::Neq,
        Op::Lt,
        Op::Lte,
        Op::Gt,
        Op::Gte,
        Op::StartsWith,
        Op::EndsWith,
        Op::Contains,
        Op::DoesNotContain,
        Op::IsEmpty,
        Op::IsNotEmpty,
        Op::IsNull,
        Op::IsNotNull,
    ];

    /// Parses an operator token. Tokens are lower-case and matched exactly.
    pub fn parse(token: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.as_str() == token)
    }

    /// Returns `true` for the ordering operators.
    pub fn is_ordering_op(self) -> bool {
        matches!(self, Op::Lt | Op::Lte | Op::Gt | Op::Gte)
    }

    /// Returns `true` for operators that only make sense on strings.
    pub fn is_text_op(self) -> bool {
        matches!(
            self,
            Op::StartsWith
                | Op::EndsWith
                | Op::Contains
                | Op::DoesNotContain
                | Op::IsEmpty
                | Op::IsNotEmpty
        )
    }

    /// Returns `true` for the nullability operators.
    pub fn is_null_op(self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }

    /// Returns `true` if the operator compares against a filter value.
    pub fn needs_operand(self) -> bool {
        !matches!(
            self,
            Op::IsNull | Op::IsNotNull | Op::IsEmpty | Op::IsNotEmpty
        )
    }

    /// Returns `true` if this operator can be applied to a field of `kind`.
    pub fn applies_to(self, kind: FieldKind) -> bool {
        match self {
            op if op.is_ordering_op() => kind.is_orderable(),
            op if op.is_text_op() => kind == FieldKind::String,
            _ => true,
        }
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Used for every kind once the field and filter value have been
    /// compared. Non-comparison operators return `false`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Neq => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the token of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::StartsWith => "startswith",
            Op::EndsWith => "endswith",
            Op::Contains => "contains",
            Op::DoesNotContain => "doesnotcontain",
            Op::IsEmpty => "isempty",
            Op::IsNotEmpty => "isnotempty",
            Op::IsNull => "isnull",
            Op::IsNotNull => "isnotnull",
        }
    }
}

impl FromStr for Op {
    type Err = QueryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Op::parse(token).ok_or_else(|| QueryError::UnknownOperator {
            operator: token.to_string(),
        })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
