//! Sort directives and their compiled comparator.
//!
//! Provides [`Dir`] for sort direction, [`SortExpression`] for the directive
//! a grid sends, and [`CompiledSort`] for the comparator built from a list
//! of directives.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use crate::error::QueryError;
use crate::field::{FieldDescriptor, Schema};
use crate::value::{compare_values, Number, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first, nulls first).
    #[default]
    Asc,
    /// Descending order (largest first, nulls last).
    Desc,
}

impl Dir {
    /// Parses a direction token, ignoring ASCII case.
    ///
    /// A blank token means ascending.
    pub fn parse(token: &str) -> Option<Dir> {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("asc") {
            Some(Dir::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Dir::Desc)
        } else {
            None
        }
    }

    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sort directive: an external field name and a direction token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortExpression {
    pub field: String,
    pub dir: String,
}

impl SortExpression {
    /// Creates a directive with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        SortExpression {
            field: field.into(),
            dir: dir.as_str().to_string(),
        }
    }

    /// Creates an ascending directive.
    pub fn asc(field: impl Into<String>) -> Self {
        SortExpression::new(field, Dir::Asc)
    }

    /// Creates a descending directive.
    pub fn desc(field: impl Into<String>) -> Self {
        SortExpression::new(field, Dir::Desc)
    }
}

/// Total order over field values, as the sort comparator must be.
///
/// Agrees with [`compare_values`] wherever that is defined. NaN orders
/// after every other number; values of different types order by type.
fn total_order(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    if let (Value::Number(a), Value::Number(b)) = (a, b) {
        return match (is_nan(*a), is_nan(*b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.compare(*b).unwrap_or(Ordering::Equal),
        };
    }
    compare_values(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

fn is_nan(n: Number) -> bool {
    matches!(n, Number::F64(f) if f.is_nan())
}

fn type_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Timestamp(_) => 3,
        Value::Enum(_) => 4,
        Value::String(_) => 5,
    }
}

/// A resolved sort key.
pub struct SortKey<T: 'static> {
    field: FieldDescriptor<T>,
    dir: Dir,
}

impl<T: 'static> SortKey<T> {
    pub fn field(&self) -> &FieldDescriptor<T> {
        &self.field
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    /// Compares two records on this key alone.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.dir
            .apply(total_order(&self.field.value(a), &self.field.value(b)))
    }
}

impl<T: 'static> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        SortKey {
            field: self.field,
            dir: self.dir,
        }
    }
}

impl<T: 'static> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.name(), self.dir)
    }
}

/// Multi-key comparator compiled from a list of [`SortExpression`]s.
pub struct CompiledSort<T: 'static> {
    keys: Vec<SortKey<T>>,
}

impl<T: 'static> CompiledSort<T> {
    /// Resolves each directive against `schema`.
    ///
    /// Directives naming an unknown field or an unknown direction are
    /// skipped and reported in `issues`.
    pub fn compile(
        sorts: &[SortExpression],
        schema: &Schema<T>,
        issues: &mut Vec<QueryError>,
    ) -> Self {
        let mut keys = Vec::with_capacity(sorts.len());
        for sort in sorts {
            let field = match schema.resolve(&sort.field) {
                Ok(field) => *field,
                Err(issue) => {
                    issues.push(issue);
                    continue;
                }
            };
            match Dir::parse(&sort.dir) {
                Some(dir) => keys.push(SortKey { field, dir }),
                None => issues.push(QueryError::malformed(format!(
                    "unknown sort direction '{}' for field '{}'",
                    sort.dir, sort.field
                ))),
            }
        }
        CompiledSort { keys }
    }

    pub fn keys(&self) -> &[SortKey<T>] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two records key by key; the first non-equal key wins.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for key in &self.keys {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Sorts in place. Stable: equal records keep their relative order.
    pub fn sort(&self, items: &mut [&T]) {
        if !self.keys.is_empty() {
            items.sort_by(|a, b| self.compare(a, b));
        }
    }
}

impl<T: 'static> Clone for CompiledSort<T> {
    fn clone(&self) -> Self {
        CompiledSort {
            keys: self.keys.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for CompiledSort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}
