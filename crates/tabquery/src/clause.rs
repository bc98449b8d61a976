//! Compiled filter leaves.
//!
//! A [`Clause`] is one resolved comparison: a field descriptor, an operator
//! and, for operators that compare against something, a typed [`Operand`].

use std::cmp::Ordering;
use std::fmt;

use crate::coerce::Operand;
use crate::field::FieldDescriptor;
use crate::op::Op;
use crate::value::{fold_case, Value};

/// A single compiled predicate over one field.
pub struct Clause<T: 'static> {
    field: FieldDescriptor<T>,
    op: Op,
    operand: Option<Operand>,
}

impl<T: 'static> Clause<T> {
    /// Creates a clause. Operators that take no operand ignore `operand`.
    pub fn new(field: FieldDescriptor<T>, op: Op, operand: Option<Operand>) -> Self {
        Clause { field, op, operand }
    }

    pub fn field(&self) -> &FieldDescriptor<T> {
        &self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> Option<&Operand> {
        self.operand.as_ref()
    }

    /// Evaluates this clause against a record.
    #[inline]
    pub fn matches(&self, record: &T) -> bool {
        self.matches_value(&self.field.value(record))
    }

    /// Evaluates this clause against an already extracted field value.
    ///
    /// A null value fails every positive comparison; `neq` and
    /// `doesnotcontain` hold for it, being negations.
    pub fn matches_value(&self, value: &Value<'_>) -> bool {
        match self.op {
            Op::IsNull => return value.is_null(),
            Op::IsNotNull => return !value.is_null(),
            Op::IsEmpty => return value.as_str().is_some_and(str::is_empty),
            Op::IsNotEmpty => return !value.as_str().is_some_and(str::is_empty),
            _ => {}
        }

        let Some(operand) = &self.operand else {
            return false;
        };

        match (operand, value) {
            (Operand::String(pattern), Value::String(s)) => self.match_string(s, pattern),

            (_, Value::Null) => matches!(self.op, Op::Neq | Op::DoesNotContain),

            (Operand::Number(clause_num), Value::Number(field_num)) => {
                self.match_ordering(field_num.compare(*clause_num))
            }
            (Operand::Timestamp(clause_ts), Value::Timestamp(field_ts)) => {
                self.match_ordering(Some(field_ts.cmp(clause_ts)))
            }
            (Operand::Enum(clause_disc), Value::Enum(field_disc)) => {
                self.match_ordering(Some(field_disc.cmp(clause_disc)))
            }
            (Operand::Bool(clause_bool), Value::Bool(field_bool)) => {
                self.match_ordering(Some(field_bool.cmp(clause_bool)))
            }

            // Getter disagrees with its registered kind
            _ => false,
        }
    }

    fn match_string(&self, field: &str, pattern: &str) -> bool {
        let folded = fold_case(field);
        let field: &str = &folded;
        match self.op {
            Op::StartsWith => field.starts_with(pattern),
            Op::EndsWith => field.ends_with(pattern),
            Op::Contains => field.contains(pattern),
            Op::DoesNotContain => !field.contains(pattern),
            op => op.eval_ordering(field.cmp(pattern)),
        }
    }

    /// Unordered pairs (NaN) only satisfy `neq`.
    fn match_ordering(&self, ordering: Option<Ordering>) -> bool {
        match ordering {
            Some(ordering) => self.op.eval_ordering(ordering),
            None => self.op == Op::Neq,
        }
    }
}

impl<T: 'static> Clone for Clause<T> {
    fn clone(&self) -> Self {
        Clause {
            field: self.field,
            op: self.op,
            operand: self.operand.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Clause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("field", &self.field.name())
            .field("op", &self.op)
            .field("operand", &self.operand)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::value::{Number, Timestamp};

    // The getter is never called by matches_value.
    fn unused(_: &()) -> Value<'_> {
        Value::Null
    }

    fn clause(kind: FieldKind, op: Op, operand: Option<Operand>) -> Clause<()> {
        Clause::new(FieldDescriptor::new("Field", kind, unused), op, operand)
    }

    fn text(op: Op, pattern: &str) -> Clause<()> {
        clause(
            FieldKind::String,
            op,
            Some(Operand::String(pattern.to_lowercase())),
        )
    }

    #[test]
    fn string_eq_ignores_case() {
        let c = text(Op::Eq, "Hello");
        assert!(c.matches_value(&Value::String("hello")));
        assert!(c.matches_value(&Value::String("HELLO")));
        assert!(!c.matches_value(&Value::String("world")));
    }

    #[test]
    fn string_neq() {
        let c = text(Op::Neq, "hello");
        assert!(!c.matches_value(&Value::String("Hello")));
        assert!(c.matches_value(&Value::String("world")));
    }

    #[test]
    fn string_substring_operators() {
        assert!(text(Op::StartsWith, "hel").matches_value(&Value::String("Hello world")));
        assert!(!text(Op::StartsWith, "world").matches_value(&Value::String("Hello world")));
        assert!(text(Op::EndsWith, "WORLD").matches_value(&Value::String("hello world")));
        assert!(text(Op::Contains, "lo w").matches_value(&Value::String("HELLO WORLD")));
        assert!(text(Op::DoesNotContain, "xyz").matches_value(&Value::String("hello")));
        assert!(!text(Op::DoesNotContain, "ELL").matches_value(&Value::String("hello")));
    }

    #[test]
    fn string_ordering_ignores_case() {
        assert!(text(Op::Lt, "b").matches_value(&Value::String("Apple")));
        assert!(text(Op::Gte, "APPLE").matches_value(&Value::String("apple")));
        assert!(!text(Op::Gt, "b").matches_value(&Value::String("B")));
    }

    #[test]
    fn empty_string_operators() {
        let empty = clause(FieldKind::String, Op::IsEmpty, None);
        assert!(empty.matches_value(&Value::String("")));
        assert!(!empty.matches_value(&Value::String(" ")));
        assert!(!empty.matches_value(&Value::Null));

        let not_empty = clause(FieldKind::String, Op::IsNotEmpty, None);
        assert!(!not_empty.matches_value(&Value::String("")));
        assert!(not_empty.matches_value(&Value::String("x")));
        assert!(not_empty.matches_value(&Value::Null));
    }

    #[test]
    fn null_operators() {
        let is_null = clause(FieldKind::Integer, Op::IsNull, None);
        assert!(is_null.matches_value(&Value::Null));
        assert!(!is_null.matches_value(&Value::Number(Number::I64(0))));

        let not_null = clause(FieldKind::Integer, Op::IsNotNull, None);
        assert!(not_null.matches_value(&Value::Number(Number::I64(0))));
        assert!(!not_null.matches_value(&Value::Null));
    }

    #[test]
    fn null_field_value_only_satisfies_negations() {
        let five = Some(Operand::Number(Number::I64(5)));
        assert!(!clause(FieldKind::Integer, Op::Eq, five.clone()).matches_value(&Value::Null));
        assert!(clause(FieldKind::Integer, Op::Neq, five.clone()).matches_value(&Value::Null));
        assert!(!clause(FieldKind::Integer, Op::Lt, five).matches_value(&Value::Null));
        assert!(!text(Op::Contains, "a").matches_value(&Value::Null));
        assert!(text(Op::DoesNotContain, "a").matches_value(&Value::Null));
    }

    #[test]
    fn number_comparisons() {
        let gt = clause(
            FieldKind::Integer,
            Op::Gt,
            Some(Operand::Number(Number::I64(10))),
        );
        assert!(gt.matches_value(&Value::Number(Number::I64(11))));
        assert!(gt.matches_value(&Value::Number(Number::U64(20))));
        assert!(!gt.matches_value(&Value::Number(Number::I64(10))));
    }

    #[test]
    fn nan_only_satisfies_neq() {
        let nan = Value::Number(Number::F64(f64::NAN));
        let one = Some(Operand::Number(Number::F64(1.0)));
        assert!(!clause(FieldKind::Float, Op::Eq, one.clone()).matches_value(&nan));
        assert!(!clause(FieldKind::Float, Op::Lte, one.clone()).matches_value(&nan));
        assert!(clause(FieldKind::Float, Op::Neq, one).matches_value(&nan));
    }

    #[test]
    fn timestamp_enum_bool_comparisons() {
        let before = clause(
            FieldKind::Timestamp,
            Op::Lt,
            Some(Operand::Timestamp(Timestamp(2000))),
        );
        assert!(before.matches_value(&Value::Timestamp(Timestamp(1000))));
        assert!(!before.matches_value(&Value::Timestamp(Timestamp(2000))));

        let status = clause(FieldKind::Enum(&[]), Op::Eq, Some(Operand::Enum(2)));
        assert!(status.matches_value(&Value::Enum(2)));
        assert!(!status.matches_value(&Value::Enum(1)));

        let active = clause(FieldKind::Bool, Op::Eq, Some(Operand::Bool(true)));
        assert!(active.matches_value(&Value::Bool(true)));
        assert!(!active.matches_value(&Value::Bool(false)));
    }

    #[test]
    fn type_mismatch_never_matches() {
        let c = clause(
            FieldKind::Integer,
            Op::Eq,
            Some(Operand::Number(Number::I64(1))),
        );
        assert!(!c.matches_value(&Value::String("1")));
    }
}
