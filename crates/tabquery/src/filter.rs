//! Filter expression trees and their compiled predicates.
//!
//! A [`FilterExpression`] is the declarative tree a grid sends: leaves compare
//! one field against a literal, groups combine children with `and` / `or`.
//! [`FilterExpression::compile`] turns it into a [`CompiledFilter`] that
//! evaluates directly against records.
//!
//! Compilation is fail-soft. A leaf that names an unknown field, an unknown
//! operator, an operator the field's kind does not support, or a value that
//! does not parse contributes no constraint. So does a group with an unknown
//! logic token or no usable children. Each such drop is reported to the
//! caller as a [`QueryError`] so strict callers can reject the query.

use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer};

use crate::clause::Clause;
use crate::coerce::coerce;
use crate::error::QueryError;
use crate::field::Schema;
use crate::op::Op;

/// One node of a filter tree.
///
/// A node with a logic token and a non-empty `filters` list is a group;
/// anything else is read as a leaf.
/// Deserializes from the shape grid widgets send:
///
/// ```
/// use tabquery::FilterExpression;
///
/// let filter: FilterExpression = serde_json::from_str(r#"{
///     "logic": "or",
///     "filters": [
///         { "field": "customerName", "operator": "startswith", "value": "ac" },
///         { "field": "quantity", "operator": "gte", "value": 10 }
///     ]
/// }"#).unwrap();
///
/// assert!(filter.is_group());
/// assert_eq!(filter.filters[1].value.as_deref(), Some("10"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterExpression {
    /// External (lower-camel-case) field name of a leaf.
    pub field: Option<String>,
    /// Operator token of a leaf.
    pub operator: Option<String>,
    /// Raw literal of a leaf, coerced to the field's kind at compile time.
    #[serde(deserialize_with = "deserialize_literal")]
    pub value: Option<String>,
    /// `and` / `or` for a group.
    pub logic: Option<String>,
    /// Children of a group.
    pub filters: Vec<FilterExpression>,
}

impl FilterExpression {
    /// Creates a leaf comparing `field` against `value`.
    pub fn leaf(field: &str, operator: &str, value: impl Into<String>) -> Self {
        FilterExpression {
            field: Some(field.to_string()),
            operator: Some(operator.to_string()),
            value: Some(value.into()),
            ..FilterExpression::default()
        }
    }

    /// Creates a leaf for an operator that takes no value (`isnull`, `isempty`, ...).
    pub fn unary(field: &str, operator: &str) -> Self {
        FilterExpression {
            field: Some(field.to_string()),
            operator: Some(operator.to_string()),
            ..FilterExpression::default()
        }
    }

    /// Creates a group with an arbitrary logic token.
    pub fn group(logic: &str, filters: impl IntoIterator<Item = FilterExpression>) -> Self {
        FilterExpression {
            logic: Some(logic.to_string()),
            filters: filters.into_iter().collect(),
            ..FilterExpression::default()
        }
    }

    /// Creates an `and` group.
    pub fn and(filters: impl IntoIterator<Item = FilterExpression>) -> Self {
        FilterExpression::group("and", filters)
    }

    /// Creates an `or` group.
    pub fn or(filters: impl IntoIterator<Item = FilterExpression>) -> Self {
        FilterExpression::group("or", filters)
    }

    /// Returns `true` if this node combines children.
    pub fn is_group(&self) -> bool {
        !is_blank(&self.logic) && !self.filters.is_empty()
    }

    /// Compiles this tree against a schema.
    ///
    /// Returns `None` when the tree imposes no constraint. Every node dropped
    /// along the way is appended to `issues`.
    pub fn compile<T: 'static>(
        &self,
        schema: &Schema<T>,
        issues: &mut Vec<QueryError>,
    ) -> Option<CompiledFilter<T>> {
        match self.compile_node(schema, issues) {
            Node::Filter(filter) => Some(filter),
            Node::Always | Node::Dropped => None,
        }
    }

    fn compile_node<T: 'static>(
        &self,
        schema: &Schema<T>,
        issues: &mut Vec<QueryError>,
    ) -> Node<T> {
        if self.is_group() {
            return self.compile_group(schema, issues);
        }
        if is_blank(&self.field) && is_blank(&self.operator) {
            // `{}` or `{"logic": "and", "filters": []}`: nothing to filter on
            return Node::Dropped;
        }
        match self.compile_leaf(schema) {
            Ok(node) => node,
            Err(issue) => {
                issues.push(issue);
                Node::Dropped
            }
        }
    }

    fn compile_group<T: 'static>(
        &self,
        schema: &Schema<T>,
        issues: &mut Vec<QueryError>,
    ) -> Node<T> {
        let token = self.logic.as_deref().unwrap_or_default().trim();
        let Some(logic) = Logic::parse(token) else {
            issues.push(QueryError::malformed(format!("unknown logic '{}'", token)));
            return Node::Dropped;
        };

        let mut always = false;
        let mut children: Vec<CompiledFilter<T>> = Vec::new();
        for child in &self.filters {
            match child.compile_node(schema, issues) {
                Node::Dropped => {}
                Node::Always => always = true,
                Node::Filter(filter) => children.push(filter),
            }
        }

        // One always-true branch satisfies an `or`; an `and` just skips it
        if always && logic == Logic::Or {
            return Node::Always;
        }
        match children.len() {
            0 if always => Node::Always,
            0 => Node::Dropped,
            1 => children.pop().map_or(Node::Dropped, Node::Filter),
            _ => Node::Filter(match logic {
                Logic::And => CompiledFilter::All(children),
                Logic::Or => CompiledFilter::Any(children),
            }),
        }
    }

    fn compile_leaf<T: 'static>(&self, schema: &Schema<T>) -> Result<Node<T>, QueryError> {
        let field = match self.field.as_deref() {
            Some(field) if !field.trim().is_empty() => field,
            _ => return Err(QueryError::malformed("filter leaf has no field")),
        };
        let token = match self.operator.as_deref() {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                return Err(QueryError::malformed(format!(
                    "filter on '{}' has no operator",
                    field
                )))
            }
        };

        let descriptor = schema.resolve(field)?;
        let op: Op = token.parse()?;
        let kind = descriptor.kind();

        if !op.applies_to(kind) {
            return Err(QueryError::UnsupportedOperator {
                operator: op.as_str(),
                field: field.to_string(),
                kind,
            });
        }

        if op.is_null_op() && !descriptor.is_nullable() {
            // A non-nullable field is never null
            return Ok(match op {
                Op::IsNull => Node::Filter(CompiledFilter::Never),
                _ => Node::Always,
            });
        }

        let operand = if op.needs_operand() {
            let raw = self.value.as_deref().unwrap_or_default();
            let operand = self
                .value
                .as_deref()
                .and_then(|raw| coerce(kind, raw))
                .ok_or_else(|| QueryError::InvalidValue {
                    field: field.to_string(),
                    value: raw.to_string(),
                    kind,
                })?;
            Some(operand)
        } else {
            None
        };

        Ok(Node::Filter(CompiledFilter::Clause(Clause::new(
            *descriptor,
            op,
            operand,
        ))))
    }
}

/// What compiling one node produced.
enum Node<T: 'static> {
    /// Unusable or empty; removed from its parent group.
    Dropped,
    /// Holds for every record.
    Always,
    Filter(CompiledFilter<T>),
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Captures a JSON scalar (string, number or bool) as its text.
fn deserialize_literal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value as Json;

    match Option::<Json>::deserialize(deserializer)? {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s)),
        Some(Json::Number(n)) => Ok(Some(n.to_string())),
        Some(Json::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "filter value must be a scalar, got {}",
            other
        ))),
    }
}

/// Group combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    /// Parses `and` / `or`, ignoring ASCII case.
    pub fn parse(token: &str) -> Option<Logic> {
        if token.eq_ignore_ascii_case("and") {
            Some(Logic::And)
        } else if token.eq_ignore_ascii_case("or") {
            Some(Logic::Or)
        } else {
            None
        }
    }
}

/// A filter tree compiled against a schema.
pub enum CompiledFilter<T: 'static> {
    /// Matches nothing.
    Never,
    /// A single field comparison.
    Clause(Clause<T>),
    /// Every child must match.
    All(Vec<CompiledFilter<T>>),
    /// At least one child must match.
    Any(Vec<CompiledFilter<T>>),
}

impl<T: 'static> CompiledFilter<T> {
    /// Tests a record, short-circuiting through groups.
    pub fn matches(&self, record: &T) -> bool {
        match self {
            CompiledFilter::Never => false,
            CompiledFilter::Clause(clause) => clause.matches(record),
            CompiledFilter::All(children) => children.iter().all(|c| c.matches(record)),
            CompiledFilter::Any(children) => children.iter().any(|c| c.matches(record)),
        }
    }
}

impl<T: 'static> Clone for CompiledFilter<T> {
    fn clone(&self) -> Self {
        match self {
            CompiledFilter::Never => CompiledFilter::Never,
            CompiledFilter::Clause(clause) => CompiledFilter::Clause(clause.clone()),
            CompiledFilter::All(children) => CompiledFilter::All(children.clone()),
            CompiledFilter::Any(children) => CompiledFilter::Any(children.clone()),
        }
    }
}

impl<T: 'static> fmt::Debug for CompiledFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledFilter::Never => f.write_str("Never"),
            CompiledFilter::Clause(clause) => clause.fmt(f),
            CompiledFilter::All(children) => f.debug_tuple("All").field(children).finish(),
            CompiledFilter::Any(children) => f.debug_tuple("Any").field(children).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldKind};
    use crate::value::{Number, Value};

    struct Item {
        name: String,
        qty: i64,
        note: Option<String>,
    }

    fn name(item: &Item) -> Value<'_> {
        Value::String(&item.name)
    }

    fn qty(item: &Item) -> Value<'_> {
        Value::Number(Number::I64(item.qty))
    }

    fn note(item: &Item) -> Value<'_> {
        item.note.as_deref().map_or(Value::Null, Value::String)
    }

    static FIELDS: &[FieldDescriptor<Item>] = &[
        FieldDescriptor::new("Name", FieldKind::String, name),
        FieldDescriptor::new("Qty", FieldKind::Integer, qty),
        FieldDescriptor::new("Note", FieldKind::String, note).nullable(),
    ];

    fn schema() -> Schema<Item> {
        Schema::from_fields(FIELDS).unwrap()
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "Alpha".into(),
                qty: 1,
                note: None,
            },
            Item {
                name: "Beta".into(),
                qty: 5,
                note: Some("".into()),
            },
            Item {
                name: "Gamma".into(),
                qty: 10,
                note: Some("fragile".into()),
            },
        ]
    }

    fn run(filter: &FilterExpression) -> (Vec<String>, Vec<QueryError>) {
        let mut issues = Vec::new();
        let compiled = filter.compile(&schema(), &mut issues);
        let names = items()
            .into_iter()
            .filter(|item| compiled.as_ref().map_or(true, |c| c.matches(item)))
            .map(|item| item.name)
            .collect();
        (names, issues)
    }

    #[test]
    fn leaf_filters() {
        let (names, issues) = run(&FilterExpression::leaf("qty", "gt", "1"));
        assert_eq!(names, ["Beta", "Gamma"]);
        assert!(issues.is_empty());
    }

    #[test]
    fn and_group() {
        let filter = FilterExpression::and([
            FilterExpression::leaf("qty", "gte", "5"),
            FilterExpression::leaf("name", "startswith", "g"),
        ]);
        assert_eq!(run(&filter).0, ["Gamma"]);
    }

    #[test]
    fn or_group() {
        let filter = FilterExpression::or([
            FilterExpression::leaf("qty", "eq", "1"),
            FilterExpression::leaf("name", "eq", "GAMMA"),
        ]);
        assert_eq!(run(&filter).0, ["Alpha", "Gamma"]);
    }

    #[test]
    fn nested_groups() {
        let filter = FilterExpression::and([
            FilterExpression::leaf("qty", "lt", "10"),
            FilterExpression::or([
                FilterExpression::leaf("name", "contains", "ph"),
                FilterExpression::leaf("name", "endswith", "TA"),
            ]),
        ]);
        assert_eq!(run(&filter).0, ["Alpha", "Beta"]);
    }

    #[test]
    fn unknown_field_in_or_group_is_dropped_not_true() {
        let filter = FilterExpression::or([
            FilterExpression::leaf("bogus", "eq", "x"),
            FilterExpression::leaf("qty", "eq", "5"),
        ]);
        let (names, issues) = run(&filter);
        assert_eq!(names, ["Beta"]);
        assert_eq!(
            issues,
            [QueryError::FieldNotFound {
                field: "bogus".into()
            }]
        );
    }

    #[test]
    fn unusable_leaves_contribute_nothing() {
        let cases = [
            FilterExpression::leaf("bogus", "eq", "x"),
            FilterExpression::leaf("qty", "between", "1"),
            FilterExpression::leaf("qty", "startswith", "1"),
            FilterExpression::leaf("qty", "eq", "many"),
            FilterExpression::unary("qty", "eq"),
            FilterExpression {
                field: Some("qty".into()),
                ..FilterExpression::default()
            },
        ];
        for filter in cases {
            let (names, issues) = run(&filter);
            assert_eq!(names.len(), 3, "{:?}", filter);
            assert_eq!(issues.len(), 1, "{:?}", filter);
        }
    }

    #[test]
    fn issue_variants() {
        let issue = |f: FilterExpression| run(&f).1.remove(0);
        assert!(matches!(
            issue(FilterExpression::leaf("qty", "between", "1")),
            QueryError::UnknownOperator { .. }
        ));
        assert!(matches!(
            issue(FilterExpression::leaf("qty", "contains", "1")),
            QueryError::UnsupportedOperator {
                operator: "contains",
                ..
            }
        ));
        assert_eq!(
            issue(FilterExpression::leaf("qty", "eq", "many")),
            QueryError::InvalidValue {
                field: "qty".into(),
                value: "many".into(),
                kind: FieldKind::Integer,
            }
        );
    }

    #[test]
    fn group_with_unknown_logic_is_dropped() {
        let filter = FilterExpression::group("xor", [FilterExpression::leaf("qty", "eq", "5")]);
        let (names, issues) = run(&filter);
        assert_eq!(names.len(), 3);
        assert!(matches!(issues[0], QueryError::MalformedExpression { .. }));
    }

    #[test]
    fn children_without_logic_are_ignored() {
        let filter = FilterExpression {
            filters: vec![FilterExpression::leaf("qty", "eq", "5")],
            ..FilterExpression::default()
        };
        assert_eq!(run(&filter).0.len(), 3);
    }

    #[test]
    fn logic_is_case_insensitive() {
        let filter = FilterExpression::group(
            "OR",
            [
                FilterExpression::leaf("qty", "eq", "1"),
                FilterExpression::leaf("qty", "eq", "5"),
            ],
        );
        assert_eq!(run(&filter).0, ["Alpha", "Beta"]);
    }

    #[test]
    fn empty_nodes_are_silent() {
        for filter in [
            FilterExpression::default(),
            FilterExpression::and([]),
        ] {
            let (names, issues) = run(&filter);
            assert_eq!(names.len(), 3);
            assert!(issues.is_empty());
        }
    }

    #[test]
    fn leaf_with_logic_is_still_a_leaf() {
        let filter = FilterExpression {
            logic: Some("and".into()),
            ..FilterExpression::leaf("qty", "eq", "10")
        };
        assert_eq!(run(&filter).0, ["Gamma"]);
    }

    #[test]
    fn nullability_operators() {
        assert_eq!(run(&FilterExpression::unary("note", "isnull")).0, ["Alpha"]);
        assert_eq!(
            run(&FilterExpression::unary("note", "isnotnull")).0,
            ["Beta", "Gamma"]
        );
        // Non-nullable fields are never null
        assert!(run(&FilterExpression::unary("qty", "isnull")).0.is_empty());
        assert_eq!(run(&FilterExpression::unary("qty", "isnotnull")).0.len(), 3);
    }

    #[test]
    fn isnotnull_on_required_field_satisfies_or_group() {
        let filter = FilterExpression::or([
            FilterExpression::unary("qty", "isnotnull"),
            FilterExpression::leaf("name", "eq", "alpha"),
        ]);
        let (names, issues) = run(&filter);
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
        assert!(issues.is_empty());

        let mut issues = Vec::new();
        assert!(filter.compile(&schema(), &mut issues).is_none());
    }

    #[test]
    fn isnotnull_on_required_field_is_skipped_in_and_group() {
        let filter = FilterExpression::and([
            FilterExpression::unary("qty", "isnotnull"),
            FilterExpression::leaf("name", "eq", "alpha"),
        ]);
        assert_eq!(run(&filter).0, ["Alpha"]);
    }

    #[test]
    fn always_true_subgroup_propagates_through_or() {
        let filter = FilterExpression::or([
            FilterExpression::and([FilterExpression::unary("qty", "isnotnull")]),
            FilterExpression::leaf("qty", "eq", "5"),
        ]);
        assert_eq!(run(&filter).0.len(), 3);

        // A dropped subgroup still narrows to the remaining branch
        let filter = FilterExpression::or([
            FilterExpression::and([FilterExpression::leaf("bogus", "eq", "x")]),
            FilterExpression::leaf("qty", "eq", "5"),
        ]);
        assert_eq!(run(&filter).0, ["Beta"]);
    }

    #[test]
    fn emptiness_operators() {
        assert_eq!(run(&FilterExpression::unary("note", "isempty")).0, ["Beta"]);
        assert_eq!(
            run(&FilterExpression::unary("note", "isnotempty")).0,
            ["Alpha", "Gamma"]
        );
    }

    #[test]
    fn deserializes_scalar_values() {
        let filter: FilterExpression =
            serde_json::from_str(r#"{"field":"qty","operator":"eq","value":5}"#).unwrap();
        assert_eq!(filter.value.as_deref(), Some("5"));

        let filter: FilterExpression =
            serde_json::from_str(r#"{"field":"flag","operator":"eq","value":true}"#).unwrap();
        assert_eq!(filter.value.as_deref(), Some("true"));

        let filter: FilterExpression =
            serde_json::from_str(r#"{"field":"note","operator":"isnull","value":null}"#).unwrap();
        assert_eq!(filter.value, None);

        assert!(serde_json::from_str::<FilterExpression>(r#"{"value":[1]}"#).is_err());
    }
}
