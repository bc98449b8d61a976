//! Per-field aggregates over the filtered record set.
//!
//! Requests name a field and one of `count`, `sum`, `min`, `max`,
//! `average`. They are grouped by field, so each field is resolved and read
//! once, and the result nests function results under the field name:
//!
//! ```text
//! { "quantity": { "sum": 42, "max": 9 }, "customerName": { "min": "Acme" } }
//! ```
//!
//! An entry that cannot be computed (unknown field, unknown function,
//! function not defined for the field's kind) is reported as `null`.

use std::cmp::Ordering;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::error::QueryError;
use crate::field::{FieldDescriptor, FieldKind, Schema};
use crate::value::{compare_values, Number, Timestamp, Value};

/// One aggregate request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AggregateExpression {
    /// External (lower-camel-case) field name.
    pub field: String,
    /// Function token.
    #[serde(alias = "function")]
    pub aggregate: String,
}

impl AggregateExpression {
    pub fn new(field: impl Into<String>, aggregate: impl Into<String>) -> Self {
        AggregateExpression {
            field: field.into(),
            aggregate: aggregate.into(),
        }
    }
}

/// Supported aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    /// Number of non-null values.
    Count,
    /// Sum of numeric values.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Arithmetic mean of numeric values.
    Average,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Count,
        AggregateFunction::Sum,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Average,
    ];

    /// Parses a function token. Tokens are lower-case and matched exactly.
    pub fn parse(token: &str) -> Option<AggregateFunction> {
        AggregateFunction::ALL
            .into_iter()
            .find(|f| f.as_str() == token)
    }

    /// Returns `true` if this function can be computed over a field of `kind`.
    pub fn applies_to(self, kind: FieldKind) -> bool {
        match self {
            AggregateFunction::Count | AggregateFunction::Min | AggregateFunction::Max => true,
            AggregateFunction::Sum | AggregateFunction::Average => kind.is_numeric(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Average => "average",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(Timestamp),
}

impl AggregateValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AggregateValue::Null)
    }

    /// Numeric view of this value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AggregateValue::Int(i) => Some(i as f64),
            AggregateValue::UInt(u) => Some(u as f64),
            AggregateValue::Float(f) => Some(f),
            _ => None,
        }
    }

    fn from_value(value: Value<'_>, kind: FieldKind) -> AggregateValue {
        match value {
            Value::Null => AggregateValue::Null,
            Value::String(s) => AggregateValue::Text(s.to_string()),
            Value::Number(Number::I64(i)) => AggregateValue::Int(i),
            Value::Number(Number::U64(u)) => AggregateValue::UInt(u),
            Value::Number(Number::F64(f)) => AggregateValue::Float(f),
            Value::Timestamp(ts) => AggregateValue::Timestamp(ts),
            Value::Bool(b) => AggregateValue::Bool(b),
            Value::Enum(d) => match kind.variant_name(d) {
                Some(name) => AggregateValue::Text(name.to_string()),
                None => AggregateValue::UInt(u64::from(d)),
            },
        }
    }

    fn from_sum(sum: i128) -> AggregateValue {
        if let Ok(i) = i64::try_from(sum) {
            AggregateValue::Int(i)
        } else if let Ok(u) = u64::try_from(sum) {
            AggregateValue::UInt(u)
        } else {
            AggregateValue::Float(sum as f64)
        }
    }
}

impl Serialize for AggregateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggregateValue::Null => serializer.serialize_none(),
            AggregateValue::Int(i) => serializer.serialize_i64(*i),
            AggregateValue::UInt(u) => serializer.serialize_u64(*u),
            AggregateValue::Float(f) => serializer.serialize_f64(*f),
            AggregateValue::Text(s) => serializer.serialize_str(s),
            AggregateValue::Bool(b) => serializer.serialize_bool(*b),
            AggregateValue::Timestamp(ts) => match ts.to_rfc3339() {
                Some(text) => serializer.serialize_str(&text),
                None => serializer.serialize_i64(ts.as_millis()),
            },
        }
    }
}

/// Results for one field, keyed by function token in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldAggregates {
    entries: Vec<(String, AggregateValue)>,
}

impl FieldAggregates {
    /// Looks up a result by function token.
    pub fn get(&self, function: &str) -> Option<&AggregateValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == function)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregateValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldAggregates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Aggregate summary keyed by external field name, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregates {
    fields: Vec<(String, FieldAggregates)>,
}

impl Aggregates {
    /// Looks up a single result.
    ///
    /// ```
    /// # use tabquery::{AggregateValue, Aggregates};
    /// # fn check(aggregates: &Aggregates) {
    /// if let Some(AggregateValue::Int(total)) = aggregates.get("quantity", "sum") {
    ///     println!("total quantity: {}", total);
    /// }
    /// # }
    /// ```
    pub fn get(&self, field: &str, function: &str) -> Option<&AggregateValue> {
        self.field(field)?.get(function)
    }

    /// Returns every result for one field.
    pub fn field(&self, field: &str) -> Option<&FieldAggregates> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, results)| results)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldAggregates)> {
        self.fields.iter().map(|(name, results)| (name.as_str(), results))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Aggregates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, results) in &self.fields {
            map.serialize_entry(name, results)?;
        }
        map.end()
    }
}

/// Aggregate requests for one field, resolved against a schema.
struct FieldPlan<T: 'static> {
    name: String,
    descriptor: Option<FieldDescriptor<T>>,
    functions: Vec<(String, Option<AggregateFunction>)>,
}

/// Aggregate requests compiled against a schema.
pub struct CompiledAggregates<T: 'static> {
    plans: Vec<FieldPlan<T>>,
}

impl<T: 'static> CompiledAggregates<T> {
    /// Groups requests by field and resolves each field and function once.
    ///
    /// Requests that cannot be computed still get an entry (reported as
    /// `null`), and the reason is appended to `issues`.
    pub fn compile(
        requests: &[AggregateExpression],
        schema: &Schema<T>,
        issues: &mut Vec<QueryError>,
    ) -> Self {
        let mut plans: Vec<FieldPlan<T>> = Vec::new();

        for request in requests {
            let position = match plans.iter().position(|p| p.name == request.field) {
                Some(position) => position,
                None => {
                    let descriptor = match schema.resolve(&request.field) {
                        Ok(descriptor) => Some(*descriptor),
                        Err(issue) => {
                            issues.push(issue);
                            None
                        }
                    };
                    plans.push(FieldPlan {
                        name: request.field.clone(),
                        descriptor,
                        functions: Vec::new(),
                    });
                    plans.len() - 1
                }
            };
            let plan = &mut plans[position];

            if plan
                .functions
                .iter()
                .any(|(token, _)| *token == request.aggregate)
            {
                continue;
            }

            let function = match (plan.descriptor, AggregateFunction::parse(&request.aggregate)) {
                (_, None) => {
                    issues.push(QueryError::UnknownAggregate {
                        aggregate: request.aggregate.clone(),
                    });
                    None
                }
                (None, Some(_)) => None,
                (Some(descriptor), Some(function)) if !function.applies_to(descriptor.kind()) => {
                    issues.push(QueryError::UnsupportedAggregate {
                        aggregate: function.as_str(),
                        field: request.field.clone(),
                        kind: descriptor.kind(),
                    });
                    None
                }
                (Some(_), function) => function,
            };
            plan.functions.push((request.aggregate.clone(), function));
        }

        CompiledAggregates { plans }
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Computes every requested aggregate over `rows`.
    ///
    /// Returns `None` when nothing was requested or `rows` is empty.
    pub fn run(&self, rows: &[&T]) -> Option<Aggregates> {
        if self.plans.is_empty() || rows.is_empty() {
            return None;
        }

        let fields = self
            .plans
            .iter()
            .map(|plan| {
                let values: Vec<Value<'_>> = match &plan.descriptor {
                    Some(descriptor) => rows
                        .iter()
                        .map(|row| descriptor.value(row))
                        .filter(|value| !value.is_null())
                        .collect(),
                    None => Vec::new(),
                };
                let entries = plan
                    .functions
                    .iter()
                    .map(|(token, function)| {
                        let value = match (&plan.descriptor, function) {
                            (Some(descriptor), Some(function)) => {
                                compute(*function, descriptor.kind(), &values)
                            }
                            _ => AggregateValue::Null,
                        };
                        (token.clone(), value)
                    })
                    .collect();
                (plan.name.clone(), FieldAggregates { entries })
            })
            .collect();

        Some(Aggregates { fields })
    }
}

impl<T: 'static> Clone for FieldPlan<T> {
    fn clone(&self) -> Self {
        FieldPlan {
            name: self.name.clone(),
            descriptor: self.descriptor,
            functions: self.functions.clone(),
        }
    }
}

impl<T: 'static> Clone for CompiledAggregates<T> {
    fn clone(&self) -> Self {
        CompiledAggregates {
            plans: self.plans.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for CompiledAggregates<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for plan in &self.plans {
            let tokens: Vec<&str> = plan.functions.iter().map(|(t, _)| t.as_str()).collect();
            map.entry(&plan.name, &tokens);
        }
        map.finish()
    }
}

/// Computes one function over the non-null values of a field.
fn compute(function: AggregateFunction, kind: FieldKind, values: &[Value<'_>]) -> AggregateValue {
    match function {
        AggregateFunction::Count => AggregateValue::UInt(values.len() as u64),
        AggregateFunction::Sum => sum(kind, values).unwrap_or(AggregateValue::Null),
        AggregateFunction::Average => average(kind, values),
        AggregateFunction::Min => extreme(values, Ordering::Less, kind),
        AggregateFunction::Max => extreme(values, Ordering::Greater, kind),
    }
}

fn sum(kind: FieldKind, values: &[Value<'_>]) -> Option<AggregateValue> {
    if kind == FieldKind::Integer {
        if let Some(total) = exact_total(values) {
            return Some(AggregateValue::from_sum(total));
        }
    }
    kind.is_numeric()
        .then(|| AggregateValue::Float(float_total(values)))
}

fn average(kind: FieldKind, values: &[Value<'_>]) -> AggregateValue {
    let count = values.iter().filter(|v| v.as_number().is_some()).count();
    if count == 0 || !kind.is_numeric() {
        return AggregateValue::Null;
    }
    let total = match exact_total(values) {
        Some(total) if kind == FieldKind::Integer => total as f64,
        _ => float_total(values),
    };
    AggregateValue::Float(total / count as f64)
}

/// Integer total in 128 bits; `None` on overflow or when a float is present.
fn exact_total(values: &[Value<'_>]) -> Option<i128> {
    values
        .iter()
        .filter_map(|v| v.as_number())
        .try_fold(0i128, |total, n| total.checked_add(n.to_i128()?))
}

fn float_total(values: &[Value<'_>]) -> f64 {
    values
        .iter()
        .filter_map(|v| v.as_number())
        .map(Number::to_f64)
        .sum()
}

/// Keeps the first value that no later value beats in direction `wanted`.
fn extreme(values: &[Value<'_>], wanted: Ordering, kind: FieldKind) -> AggregateValue {
    let mut best: Option<&Value<'_>> = None;
    for value in values {
        // NaN has no place in the order
        if compare_values(value, value).is_none() {
            continue;
        }
        best = match best {
            Some(current) if compare_values(value, current) != Some(wanted) => Some(current),
            _ => Some(value),
        };
    }
    best.map_or(AggregateValue::Null, |value| {
        AggregateValue::from_value(*value, kind)
    })
}
