//! The tabular query request.
//!
//! A [`TabularQuery`] is what a grid sends for one page of data: paging,
//! a filter tree, sort directives and aggregate requests. It deserializes
//! from the usual JSON shape and also offers a fluent builder for queries
//! assembled in code.

use serde::Deserialize;

use crate::aggregate::AggregateExpression;
use crate::filter::FilterExpression;
use crate::sort::{Dir, SortExpression};

/// A request for one page of a record collection.
///
/// All keys are optional when deserializing; unknown keys are ignored.
///
/// # Example
///
/// ```
/// use tabquery::{FilterExpression, TabularQuery};
///
/// let query = TabularQuery::new()
///     .filter(FilterExpression::leaf("quantity", "gte", "5"))
///     .order_desc("createdAt")
///     .aggregate("quantity", "sum")
///     .skip(20)
///     .take(10);
///
/// let parsed: TabularQuery = serde_json::from_str(r#"{
///     "skip": 20,
///     "take": 10,
///     "filter": { "field": "quantity", "operator": "gte", "value": 5 },
///     "sort": [{ "field": "createdAt", "dir": "desc" }],
///     "aggregate": [{ "field": "quantity", "aggregate": "sum" }]
/// }"#).unwrap();
///
/// assert_eq!(query, parsed);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TabularQuery {
    /// Rows to skip after sorting.
    pub skip: usize,
    /// Page size; zero or negative means no limit.
    pub take: i64,
    pub filter: Option<FilterExpression>,
    pub sort: Vec<SortExpression>,
    pub aggregate: Vec<AggregateExpression>,
}

impl TabularQuery {
    /// Creates an empty query: every record, unsorted, unpaged.
    pub fn new() -> Self {
        TabularQuery::default()
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Replaces the filter tree.
    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds a constraint that must hold in addition to the current filter.
    pub fn and_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(current) => FilterExpression::and([current, filter]),
        });
        self
    }

    /// Adds a leaf constraint, ANDed with the current filter.
    pub fn where_field(self, field: &str, operator: &str, value: impl Into<String>) -> Self {
        self.and_filter(FilterExpression::leaf(field, operator, value))
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Appends a sort directive.
    pub fn order_by(mut self, field: &str, dir: Dir) -> Self {
        self.sort.push(SortExpression::new(field, dir));
        self
    }

    /// Appends an ascending sort directive.
    pub fn order_asc(self, field: &str) -> Self {
        self.order_by(field, Dir::Asc)
    }

    /// Appends a descending sort directive.
    pub fn order_desc(self, field: &str) -> Self {
        self.order_by(field, Dir::Desc)
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Requests an aggregate over the filtered set.
    pub fn aggregate(mut self, field: &str, function: &str) -> Self {
        self.aggregate.push(AggregateExpression::new(field, function));
        self
    }

    // ========================================================================
    // Paging
    // ========================================================================

    /// Sets the number of rows to skip.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Sets the page size. Zero or negative means no limit.
    pub fn take(mut self, n: i64) -> Self {
        self.take = n;
        self
    }

    /// Returns the page size, or `None` when unlimited.
    pub fn page_size(&self) -> Option<usize> {
        if self.take > 0 {
            Some(usize::try_from(self.take).unwrap_or(usize::MAX))
        } else {
            None
        }
    }
}
