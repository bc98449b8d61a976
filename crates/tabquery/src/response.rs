//! The tabular query result.

use serde::Serialize;

use crate::aggregate::Aggregates;

/// One page of results, borrowed from the queried collection.
///
/// Serializes as `{"count": …, "aggregates": …, "items": […]}`, with
/// `aggregates` set to `null` when none were computed.
#[derive(Debug, Serialize)]
pub struct TabularResponse<'a, T> {
    /// Matching rows before paging.
    pub count: usize,
    /// Aggregates over every matching row, not just this page.
    pub aggregates: Option<Aggregates>,
    /// The page, filtered and sorted.
    pub items: Vec<&'a T>,
}

impl<'a, T> TabularResponse<'a, T> {
    /// Number of rows on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> Clone for TabularResponse<'a, T> {
    fn clone(&self) -> Self {
        TabularResponse {
            count: self.count,
            aggregates: self.aggregates.clone(),
            items: self.items.clone(),
        }
    }
}
