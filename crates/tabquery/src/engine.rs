//! Query execution.
//!
//! [`QueryEngine`] ties the pieces together for one record type. Running a
//! query goes through the same fixed pipeline every time:
//!
//! ```text
//! filter -> count -> aggregate -> sort -> skip/take
//! ```
//!
//! The count and the aggregates describe every matching record; only the
//! returned items are paged.

use tracing::{debug, instrument};

use crate::aggregate::CompiledAggregates;
use crate::config::{EngineConfig, ResolutionMode};
use crate::error::{QueryError, Result};
use crate::field::Schema;
use crate::filter::CompiledFilter;
use crate::query::TabularQuery;
use crate::record::Record;
use crate::response::TabularResponse;
use crate::sort::CompiledSort;

/// Runs tabular queries against collections of `T`.
///
/// Build one per record type and reuse it; the field index is built once.
///
/// # Example
///
/// ```
/// use tabquery::{QueryEngine, Record, TabularQuery};
///
/// #[derive(Record)]
/// struct Product {
///     name: String,
///     price: f64,
///     stock: u32,
/// }
///
/// let products = vec![
///     Product { name: "Lamp".into(), price: 24.0, stock: 3 },
///     Product { name: "Desk".into(), price: 180.0, stock: 0 },
///     Product { name: "Chair".into(), price: 75.5, stock: 12 },
/// ];
///
/// let engine = QueryEngine::<Product>::new().unwrap();
/// let query = TabularQuery::new()
///     .where_field("stock", "gt", "0")
///     .order_desc("price")
///     .aggregate("price", "max");
///
/// let response = engine.apply(&products, &query).unwrap();
/// assert_eq!(response.count, 2);
/// assert_eq!(response.items[0].name, "Chair");
/// ```
pub struct QueryEngine<T: 'static> {
    schema: Schema<T>,
    config: EngineConfig,
}

impl<T: Record> QueryEngine<T> {
    /// Creates a permissive engine for `T`.
    ///
    /// Fails only if `T` registers an unusable field table.
    pub fn new() -> Result<Self> {
        QueryEngine::builder().build()
    }

    /// Starts configuring an engine.
    pub fn builder() -> QueryEngineBuilder<T> {
        QueryEngineBuilder {
            config: EngineConfig::default(),
            marker: std::marker::PhantomData,
        }
    }
}

impl<T: 'static> QueryEngine<T> {
    /// Creates an engine over an explicit schema.
    pub fn with_schema(schema: Schema<T>, config: EngineConfig) -> Self {
        QueryEngine { schema, config }
    }

    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves every part of a query against the schema.
    ///
    /// In permissive mode unusable nodes are logged and dropped, so this
    /// only fails in strict mode.
    pub fn compile(&self, query: &TabularQuery) -> Result<CompiledQuery<T>> {
        let mut issues = Vec::new();

        let filter = query
            .filter
            .as_ref()
            .and_then(|filter| filter.compile(&self.schema, &mut issues));
        let sort = CompiledSort::compile(&query.sort, &self.schema, &mut issues);
        let aggregates = CompiledAggregates::compile(&query.aggregate, &self.schema, &mut issues);

        match self.config.mode {
            ResolutionMode::Strict => {
                if let Some(issue) = issues.into_iter().next() {
                    return Err(issue);
                }
            }
            ResolutionMode::Permissive => {
                for issue in &issues {
                    log_dropped(issue);
                }
            }
        }

        Ok(CompiledQuery {
            filter,
            sort,
            aggregates,
            skip: query.skip,
            take: query.page_size(),
        })
    }

    /// Compiles and runs a query in one step.
    #[instrument(level = "trace", skip_all, fields(rows = items.len()))]
    pub fn apply<'a>(
        &self,
        items: &'a [T],
        query: &TabularQuery,
    ) -> Result<TabularResponse<'a, T>> {
        let response = self.compile(query)?.run(items);
        tracing::trace!(count = response.count, page = response.items.len(), "query applied");
        Ok(response)
    }
}

impl<T: 'static> Clone for QueryEngine<T> {
    fn clone(&self) -> Self {
        QueryEngine {
            schema: self.schema.clone(),
            config: self.config,
        }
    }
}

impl<T: 'static> std::fmt::Debug for QueryEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish()
    }
}

fn log_dropped(issue: &QueryError) {
    match issue {
        QueryError::FieldNotFound { field } => {
            debug!(field = %field, "Dropped query node: unknown field");
        }
        QueryError::UnknownOperator { operator } => {
            debug!(operator = %operator, "Dropped filter: unknown operator");
        }
        QueryError::UnsupportedOperator {
            operator,
            field,
            kind,
        } => {
            debug!(
                field = %field,
                operator = %operator,
                kind = %kind,
                "Dropped filter: operator not valid for field"
            );
        }
        QueryError::InvalidValue { field, value, kind } => {
            debug!(
                field = %field,
                value = %value,
                kind = %kind,
                "Dropped filter: value does not parse"
            );
        }
        QueryError::UnknownAggregate { aggregate } => {
            debug!(aggregate = %aggregate, "Aggregate reported as null: unknown function");
        }
        QueryError::UnsupportedAggregate {
            aggregate,
            field,
            kind,
        } => {
            debug!(
                field = %field,
                aggregate = %aggregate,
                kind = %kind,
                "Aggregate reported as null: function not valid for field"
            );
        }
        QueryError::MalformedExpression { reason } | QueryError::InvalidSchema { reason } => {
            debug!(reason = %reason, "Dropped query node");
        }
    }
}

/// Configures a [`QueryEngine`].
///
/// ```
/// use tabquery::{QueryEngine, Record, ResolutionMode};
///
/// #[derive(Record)]
/// struct Row {
///     id: u64,
/// }
///
/// let engine = QueryEngine::<Row>::builder().strict().build().unwrap();
/// assert_eq!(engine.config().mode, ResolutionMode::Strict);
/// ```
pub struct QueryEngineBuilder<T> {
    config: EngineConfig,
    marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Record> QueryEngineBuilder<T> {
    /// Rejects queries with unusable nodes instead of dropping them.
    pub fn strict(mut self) -> Self {
        self.config.mode = ResolutionMode::Strict;
        self
    }

    pub fn mode(mut self, mode: ResolutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Indexes `T`'s fields and returns the engine.
    pub fn build(self) -> Result<QueryEngine<T>> {
        Ok(QueryEngine {
            schema: Schema::new()?,
            config: self.config,
        })
    }
}

/// A query resolved against a schema, ready to run against any number of
/// collections.
pub struct CompiledQuery<T: 'static> {
    filter: Option<CompiledFilter<T>>,
    sort: CompiledSort<T>,
    aggregates: CompiledAggregates<T>,
    skip: usize,
    take: Option<usize>,
}

impl<T: 'static> CompiledQuery<T> {
    /// The compiled filter, or `None` if the query does not constrain rows.
    pub fn filter(&self) -> Option<&CompiledFilter<T>> {
        self.filter.as_ref()
    }

    /// Returns `true` if `record` passes the filter.
    pub fn matches(&self, record: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(record))
    }

    /// Runs the pipeline over `items`.
    pub fn run<'a>(&self, items: &'a [T]) -> TabularResponse<'a, T> {
        let mut rows: Vec<&'a T> = items.iter().filter(|item| self.matches(item)).collect();

        let count = rows.len();
        let aggregates = self.aggregates.run(&rows);

        self.sort.sort(&mut rows);

        let page = rows.into_iter().skip(self.skip);
        let items = match self.take {
            Some(take) => page.take(take).collect(),
            None => page.collect(),
        };

        TabularResponse {
            count,
            aggregates,
            items,
        }
    }
}

impl<T: 'static> Clone for CompiledQuery<T> {
    fn clone(&self) -> Self {
        CompiledQuery {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            aggregates: self.aggregates.clone(),
            skip: self.skip,
            take: self.take,
        }
    }
}

impl<T: 'static> std::fmt::Debug for CompiledQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("aggregates", &self.aggregates)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .finish()
    }
}
