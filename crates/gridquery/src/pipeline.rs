//! Request compilation and execution.
//!
//! A [`QueryPlan`] is a request checked against a record type: every field
//! resolved, every literal coerced, the final sort sequence decided. Running
//! it against a [`DataSource`] cannot fail.
//!
//! Stages, in order:
//!
//! ```text
//! filter -> count (total) -> aggregate -> sort -> page -> group | materialize
//! ```
//!
//! Aggregates see the whole filtered set, never just the page.

use std::marker::PhantomData;

use tracing::debug;

use crate::aggregate::{compile_aggregates, AggregateResults, CompiledAggregate};
use crate::config::QueryOptions;
use crate::error::Result;
use crate::group::{group_by_many, CompiledGroup, GroupDescriptor};
use crate::ordering::{default_sort, merge_group_keys, resolve_orderings, SortDescriptor};
use crate::predicate::Predicate;
use crate::request::QueryRequest;
use crate::result::QueryResult;
use crate::source::{DataSource, MemorySource};
use crate::traits::{resolve_field, Record};

/// A compiled request for records of type `T`.
#[derive(Debug, Clone)]
pub struct QueryPlan<T> {
    predicate: Predicate,
    /// `None` when the request asked for no aggregates.
    aggregates: Option<Vec<CompiledAggregate>>,
    sort: Vec<SortDescriptor>,
    groups: Vec<CompiledGroup>,
    take: usize,
    skip: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> QueryPlan<T> {
    /// Compiles a request with default options.
    pub fn compile(request: &QueryRequest) -> Result<Self> {
        QueryPlan::compile_with_options(request, &QueryOptions::default())
    }

    /// Compiles a request.
    ///
    /// # Errors
    ///
    /// Any unknown field, unsupported operator or malformed literal anywhere
    /// in the request. Unknown aggregate functions are dropped instead.
    pub fn compile_with_options(request: &QueryRequest, options: &QueryOptions) -> Result<Self> {
        let fields = T::fields();
        let predicate = Predicate::compile(request.filter.as_ref(), fields, options)?;

        let aggregates = if request.aggregates.is_empty() {
            None
        } else {
            Some(compile_aggregates(fields, &request.aggregates)?)
        };

        let mut groups = Vec::with_capacity(request.group.len());
        for group in &request.group {
            let def = resolve_field(fields, &group.field)?;
            groups.push(CompiledGroup {
                name: group.field.clone(),
                def,
                aggregates: compile_aggregates(fields, &group.aggregates)?,
            });
        }
        let group_keys: Vec<SortDescriptor> =
            request.group.iter().map(GroupDescriptor::sort_key).collect();
        let group_keys = resolve_orderings(fields, &group_keys)?;

        let take = options.effective_take(request.take);
        let mut sort = resolve_orderings(fields, &request.sort)?;
        if sort.is_empty() && take > 0 {
            // Paging needs a deterministic order.
            sort.extend(default_sort(fields));
        }
        let sort = merge_group_keys(&sort, &group_keys);

        debug!(
            take,
            skip = request.skip,
            sort = sort.len(),
            groups = groups.len(),
            "compiled query plan"
        );

        Ok(QueryPlan {
            predicate,
            aggregates,
            sort,
            groups,
            take,
            skip: request.skip,
            _record: PhantomData,
        })
    }

    /// The compiled filter.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// The sort sequence applied before paging, group keys first.
    pub fn sort(&self) -> &[SortDescriptor] {
        &self.sort
    }

    /// Page size after `max_take`; `0` means no paging.
    pub fn take(&self) -> usize {
        self.take
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Runs the plan against a data source.
    pub fn execute<S>(&self, source: S) -> QueryResult<S::Row>
    where
        S: DataSource<Record = T>,
    {
        let source = source.filter(&self.predicate);
        let total = source.count();
        debug!(total, "filtered");

        let aggregates = self.aggregates.as_ref().map(|aggregates| {
            AggregateResults::collect(aggregates, |def, function| source.aggregate(def, function))
        });

        let mut source = source.order_by(&self.sort);
        if self.take > 0 {
            if self.sort.is_empty() {
                // Without any sort key there is no stable position to skip to.
                debug!(take = self.take, skip = self.skip, "unordered page, skip ignored");
                source = source.take(self.take);
            } else {
                source = source.skip(self.skip).take(self.take);
            }
        }

        let rows = source.materialize();
        if self.groups.is_empty() {
            QueryResult {
                data: Some(rows),
                total,
                aggregates,
                groups: None,
            }
        } else {
            let groups = group_by_many::<T, S::Row>(rows, &self.groups);
            debug!(groups = groups.len(), "grouped");
            QueryResult {
                data: None,
                total,
                aggregates,
                groups: Some(groups),
            }
        }
    }
}

/// Compiles and runs a request against a data source with default options.
pub fn execute<S: DataSource>(source: S, request: &QueryRequest) -> Result<QueryResult<S::Row>> {
    execute_with_options(source, request, &QueryOptions::default())
}

/// Compiles and runs a request against a data source.
pub fn execute_with_options<S: DataSource>(
    source: S,
    request: &QueryRequest,
    options: &QueryOptions,
) -> Result<QueryResult<S::Row>> {
    let plan = QueryPlan::<S::Record>::compile_with_options(request, options)?;
    Ok(plan.execute(source))
}

/// Runs requests directly against slices of records.
///
/// # Example
///
/// ```
/// use gridquery::{FieldDef, FieldKind, Number, QueryExt, QueryRequest, Record, Value};
///
/// struct Item {
///     id: u32,
/// }
///
/// impl Record for Item {
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[FieldDef::new("id", FieldKind::Number, false)];
///         FIELDS
///     }
///
///     fn field_value(&self, _field: &str) -> Value<'_> {
///         Value::Number(Number::from(self.id))
///     }
/// }
///
/// let items: Vec<Item> = (1..=5).map(|id| Item { id }).collect();
/// let page = items.query(&QueryRequest::new().take(2)).unwrap();
///
/// // Paging without a sort key falls back to `id desc`.
/// let ids: Vec<u32> = page.rows().iter().map(|item| item.id).collect();
/// assert_eq!(ids, [5, 4]);
/// assert_eq!(page.total, 5);
/// ```
pub trait QueryExt<T: Record> {
    /// Runs a request with default options; rows borrow from the slice.
    fn query(&self, request: &QueryRequest) -> Result<QueryResult<&T>> {
        self.query_with_options(request, &QueryOptions::default())
    }

    /// Runs a request; rows borrow from the slice.
    fn query_with_options(&self, request: &QueryRequest, options: &QueryOptions) -> Result<QueryResult<&T>>;
}

impl<T: Record> QueryExt<T> for [T] {
    fn query_with_options(&self, request: &QueryRequest, options: &QueryOptions) -> Result<QueryResult<&T>> {
        execute_with_options(MemorySource::borrowed(self), request, options)
    }
}
