//! The query request and its fluent builder.

use serde::{Deserialize, Deserializer, Serialize};

use crate::aggregate::{AggregateFunction, Aggregator};
use crate::error::Result;
use crate::filter::FilterNode;
use crate::group::GroupDescriptor;
use crate::ordering::{Dir, SortDescriptor};

/// A grid query: paging window, sort keys, filter tree, grouping levels and
/// aggregates.
///
/// Every member is optional on the wire; missing and `null` members take
/// their empty defaults.
///
/// # Example
///
/// ```
/// use gridquery::{AggregateFunction, FilterNode, GroupDescriptor, Operator, QueryRequest};
///
/// let request = QueryRequest::new()
///     .take(20)
///     .skip(40)
///     .sort_desc("created")
///     .filter(FilterNode::leaf("status", Operator::Eq, "open"))
///     .aggregate("estimate", AggregateFunction::Sum)
///     .group_by(GroupDescriptor::asc("owner"));
///
/// let json = serde_json::to_string(&request).unwrap();
/// assert_eq!(QueryRequest::from_json(&json).unwrap(), request);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Page size. `0` disables paging.
    #[serde(default, deserialize_with = "null_as_default")]
    pub take: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skip: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: Vec<SortDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group: Vec<GroupDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aggregates: Vec<Aggregator>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl QueryRequest {
    /// Creates an empty request: no paging, sorting, filtering or grouping.
    pub fn new() -> Self {
        QueryRequest::default()
    }

    /// Parses a request from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the page size.
    pub fn take(mut self, n: usize) -> Self {
        self.take = n;
        self
    }

    /// Sets the number of records to skip. Only honored when paging.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Adds a sort key.
    pub fn sort(mut self, field: impl Into<String>, dir: Dir) -> Self {
        self.sort.push(SortDescriptor::new(field, dir));
        self
    }

    /// Adds an ascending sort key.
    pub fn sort_asc(self, field: impl Into<String>) -> Self {
        self.sort(field, Dir::Asc)
    }

    /// Adds a descending sort key.
    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.sort(field, Dir::Desc)
    }

    /// Sets the filter tree, replacing any previous one.
    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds a top-level aggregate.
    pub fn aggregate(mut self, field: impl Into<String>, function: AggregateFunction) -> Self {
        self.aggregates.push(Aggregator::new(field, function));
        self
    }

    /// Adds a grouping level.
    pub fn group_by(mut self, group: GroupDescriptor) -> Self {
        self.group.push(group);
        self
    }

    /// Returns `true` if the result will be grouped.
    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Logic;
    use crate::QueryError;

    #[test]
    fn parses_grid_request() {
        let request = QueryRequest::from_json(
            r#"{
                "take": 10,
                "skip": 20,
                "sort": [{ "field": "name", "dir": "desc" }],
                "filter": {
                    "logic": "or",
                    "filters": [{ "field": "age", "operator": "gt", "value": 30 }]
                },
                "group": [{ "field": "city", "dir": "asc", "aggregates": [{ "field": "age", "aggregate": "max" }] }],
                "aggregates": [{ "field": "age", "aggregate": "sum" }]
            }"#,
        )
        .unwrap();

        assert_eq!(request.take, 10);
        assert_eq!(request.skip, 20);
        assert_eq!(request.sort, [SortDescriptor::desc("name")]);
        assert!(matches!(
            request.filter,
            Some(FilterNode::Composite { logic: Some(Logic::Or), .. })
        ));
        assert_eq!(
            request.group,
            [GroupDescriptor::asc("city").aggregate("age", AggregateFunction::Max)]
        );
        assert_eq!(request.aggregates, [Aggregator::new("age", AggregateFunction::Sum)]);
        assert!(request.is_grouped());
    }

    #[test]
    fn missing_and_null_members_take_defaults() {
        let request =
            QueryRequest::from_json(r#"{ "take": 5, "sort": null, "filter": null, "group": null }"#).unwrap();
        assert_eq!(request, QueryRequest::new().take(5));

        assert_eq!(QueryRequest::from_json("{}").unwrap(), QueryRequest::new());
    }

    #[test]
    fn malformed_json_is_an_invalid_request() {
        let err = QueryRequest::from_json(r#"{ "take": "ten" }"#).unwrap_err();
        assert!(matches!(err, QueryError::InvalidRequest(_)));
    }

    #[test]
    fn builder_accumulates() {
        let request = QueryRequest::new()
            .sort_asc("a")
            .sort_desc("b")
            .aggregate("a", AggregateFunction::Count)
            .aggregate("a", AggregateFunction::Min);

        assert_eq!(request.sort, [SortDescriptor::asc("a"), SortDescriptor::desc("b")]);
        assert_eq!(request.aggregates.len(), 2);
        assert!(!request.is_grouped());
    }
}
