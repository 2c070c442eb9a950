//! The query response.

use serde::Serialize;

use crate::aggregate::{AggregateFunction, AggregateResults};
use crate::group::GroupResult;
use crate::value::Scalar;

/// Result of running a request: either a flat page of rows or a group tree,
/// plus the pre-paging total and aggregates.
///
/// Serializes as `{data?, total, aggregates, group?}`; `aggregates` is
/// `null` when none were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<R> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<R>>,
    /// Number of records that passed the filter, before paging.
    pub total: usize,
    pub aggregates: Option<AggregateResults>,
    #[serde(rename = "group", skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupResult<R>>>,
}

impl<R> QueryResult<R> {
    /// The flat rows, empty for a grouped result.
    pub fn rows(&self) -> &[R] {
        self.data.as_deref().unwrap_or_default()
    }

    /// The top-level groups, empty for a flat result.
    pub fn groups(&self) -> &[GroupResult<R>] {
        self.groups.as_deref().unwrap_or_default()
    }

    pub fn is_grouped(&self) -> bool {
        self.groups.is_some()
    }

    /// Shortcut for one top-level aggregate value.
    pub fn aggregate(&self, field: &str, function: AggregateFunction) -> Option<&Scalar> {
        self.aggregates.as_ref()?.get(field, function)
    }

    /// Converts the rows, e.g. from references to owned records.
    pub fn map<U>(self, mut f: impl FnMut(R) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(|rows| rows.into_iter().map(&mut f).collect()),
            total: self.total,
            aggregates: self.aggregates,
            groups: self
                .groups
                .map(|groups| groups.into_iter().map(|group| group.map(&mut f)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupItems;
    use serde_json::json;

    #[test]
    fn flat_result_wire_shape() {
        let result = QueryResult {
            data: Some(vec![1, 2]),
            total: 7,
            aggregates: None,
            groups: None,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "data": [1, 2], "total": 7, "aggregates": null })
        );
        assert_eq!(result.rows(), [1, 2]);
        assert!(result.groups().is_empty());
    }

    #[test]
    fn grouped_result_wire_shape() {
        let mut aggregates = AggregateResults::new();
        aggregates.insert("n", AggregateFunction::Count, Scalar::from(2i64));
        let result = QueryResult {
            data: None,
            total: 2,
            aggregates: Some(aggregates),
            groups: Some(vec![GroupResult {
                value: Scalar::from("x"),
                field: "kind".to_string(),
                count: 2,
                aggregates: AggregateResults::new(),
                items: GroupItems::Records(vec![1, 2]),
            }]),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "total": 2,
                "aggregates": { "n": { "count": 2 } },
                "group": [{
                    "value": "x",
                    "field": "kind (2)",
                    "aggregates": {},
                    "items": [1, 2],
                    "hasSubgroups": false
                }]
            })
        );
        assert!(result.is_grouped());
        assert_eq!(result.aggregate("n", AggregateFunction::Count), Some(&Scalar::from(2i64)));
    }

    #[test]
    fn map_converts_rows_at_every_level() {
        let result = QueryResult {
            data: None,
            total: 1,
            aggregates: None,
            groups: Some(vec![GroupResult {
                value: Scalar::Null,
                field: "a".to_string(),
                count: 1,
                aggregates: AggregateResults::new(),
                items: GroupItems::Groups(vec![GroupResult {
                    value: Scalar::Null,
                    field: "b".to_string(),
                    count: 1,
                    aggregates: AggregateResults::new(),
                    items: GroupItems::Records(vec![3]),
                }]),
            }]),
        };

        let mapped = result.map(|n| n * 10);
        assert_eq!(mapped.groups()[0].records(), [&30]);
    }
}
