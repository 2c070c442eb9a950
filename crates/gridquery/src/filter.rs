//! The filter tree as it arrives on the wire.
//!
//! A [`FilterNode`] is either a leaf condition or a composite joining child
//! nodes with `and`/`or` logic. Nothing here is validated against a record
//! type; that happens in [`crate::predicate`].

use serde::{Deserialize, Serialize};

use crate::op::Operator;

/// Boolean combinator of a composite filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

/// A single `field operator value` condition.
///
/// The operator stays a string until compilation so that unknown operators
/// surface as [`crate::QueryError::UnsupportedOperator`] rather than as a
/// parse failure of the whole request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub field: String,
    pub operator: String,
    pub value: serde_json::Value,
}

/// Node of a filter tree.
///
/// # Example
///
/// ```
/// use gridquery::{FilterNode, Operator};
///
/// let filter = FilterNode::and([
///     FilterNode::leaf("age", Operator::Gte, 30),
///     FilterNode::or([
///         FilterNode::leaf("name", Operator::StartsWith, "a"),
///         FilterNode::leaf("name", Operator::StartsWith, "b"),
///     ]),
/// ]);
///
/// let fields: Vec<&str> = filter.all().iter().map(|leaf| leaf.field.as_str()).collect();
/// assert_eq!(fields, ["age", "name", "name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub enum FilterNode {
    Leaf(FilterLeaf),
    Composite {
        /// Missing logic on a node with children is read as `and`.
        logic: Option<Logic>,
        filters: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Creates a leaf condition.
    pub fn leaf(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        FilterNode::Leaf(FilterLeaf {
            field: field.into(),
            operator: operator.as_str().to_string(),
            value: value.into(),
        })
    }

    /// Creates an `and` composite.
    pub fn and(filters: impl IntoIterator<Item = FilterNode>) -> Self {
        FilterNode::Composite {
            logic: Some(Logic::And),
            filters: filters.into_iter().collect(),
        }
    }

    /// Creates an `or` composite.
    pub fn or(filters: impl IntoIterator<Item = FilterNode>) -> Self {
        FilterNode::Composite {
            logic: Some(Logic::Or),
            filters: filters.into_iter().collect(),
        }
    }

    /// Returns `true` for a composite without children, which filters nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterNode::Composite { filters, .. } if filters.iter().all(FilterNode::is_empty))
    }

    /// Collects every leaf in pre-order.
    pub fn all(&self) -> Vec<&FilterLeaf> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a FilterLeaf>) {
        match self {
            FilterNode::Leaf(leaf) => leaves.push(leaf),
            FilterNode::Composite { filters, .. } => {
                for child in filters {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

/// Flat wire shape shared by leaves and composites.
#[derive(Serialize, Deserialize)]
struct RawFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logic: Option<Logic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filters: Option<Vec<FilterNode>>,
}

impl TryFrom<RawFilter> for FilterNode {
    type Error = String;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        match raw.field {
            Some(field) => {
                let operator = raw
                    .operator
                    .ok_or_else(|| format!("filter on field '{}' has no operator", field))?;
                Ok(FilterNode::Leaf(FilterLeaf {
                    field,
                    operator,
                    value: raw.value.unwrap_or(serde_json::Value::Null),
                }))
            }
            None => Ok(FilterNode::Composite {
                logic: raw.logic,
                filters: raw.filters.unwrap_or_default(),
            }),
        }
    }
}

impl From<FilterNode> for RawFilter {
    fn from(node: FilterNode) -> Self {
        match node {
            FilterNode::Leaf(leaf) => RawFilter {
                field: Some(leaf.field),
                operator: Some(leaf.operator),
                value: Some(leaf.value),
                logic: None,
                filters: None,
            },
            FilterNode::Composite { logic, filters } => RawFilter {
                field: None,
                operator: None,
                value: None,
                logic,
                filters: Some(filters),
            },
        }
    }
}
