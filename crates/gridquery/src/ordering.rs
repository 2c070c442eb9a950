//! Sort composition.
//!
//! Provides [`Dir`] and [`SortDescriptor`], value comparison, multi-key
//! comparison, and the two rewrites applied before sorting: the synthetic
//! default key for paging and the merge of group keys.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::traits::{resolve_field, FieldDef};
use crate::value::{Number, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the wire name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single sort key: field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    #[serde(default)]
    pub dir: Dir,
}

impl SortDescriptor {
    /// Creates a new ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        SortDescriptor::new(field, Dir::Asc)
    }

    /// Creates a new descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        SortDescriptor::new(field, Dir::Desc)
    }

    /// Creates a new sort key with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        SortDescriptor {
            field: field.into(),
            dir,
        }
    }

    /// Compares two values according to this key, using [`total_order`].
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        self.dir.apply(total_order(a, b))
    }
}

/// Compares two values of the same kind.
///
/// Nulls sort first. Numbers and decimals compare with each other. Returns
/// `None` if the kinds don't match or comparison is not possible (NaN).
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Decimal(b)) => a.to_decimal().map(|a| a.cmp(b)),
        (Value::Decimal(a), Value::Number(b)) => b.to_decimal().map(|b| a.cmp(&b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),

        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),

        // Kind mismatch - cannot compare
        _ => None,
    }
}

/// Total order over values, used for sorting and for `min`/`max`.
///
/// Agrees with [`compare_values`] wherever that returns `Some`. NaN sorts
/// after every other number, and values of different kinds order by kind:
/// null, bool, number/decimal, string, date/time, GUID.
pub fn total_order(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.total_cmp(*b),
        (Value::Number(a), Value::Decimal(b)) => number_to_decimal(*a, b),
        (Value::Decimal(a), Value::Number(b)) => number_to_decimal(*b, a).reverse(),
        _ => compare_values(a, b).unwrap_or_else(|| kind_rank(a).cmp(&kind_rank(b))),
    }
}

fn number_to_decimal(n: Number, d: &Decimal) -> Ordering {
    match n.to_decimal() {
        Some(n) => n.cmp(d),
        // NaN, infinities and floats beyond the decimal range
        None if n.is_nan() || n.to_f64() > 0.0 => Ordering::Greater,
        None => Ordering::Less,
    }
}

fn kind_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) | Value::Decimal(_) => 2,
        Value::String(_) => 3,
        Value::DateTime(_) => 4,
        Value::Guid(_) => 5,
    }
}

/// Compares two items using a list of sort keys.
///
/// Uses the first key as the primary sort key, the second to break ties, etc.
/// If all keys compare equal, returns `Equal`.
pub fn compare_by_orderings<T, F>(a: &T, b: &T, orderings: &[SortDescriptor], accessor: &F) -> Ordering
where
    for<'a> F: Fn(&'a T, &str) -> Value<'a>,
{
    for order_by in orderings {
        let val_a = accessor(a, &order_by.field);
        let val_b = accessor(b, &order_by.field);

        let ordering = order_by.compare(&val_a, &val_b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Picks the fallback sort key used when a page is requested without one.
///
/// Policy: the first field named `id` (ASCII case-insensitive), else the
/// first field whose name contains `id`, else the first declared field;
/// always descending. `None` only for a record type without fields.
pub fn default_sort(fields: &[FieldDef]) -> Option<SortDescriptor> {
    fields
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case("id"))
        .or_else(|| {
            fields
                .iter()
                .find(|def| def.name.to_ascii_lowercase().contains("id"))
        })
        .or_else(|| fields.first())
        .map(|def| SortDescriptor::desc(def.name))
}

/// Puts group keys in front of the sort keys, in declaration order, so that
/// rows reach the grouping stage already ordered by their group keys.
pub fn merge_group_keys(sort: &[SortDescriptor], group_keys: &[SortDescriptor]) -> Vec<SortDescriptor> {
    let mut merged = sort.to_vec();
    for key in group_keys.iter().rev() {
        merged.insert(0, key.clone());
    }
    merged
}

/// Resolves every key against a field registry, rewriting names to their
/// declared spelling.
pub fn resolve_orderings(
    fields: &'static [FieldDef],
    orderings: &[SortDescriptor],
) -> Result<Vec<SortDescriptor>> {
    orderings
        .iter()
        .map(|key| {
            let def = resolve_field(fields, &key.field)?;
            Ok(SortDescriptor::new(def.name, key.dir))
        })
        .collect()
}
