//! Multi-level grouping.

use std::borrow::Borrow;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::aggregate::{evaluate, AggregateFunction, AggregateResults, Aggregator, CompiledAggregate};
use crate::ordering::{Dir, SortDescriptor};
use crate::traits::{FieldDef, Record};
use crate::value::{Number, Scalar, Value};

/// One grouping level: a sort key plus the aggregates computed per group.
///
/// # Example
///
/// ```
/// use gridquery::{AggregateFunction, GroupDescriptor};
///
/// let by_country = GroupDescriptor::asc("country")
///     .aggregate("population", AggregateFunction::Sum)
///     .aggregate("city", AggregateFunction::Count);
/// assert_eq!(by_country.aggregates.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub field: String,
    #[serde(default)]
    pub dir: Dir,
    #[serde(default)]
    pub aggregates: Vec<Aggregator>,
}

impl GroupDescriptor {
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        GroupDescriptor {
            field: field.into(),
            dir,
            aggregates: Vec::new(),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        GroupDescriptor::new(field, Dir::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        GroupDescriptor::new(field, Dir::Desc)
    }

    /// Adds an aggregate computed for every group at this level.
    pub fn aggregate(mut self, field: impl Into<String>, function: AggregateFunction) -> Self {
        self.aggregates.push(Aggregator::new(field, function));
        self
    }

    /// The sort key this level contributes.
    pub fn sort_key(&self) -> SortDescriptor {
        SortDescriptor::new(self.field.clone(), self.dir)
    }
}

/// A grouping level checked against the field registry.
#[derive(Debug, Clone)]
pub(crate) struct CompiledGroup {
    /// Label for [`GroupResult::field`]: the field name as requested.
    pub name: String,
    pub def: &'static FieldDef,
    pub aggregates: Vec<CompiledAggregate>,
}

/// Contents of a group: nested groups or, at the last level, records.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItems<R> {
    Groups(Vec<GroupResult<R>>),
    Records(Vec<R>),
}

impl<R> GroupItems<R> {
    pub fn len(&self) -> usize {
        match self {
            GroupItems::Groups(groups) => groups.len(),
            GroupItems::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Serialize> Serialize for GroupItems<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GroupItems::Groups(groups) => groups.serialize(serializer),
            GroupItems::Records(records) => records.serialize(serializer),
        }
    }
}

/// One node of the group tree.
///
/// Serializes as `{value, field: "<name> (<count>)", aggregates, items,
/// hasSubgroups}`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult<R> {
    /// The shared key value.
    pub value: Scalar,
    /// The grouped field's name.
    pub field: String,
    /// Number of records in the group, across all nested levels.
    pub count: usize,
    pub aggregates: AggregateResults,
    pub items: GroupItems<R>,
}

impl<R> GroupResult<R> {
    pub fn has_subgroups(&self) -> bool {
        matches!(self.items, GroupItems::Groups(_))
    }

    /// The records of this group and all its subgroups, in order.
    pub fn records(&self) -> Vec<&R> {
        let mut records = Vec::with_capacity(self.count);
        self.collect_records(&mut records);
        records
    }

    /// Converts the records at every level.
    pub fn map<U>(self, f: &mut impl FnMut(R) -> U) -> GroupResult<U> {
        let items = match self.items {
            GroupItems::Groups(groups) => {
                GroupItems::Groups(groups.into_iter().map(|group| group.map(f)).collect())
            }
            GroupItems::Records(records) => GroupItems::Records(records.into_iter().map(f).collect()),
        };
        GroupResult {
            value: self.value,
            field: self.field,
            count: self.count,
            aggregates: self.aggregates,
            items,
        }
    }

    fn collect_records<'a>(&'a self, out: &mut Vec<&'a R>) {
        match &self.items {
            GroupItems::Groups(groups) => {
                for group in groups {
                    group.collect_records(out);
                }
            }
            GroupItems::Records(records) => out.extend(records),
        }
    }
}

impl<R: Serialize> Serialize for GroupResult<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GroupResult", 5)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("field", &format!("{} ({})", self.field, self.count))?;
        state.serialize_field("aggregates", &self.aggregates)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("hasSubgroups", &self.has_subgroups())?;
        state.end()
    }
}

/// Hashable form of a group key value.
#[derive(Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Bool(bool),
    Int(i128),
    Float(u64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    Guid(Uuid),
}

impl From<Value<'_>> for GroupKey {
    fn from(value: Value<'_>) -> Self {
        match value {
            Value::Null => GroupKey::Null,
            Value::Bool(b) => GroupKey::Bool(b),
            Value::Number(Number::I64(n)) => GroupKey::Int(i128::from(n)),
            Value::Number(Number::U64(n)) => GroupKey::Int(i128::from(n)),
            // -0.0 and 0.0 share a group.
            Value::Number(Number::F64(n)) => GroupKey::Float(if n == 0.0 { 0 } else { n.to_bits() }),
            Value::Decimal(d) => GroupKey::Decimal(d.normalize()),
            Value::String(s) => GroupKey::String(s.to_string()),
            Value::DateTime(dt) => GroupKey::DateTime(dt),
            Value::Guid(g) => GroupKey::Guid(g),
        }
    }
}

/// Partitions `rows` by the first level's key, in first-encounter order,
/// then recurses on the remaining levels.
pub(crate) fn group_by_many<T, R>(rows: Vec<R>, levels: &[CompiledGroup]) -> Vec<GroupResult<R>>
where
    T: Record,
    R: Borrow<T>,
{
    let Some((level, rest)) = levels.split_first() else {
        return Vec::new();
    };

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut partitions: Vec<(Scalar, Vec<R>)> = Vec::new();
    for row in rows {
        let record: &T = row.borrow();
        let value = record.field_value(level.def.name);
        let slot = *index.entry(GroupKey::from(value)).or_insert_with(|| {
            partitions.push((value.to_scalar(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(row);
    }

    partitions
        .into_iter()
        .map(|(value, rows)| {
            let aggregates = AggregateResults::collect(&level.aggregates, |def, function| {
                let values = rows.iter().map(|row| {
                    let record: &T = row.borrow();
                    record.field_value(def.name)
                });
                evaluate(values, function, def)
            });
            let count = rows.len();
            let items = if rest.is_empty() {
                GroupItems::Records(rows)
            } else {
                GroupItems::Groups(group_by_many::<T, R>(rows, rest))
            };
            GroupResult {
                value,
                field: level.name.clone(),
                count,
                aggregates,
                items,
            }
        })
        .collect()
}
