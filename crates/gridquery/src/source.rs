//! The data-layer boundary.
//!
//! The pipeline never touches records directly; it composes operations on a
//! [`DataSource`] and asks for the rows at the end. [`MemorySource`] is the
//! in-memory implementation over owned or borrowed records.

use std::borrow::Borrow;
use std::marker::PhantomData;

use crate::aggregate::{evaluate, AggregateFunction};
use crate::ordering::{compare_by_orderings, SortDescriptor};
use crate::predicate::Predicate;
use crate::traits::{FieldDef, Record};
use crate::value::Scalar;

/// A queryable sequence of records.
///
/// Operations consume and return the source so implementations can build up
/// a deferred plan; [`DataSource::materialize`] runs it.
pub trait DataSource: Sized {
    /// The record type the field registry comes from.
    type Record: Record;
    /// What [`DataSource::materialize`] yields: the record itself or a
    /// reference to it.
    type Row: Borrow<Self::Record>;

    /// Keeps the records the predicate matches.
    fn filter(self, predicate: &Predicate) -> Self;

    /// Number of records currently in the sequence.
    fn count(&self) -> usize;

    /// Evaluates one aggregate over the field's values. `None` when the
    /// result cannot be represented.
    fn aggregate(&self, def: &FieldDef, function: AggregateFunction) -> Option<Scalar>;

    /// Stable multi-key ordering, leftmost key first. Field names are
    /// already resolved against the registry.
    fn order_by(self, keys: &[SortDescriptor]) -> Self;

    fn skip(self, n: usize) -> Self;

    fn take(self, n: usize) -> Self;

    /// Runs the composed operations and returns the rows.
    fn materialize(self) -> Vec<Self::Row>;
}

/// In-memory [`DataSource`] over a vector of rows.
///
/// # Example
///
/// ```
/// use gridquery::{DataSource, FieldDef, FieldKind, MemorySource, Number, Record, Value};
///
/// struct Reading(i64);
///
/// impl Record for Reading {
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[FieldDef::new("value", FieldKind::Number, false)];
///         FIELDS
///     }
///
///     fn field_value(&self, _field: &str) -> Value<'_> {
///         Value::Number(Number::I64(self.0))
///     }
/// }
///
/// let readings = [Reading(3), Reading(1), Reading(2)];
/// let rows = MemorySource::borrowed(&readings).skip(1).materialize();
/// assert_eq!(rows.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource<T, R = T> {
    rows: Vec<R>,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T> MemorySource<T, &'a T> {
    /// Queries borrowed records; rows come back as references.
    pub fn borrowed(records: &'a [T]) -> Self {
        MemorySource {
            rows: records.iter().collect(),
            _record: PhantomData,
        }
    }
}

impl<T> MemorySource<T, T> {
    /// Queries owned records.
    pub fn owned(records: Vec<T>) -> Self {
        MemorySource {
            rows: records,
            _record: PhantomData,
        }
    }
}

impl<'a, T> From<&'a [T]> for MemorySource<T, &'a T> {
    fn from(records: &'a [T]) -> Self {
        MemorySource::borrowed(records)
    }
}

impl<T> From<Vec<T>> for MemorySource<T, T> {
    fn from(records: Vec<T>) -> Self {
        MemorySource::owned(records)
    }
}

impl<T, R> DataSource for MemorySource<T, R>
where
    T: Record,
    R: Borrow<T>,
{
    type Record = T;
    type Row = R;

    fn filter(mut self, predicate: &Predicate) -> Self {
        if !predicate.is_always() {
            self.rows.retain(|row| predicate.matches::<T>(row.borrow()));
        }
        self
    }

    fn count(&self) -> usize {
        self.rows.len()
    }

    fn aggregate(&self, def: &FieldDef, function: AggregateFunction) -> Option<Scalar> {
        let values = self.rows.iter().map(|row| {
            let record: &T = row.borrow();
            record.field_value(def.name)
        });
        evaluate(values, function, def)
    }

    fn order_by(mut self, keys: &[SortDescriptor]) -> Self {
        if !keys.is_empty() {
            self.rows
                .sort_by(|a, b| compare_by_orderings::<T, _>(a.borrow(), b.borrow(), keys, &T::accessor));
        }
        self
    }

    fn skip(mut self, n: usize) -> Self {
        let n = n.min(self.rows.len());
        self.rows.drain(..n);
        self
    }

    fn take(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    fn materialize(self) -> Vec<R> {
        self.rows
    }
}
