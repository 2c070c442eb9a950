//! Per-field aggregates.
//!
//! Aggregators arrive as `(field, function)` pairs. Fields are validated
//! eagerly; function names that are unknown, or that don't apply to the
//! field's kind (`sum` over strings), are skipped.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::ordering::total_order;
use crate::traits::{resolve_field, FieldDef, FieldKind};
use crate::value::{Number, Scalar, Value};

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Count,
    Average,
    Min,
    Max,
}

impl AggregateFunction {
    /// Parses a wire function name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let function = match name.to_ascii_lowercase().as_str() {
            "sum" => AggregateFunction::Sum,
            "count" => AggregateFunction::Count,
            "average" => AggregateFunction::Average,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            _ => return None,
        };
        Some(function)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Average => "average",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Returns `true` if the function can be evaluated over `def`.
    pub fn applies_to(self, def: &FieldDef) -> bool {
        match self {
            AggregateFunction::Sum | AggregateFunction::Average => def.kind.is_numeric(),
            AggregateFunction::Count | AggregateFunction::Min | AggregateFunction::Max => true,
        }
    }
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested aggregate, as it appears on the wire.
///
/// The function stays a string so that unknown names can be skipped instead
/// of failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregator {
    pub field: String,
    pub aggregate: String,
}

impl Aggregator {
    pub fn new(field: impl Into<String>, function: AggregateFunction) -> Self {
        Aggregator {
            field: field.into(),
            aggregate: function.as_str().to_string(),
        }
    }
}

/// An aggregator checked against the field registry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledAggregate {
    /// Result key: the field name as requested.
    pub name: String,
    pub def: &'static FieldDef,
    pub function: AggregateFunction,
}

/// Validates aggregators. Unknown fields fail; unknown or inapplicable
/// functions are dropped.
pub(crate) fn compile_aggregates(
    fields: &'static [FieldDef],
    aggregators: &[Aggregator],
) -> Result<Vec<CompiledAggregate>> {
    let mut compiled = Vec::with_capacity(aggregators.len());
    for aggregator in aggregators {
        let def = resolve_field(fields, &aggregator.field)?;
        let function = match AggregateFunction::parse(&aggregator.aggregate) {
            Some(function) if function.applies_to(def) => function,
            _ => {
                debug!(
                    field = %aggregator.field,
                    aggregate = %aggregator.aggregate,
                    kind = def.kind.as_str(),
                    "skipping aggregate"
                );
                continue;
            }
        };
        compiled.push(CompiledAggregate {
            name: aggregator.field.clone(),
            def,
            function,
        });
    }
    Ok(compiled)
}

/// Aggregate values keyed by field, then function.
///
/// Serializes as `{"age": {"sum": 100, "max": 40}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResults(BTreeMap<String, BTreeMap<AggregateFunction, Scalar>>);

impl AggregateResults {
    pub fn new() -> Self {
        AggregateResults::default()
    }

    /// Returns one aggregate value.
    pub fn get(&self, field: &str, function: AggregateFunction) -> Option<&Scalar> {
        self.0.get(field)?.get(&function)
    }

    /// Returns every aggregate computed for a field.
    pub fn field(&self, field: &str) -> Option<&BTreeMap<AggregateFunction, Scalar>> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, function: AggregateFunction, value: Scalar) {
        self.0.entry(field.into()).or_default().insert(function, value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, function, value)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, AggregateFunction, &Scalar)> {
        self.0.iter().flat_map(|(field, values)| {
            values
                .iter()
                .map(move |(function, value)| (field.as_str(), *function, value))
        })
    }

    /// Evaluates every aggregate with `eval`, keyed by the requested names.
    pub(crate) fn collect<F>(aggregates: &[CompiledAggregate], mut eval: F) -> Self
    where
        F: FnMut(&'static FieldDef, AggregateFunction) -> Option<Scalar>,
    {
        let mut results = AggregateResults::new();
        for aggregate in aggregates {
            match eval(aggregate.def, aggregate.function) {
                Some(value) => results.insert(aggregate.name.as_str(), aggregate.function, value),
                None => debug!(field = %aggregate.name, aggregate = %aggregate.function, "aggregate overflowed"),
            }
        }
        results
    }
}

/// Evaluates one aggregate function over a field's projected values.
///
/// - `count` counts every value on non-nullable fields and non-null values
///   on nullable ones.
/// - `sum` is exact over integers and decimals. An empty sum is zero.
/// - `average` is `f64` over numbers and a decimal over decimals.
/// - `min`/`max` accept any kind.
///
/// Nulls never participate. `average`, `min` and `max` over no values give
/// [`Scalar::Null`]. Returns `None` only when the result overflows.
pub fn evaluate<'a, I>(values: I, function: AggregateFunction, def: &FieldDef) -> Option<Scalar>
where
    I: IntoIterator<Item = Value<'a>>,
{
    let values = values.into_iter();
    match function {
        AggregateFunction::Count => {
            let count = if def.nullable {
                values.filter(|value| !value.is_null()).count()
            } else {
                values.count()
            };
            Some(Scalar::from(i64::try_from(count).ok()?))
        }
        AggregateFunction::Sum => Some(Sum::of(values, def)?.total()),
        AggregateFunction::Average => Sum::of(values, def)?.mean(),
        AggregateFunction::Min => Some(extreme(values, std::cmp::Ordering::Less)),
        AggregateFunction::Max => Some(extreme(values, std::cmp::Ordering::Greater)),
    }
}

fn extreme<'a>(values: impl Iterator<Item = Value<'a>>, wanted: std::cmp::Ordering) -> Scalar {
    values
        .filter(|value| !value.is_null())
        .reduce(|best, value| {
            if total_order(&value, &best) == wanted {
                value
            } else {
                best
            }
        })
        .map_or(Scalar::Null, |value| value.to_scalar())
}

/// Running sum of a numeric field.
enum Sum {
    Int { total: i128, count: usize },
    Float { total: f64, count: usize },
    Decimal { total: Decimal, count: usize },
}

impl Sum {
    fn of<'a>(values: impl Iterator<Item = Value<'a>>, def: &FieldDef) -> Option<Sum> {
        let mut sum = if def.kind == FieldKind::Decimal {
            Sum::Decimal {
                total: Decimal::ZERO,
                count: 0,
            }
        } else {
            Sum::Int { total: 0, count: 0 }
        };
        for value in values {
            sum = sum.add(value)?;
        }
        Some(sum)
    }

    fn add(self, value: Value<'_>) -> Option<Sum> {
        let sum = match (self, value) {
            (Sum::Int { total, count }, Value::Number(Number::I64(n))) => Sum::Int {
                total: total.checked_add(i128::from(n))?,
                count: count + 1,
            },
            (Sum::Int { total, count }, Value::Number(Number::U64(n))) => Sum::Int {
                total: total.checked_add(i128::from(n))?,
                count: count + 1,
            },
            (Sum::Int { total, count }, Value::Number(Number::F64(n))) => Sum::Float {
                total: total as f64 + n,
                count: count + 1,
            },
            (Sum::Float { total, count }, Value::Number(n)) => Sum::Float {
                total: total + n.to_f64(),
                count: count + 1,
            },
            (Sum::Decimal { total, count }, Value::Decimal(d)) => Sum::Decimal {
                total: total.checked_add(d)?,
                count: count + 1,
            },
            (Sum::Decimal { total, count }, Value::Number(n)) => Sum::Decimal {
                total: total.checked_add(n.to_decimal()?)?,
                count: count + 1,
            },
            // Nulls and stray kinds don't participate.
            (sum, _) => sum,
        };
        Some(sum)
    }

    fn total(&self) -> Scalar {
        match *self {
            Sum::Int { total, .. } => match i64::try_from(total) {
                Ok(n) => Scalar::from(n),
                Err(_) => match u64::try_from(total) {
                    Ok(n) => Scalar::Number(Number::U64(n)),
                    Err(_) => Scalar::from(total as f64),
                },
            },
            Sum::Float { total, .. } => Scalar::from(total),
            Sum::Decimal { total, .. } => Scalar::Decimal(total),
        }
    }

    fn mean(&self) -> Option<Scalar> {
        let mean = match *self {
            Sum::Int { count: 0, .. } | Sum::Float { count: 0, .. } | Sum::Decimal { count: 0, .. } => {
                Scalar::Null
            }
            Sum::Int { total, count } => Scalar::from(total as f64 / count as f64),
            Sum::Float { total, count } => Scalar::from(total / count as f64),
            Sum::Decimal { total, count } => {
                Scalar::Decimal(total.checked_div(Decimal::from(count))?)
            }
        };
        Some(mean)
    }
}
