//! Compiled leaf conditions.
//!
//! A [`Condition`] is a filter leaf that has been checked against the record
//! type: its field resolved, its operator parsed and validated for the field
//! kind, and its value coerced to the field's kind.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::QueryOptions;
use crate::error::{QueryError, Result};
use crate::filter::FilterLeaf;
use crate::op::Operator;
use crate::ordering::compare_values;
use crate::traits::{FieldDef, FieldKind};
use crate::value::{Number, Scalar, Value};

/// A single typed filter predicate.
#[derive(Debug, Clone)]
pub struct Condition {
    /// The resolved field name.
    pub field: &'static str,
    /// The comparison operator.
    pub operator: Operator,
    /// The literal, coerced to the field's kind. `Null` for unary operators.
    pub value: Scalar,
    /// Both operand and literal are compared lower-cased.
    pub lowercase: bool,
    regex: Option<Regex>,
}

impl Condition {
    /// Compiles a wire leaf against a field registry entry.
    pub fn compile(leaf: &FilterLeaf, def: &'static FieldDef, options: &QueryOptions) -> Result<Self> {
        let operator = Operator::parse(&leaf.operator)
            .filter(|op| op.supports(def.kind))
            .ok_or_else(|| QueryError::UnsupportedOperator {
                operator: leaf.operator.clone(),
                field: leaf.field.clone(),
            })?;

        let value = if operator.is_unary() {
            Scalar::Null
        } else {
            coerce(def, &leaf.value)?
        };

        let lowercase = options.case_insensitive_strings && def.kind == FieldKind::String;
        let value = match value {
            Scalar::String(s) if lowercase && operator != Operator::Matches => {
                Scalar::String(s.to_lowercase())
            }
            other => other,
        };

        let regex = match (&value, operator) {
            (Scalar::String(pattern), Operator::Matches) => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(lowercase)
                    .build()?,
            ),
            _ => None,
        };

        Ok(Condition {
            field: def.name,
            operator,
            value,
            lowercase,
            regex,
        })
    }

    /// Builds a condition from already-typed parts.
    pub(crate) fn typed(field: &'static str, operator: Operator, value: Scalar) -> Self {
        Condition {
            field,
            operator,
            value,
            lowercase: false,
            regex: None,
        }
    }

    /// Returns `true` if both conditions test the same field, operator and value.
    pub fn same_as(&self, other: &Condition) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.value == other.value
            && self.lowercase == other.lowercase
    }

    /// Evaluates this condition against a field value.
    pub fn matches(&self, field_value: &Value<'_>) -> bool {
        match self.operator {
            Operator::IsNull => return field_value.is_null(),
            Operator::IsNotNull => return !field_value.is_null(),
            Operator::IsEmpty => return field_value.as_str() == Some(""),
            Operator::IsNotEmpty => return field_value.as_str() != Some(""),
            _ => {}
        }

        match (&self.value, field_value) {
            (Scalar::Null, value) => match self.operator {
                Operator::Eq => value.is_null(),
                Operator::Neq => !value.is_null(),
                _ => false,
            },
            (_, Value::Null) => self.operator == Operator::Neq,
            (Scalar::String(literal), Value::String(s)) => {
                let s = self.operand(s);
                self.match_string(&s, literal)
            }
            (literal, value) => match compare_values(value, &literal.as_value()) {
                Some(ordering) => self.operator.eval_ordering(ordering),
                None => false,
            },
        }
    }

    fn operand<'s>(&self, s: &'s str) -> Cow<'s, str> {
        if self.lowercase {
            Cow::Owned(s.to_lowercase())
        } else {
            Cow::Borrowed(s)
        }
    }

    fn match_string(&self, field: &str, literal: &str) -> bool {
        match self.operator {
            Operator::Contains => field.contains(literal),
            Operator::DoesNotContain => !field.contains(literal),
            Operator::StartsWith => field.starts_with(literal),
            Operator::EndsWith => field.ends_with(literal),
            Operator::Matches => self.regex.as_ref().is_some_and(|re| re.is_match(field)),
            op => op.eval_ordering(field.cmp(literal)),
        }
    }

    /// Renders this condition with its parameter index, e.g. `name.lower().contains(@2)`.
    pub fn render(&self, index: usize) -> String {
        let field = if self.lowercase {
            format!("{}.lower()", self.field)
        } else {
            self.field.to_string()
        };
        match self.operator {
            Operator::Eq => format!("{} == @{}", field, index),
            Operator::Neq => format!("{} != @{}", field, index),
            Operator::Lt => format!("{} < @{}", field, index),
            Operator::Lte => format!("{} <= @{}", field, index),
            Operator::Gt => format!("{} > @{}", field, index),
            Operator::Gte => format!("{} >= @{}", field, index),
            Operator::Contains => format!("{}.contains(@{})", field, index),
            Operator::DoesNotContain => format!("!{}.contains(@{})", field, index),
            Operator::StartsWith => format!("{}.starts_with(@{})", field, index),
            Operator::EndsWith => format!("{}.ends_with(@{})", field, index),
            Operator::Matches => format!("{}.matches(@{})", field, index),
            Operator::IsNull => format!("{} == null", self.field),
            Operator::IsNotNull => format!("{} != null", self.field),
            Operator::IsEmpty => format!("{} == \"\"", self.field),
            Operator::IsNotEmpty => format!("{} != \"\"", self.field),
        }
    }
}

/// Converts a wire literal to the kind of `def`.
pub fn coerce(def: &FieldDef, value: &serde_json::Value) -> Result<Scalar> {
    use serde_json::Value as Json;

    let fail = || QueryError::TypeCoercion {
        field: def.name.to_string(),
        value: value.to_string(),
        expected: def.kind.as_str(),
    };

    let scalar = match (def.kind, value) {
        (_, Json::Null) => Scalar::Null,

        (FieldKind::String, Json::String(s)) => Scalar::String(s.clone()),

        (FieldKind::Number, Json::Number(n)) => Scalar::Number(json_number(n).ok_or_else(fail)?),
        (FieldKind::Number, Json::String(s)) => Scalar::Number(parse_number(s).ok_or_else(fail)?),

        // Parse the literal's text so 0.1 stays exactly 0.1.
        (FieldKind::Decimal, Json::Number(n)) => {
            Scalar::Decimal(parse_decimal(&n.to_string()).ok_or_else(fail)?)
        }
        (FieldKind::Decimal, Json::String(s)) => {
            Scalar::Decimal(parse_decimal(s).ok_or_else(fail)?)
        }

        (FieldKind::DateTime, Json::String(s)) => {
            Scalar::DateTime(parse_date_time(s).ok_or_else(fail)?)
        }
        (FieldKind::DateTime, Json::Number(n)) => {
            let millis = n.as_i64().ok_or_else(fail)?;
            let dt = DateTime::from_timestamp_millis(millis).ok_or_else(fail)?;
            Scalar::DateTime(dt.naive_utc())
        }

        (FieldKind::Bool, Json::Bool(b)) => Scalar::Bool(*b),
        (FieldKind::Bool, Json::String(s)) => Scalar::Bool(s.parse().map_err(|_| fail())?),

        (FieldKind::Guid, Json::String(s)) => {
            Scalar::Guid(Uuid::parse_str(s.trim()).map_err(|_| fail())?)
        }

        _ => return Err(fail()),
    };
    Ok(scalar)
}

fn json_number(n: &serde_json::Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        Some(Number::I64(i))
    } else if let Some(u) = n.as_u64() {
        Some(Number::U64(u))
    } else {
        n.as_f64().map(Number::F64)
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    s.parse::<i64>()
        .map(Number::I64)
        .or_else(|_| s.parse::<f64>().map(Number::F64))
        .ok()
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Parses the date/time spellings grid clients send: RFC 3339 with offset
/// (normalized to UTC), ISO local date/time, or a bare date at midnight.
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
