//! Runtime value types for field comparison and aggregation.
//!
//! [`Value`] is what a record's accessor hands to the engine: it borrows
//! strings from the record. [`Scalar`] is the owned counterpart used for
//! filter literals, group keys and aggregate results.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Runtime value of a record field, borrowed from the record.
///
/// # Example
///
/// ```
/// use gridquery::{Value, Number};
///
/// struct Person {
///     name: String,
///     age: u8,
///     nickname: Option<String>,
/// }
///
/// fn accessor<'a>(person: &'a Person, field: &str) -> Value<'a> {
///     match field {
///         "name" => Value::String(&person.name),
///         "age" => Value::Number(Number::from(person.age)),
///         "nickname" => person.nickname.as_deref().map_or(Value::Null, Value::String),
///         _ => Value::Null,
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// Absent value of a nullable field.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer or floating point value.
    Number(Number),
    /// Fixed-point decimal value.
    Decimal(Decimal),
    /// String value (borrowed).
    String(&'a str),
    /// Date and time without offset.
    DateTime(NaiveDateTime),
    /// GUID value.
    Guid(Uuid),
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Copies this value into an owned [`Scalar`].
    pub fn to_scalar(&self) -> Scalar {
        match *self {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(b),
            Value::Number(n) => Scalar::Number(n),
            Value::Decimal(d) => Scalar::Decimal(d),
            Value::String(s) => Scalar::String(s.to_string()),
            Value::DateTime(dt) => Scalar::DateTime(dt),
            Value::Guid(g) => Scalar::Guid(g),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Comparisons between different numeric variants go through `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Converts the number to a decimal. `None` for NaN and infinities.
    pub fn to_decimal(self) -> Option<Decimal> {
        match self {
            Number::I64(n) => Some(Decimal::from(n)),
            Number::U64(n) => Some(Decimal::from(n)),
            Number::F64(n) => Decimal::from_f64(n),
        }
    }

    /// Returns `true` for a floating point NaN.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Total order for sorting: NaN compares equal to NaN and greater than
    /// every other number.
    pub fn total_cmp(self, other: Number) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

macro_rules! number_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(n: $ty) -> Self {
                    Number::$variant(n as _)
                }
            }
        )*
    };
}

number_from!(I64: i8, i16, i32, i64, isize);
number_from!(U64: u8, u16, u32, u64, usize);
number_from!(F64: f32, f64);

/// Owned scalar value: filter literals, group keys and aggregate results.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    Guid(Uuid),
}

impl Scalar {
    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Borrows this scalar as a [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(*n),
            Scalar::Decimal(d) => Value::Decimal(*d),
            Scalar::String(s) => Value::String(s),
            Scalar::DateTime(dt) => Value::DateTime(*dt),
            Scalar::Guid(g) => Value::Guid(*g),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(Number::I64(n)) => write!(f, "{}", n),
            Scalar::Number(Number::U64(n)) => write!(f, "{}", n),
            Scalar::Number(Number::F64(n)) => write!(f, "{}", n),
            Scalar::Decimal(d) => write!(f, "{}", d),
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Scalar::Guid(g) => write!(f, "{}", g),
        }
    }
}

/// Decimals are written as JSON numbers, which is what grid clients read.
impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_none(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(Number::I64(n)) => serializer.serialize_i64(*n),
            Scalar::Number(Number::U64(n)) => serializer.serialize_u64(*n),
            Scalar::Number(Number::F64(n)) => serializer.serialize_f64(*n),
            Scalar::Decimal(d) => match d.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&d.to_string()),
            },
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::DateTime(dt) => dt.serialize(serializer),
            Scalar::Guid(g) => g.serialize(serializer),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(Number::I64(n))
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(Number::F64(n))
    }
}

impl From<Decimal> for Scalar {
    fn from(d: Decimal) -> Self {
        Scalar::Decimal(d)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(dt: NaiveDateTime) -> Self {
        Scalar::DateTime(dt)
    }
}

impl From<Uuid> for Scalar {
    fn from(g: Uuid) -> Self {
        Scalar::Guid(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn value_extractors() {
        assert_eq!(Value::String("hello").as_str(), Some("hello"));

        // Wrong type returns None
        assert_eq!(Value::Number(Number::I64(1)).as_str(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    #[test]
    fn nan_is_greatest_in_total_order() {
        let nan = Number::F64(f64::NAN);
        assert_eq!(nan.total_cmp(Number::F64(f64::INFINITY)), Ordering::Greater);
        assert_eq!(Number::I64(i64::MAX).total_cmp(nan), Ordering::Less);
        assert_eq!(nan.total_cmp(Number::F64(-f64::NAN)), Ordering::Equal);
        assert_eq!(Number::F64(-0.0).total_cmp(Number::F64(0.0)), Ordering::Equal);
        assert_eq!(Number::I64(2).total_cmp(Number::F64(1.5)), Ordering::Greater);
    }

    #[test]
    fn number_to_decimal() {
        assert_eq!(Number::I64(-3).to_decimal(), Some(Decimal::from(-3)));
        assert_eq!(Number::F64(f64::NAN).to_decimal(), None);
        assert_eq!(Number::from(7u8), Number::U64(7));
        assert_eq!(Number::from(2.5f32), Number::F64(2.5));
    }

    #[test]
    fn scalar_roundtrips_through_value() {
        let scalar = Scalar::from("abc");
        assert_eq!(scalar.as_value(), Value::String("abc"));
        assert_eq!(scalar.as_value().to_scalar(), scalar);
    }

    #[test]
    fn scalar_serializes_as_plain_json() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(15, 30, 0))
            .unwrap();

        assert_eq!(serde_json::to_string(&Scalar::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Scalar::from(60i64)).unwrap(), "60");
        assert_eq!(
            serde_json::to_string(&Scalar::Decimal(Decimal::new(125, 2))).unwrap(),
            "1.25"
        );
        assert_eq!(
            serde_json::to_string(&Scalar::DateTime(dt)).unwrap(),
            "\"2024-03-01T15:30:00\""
        );
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Scalar::from("x").to_string(), "\"x\"");
        assert_eq!(Scalar::from(3i64).to_string(), "3");
        assert_eq!(Scalar::Null.to_string(), "null");
    }
}
