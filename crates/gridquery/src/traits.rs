//! The typed field registry a record type exposes to the engine.
//!
//! The [`Record`] trait is implemented by `#[derive(Record)]` from the
//! `gridquery-macros` crate, but can also be written by hand.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{QueryError, Result};
use crate::value::Value;

/// The kind of values a field yields. Drives literal coercion and
/// operator validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Decimal,
    DateTime,
    Bool,
    Guid,
}

impl FieldKind {
    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Decimal => "decimal",
            FieldKind::DateTime => "datetime",
            FieldKind::Bool => "bool",
            FieldKind::Guid => "guid",
        }
    }

    /// Returns `true` for kinds that `sum` and `average` apply to.
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Decimal)
    }
}

/// One entry of a record type's field registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Name used in requests.
    pub name: &'static str,
    /// Kind of values the field yields.
    pub kind: FieldKind,
    /// Whether the field may be null (`Option<_>` in Rust).
    pub nullable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind, nullable: bool) -> Self {
        FieldDef {
            name,
            kind,
            nullable,
        }
    }
}

/// Trait for record types that can be queried.
///
/// # Manual Implementation
///
/// ```
/// use gridquery::{FieldDef, FieldKind, Number, Record, Value};
///
/// struct Person {
///     id: u32,
///     name: String,
/// }
///
/// impl Record for Person {
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[
///             FieldDef::new("id", FieldKind::Number, false),
///             FieldDef::new("name", FieldKind::String, false),
///         ];
///         FIELDS
///     }
///
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "id" => Value::Number(Number::from(self.id)),
///             "name" => Value::String(&self.name),
///             _ => Value::Null,
///         }
///     }
/// }
///
/// assert_eq!(Person::field("NAME").unwrap().name, "name");
/// assert!(Person::field("missing").is_err());
/// ```
pub trait Record {
    /// The field registry, in declaration order.
    fn fields() -> &'static [FieldDef]
    where
        Self: Sized;

    /// Returns the value of a field. Unknown fields yield [`Value::Null`];
    /// the engine validates names against [`Record::fields`] beforehand.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns a static accessor function over this record type.
    fn accessor<'a>(item: &'a Self, field: &str) -> Value<'a>
    where
        Self: Sized,
    {
        item.field_value(field)
    }

    /// Looks up a field by name: exact match first, then ASCII
    /// case-insensitive.
    fn field(name: &str) -> Result<&'static FieldDef>
    where
        Self: Sized,
    {
        resolve_field(Self::fields(), name)
    }
}

/// Resolves a requested field name against a registry.
pub fn resolve_field(fields: &'static [FieldDef], name: &str) -> Result<&'static FieldDef> {
    fields
        .iter()
        .find(|def| def.name == name)
        .or_else(|| fields.iter().find(|def| def.name.eq_ignore_ascii_case(name)))
        .ok_or_else(|| QueryError::field_not_found(name))
}

/// Conversion used by the derive macro for date/time fields.
///
/// # Example
///
/// ```
/// use chrono::NaiveDateTime;
/// use gridquery::AsDateTime;
///
/// struct UnixSeconds(i64);
///
/// impl AsDateTime for UnixSeconds {
///     fn as_date_time(&self) -> NaiveDateTime {
///         chrono::DateTime::from_timestamp(self.0, 0)
///             .unwrap_or_default()
///             .naive_utc()
///     }
/// }
/// ```
pub trait AsDateTime {
    /// Converts this value to a date/time without offset.
    fn as_date_time(&self) -> NaiveDateTime;
}

impl AsDateTime for NaiveDateTime {
    fn as_date_time(&self) -> NaiveDateTime {
        *self
    }
}

/// Dates sit at midnight.
impl AsDateTime for NaiveDate {
    fn as_date_time(&self) -> NaiveDateTime {
        self.and_time(chrono::NaiveTime::default())
    }
}

/// Zoned timestamps compare in UTC.
impl<Tz: TimeZone> AsDateTime for DateTime<Tz> {
    fn as_date_time(&self) -> NaiveDateTime {
        self.naive_utc()
    }
}
