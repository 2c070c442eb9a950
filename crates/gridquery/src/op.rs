//! Comparison operators for filter leaves.
//!
//! Requests carry operators as strings; [`Operator::parse`] maps them onto
//! this enum, and the predicate compiler checks each one against the
//! field's kind.

use std::cmp::Ordering;

use crate::traits::FieldKind;

/// Comparison operator of a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison operators
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,

    // String operators
    /// String contains substring.
    Contains,
    /// String does not contain substring.
    DoesNotContain,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
    /// String matches regular expression.
    Matches,

    // Presence operators, which ignore the leaf value
    /// Field is null.
    IsNull,
    /// Field is not null.
    IsNotNull,
    /// String field is the empty string.
    IsEmpty,
    /// String field is not the empty string.
    IsNotEmpty,
}

impl Operator {
    /// Parses a wire operator name, case-insensitively.
    pub fn parse(name: &str) -> Option<Operator> {
        let op = match name.to_ascii_lowercase().as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "contains" => Operator::Contains,
            "doesnotcontain" => Operator::DoesNotContain,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            "matches" => Operator::Matches,
            "isnull" => Operator::IsNull,
            "isnotnull" => Operator::IsNotNull,
            "isempty" => Operator::IsEmpty,
            "isnotempty" => Operator::IsNotEmpty,
            _ => return None,
        };
        Some(op)
    }

    /// Returns `true` if this operator only applies to string fields.
    pub fn is_string_op(self) -> bool {
        matches!(
            self,
            Operator::Contains
                | Operator::DoesNotContain
                | Operator::StartsWith
                | Operator::EndsWith
                | Operator::Matches
                | Operator::IsEmpty
                | Operator::IsNotEmpty
        )
    }

    /// Returns `true` if this operator ignores the leaf value.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::IsNull | Operator::IsNotNull | Operator::IsEmpty | Operator::IsNotEmpty
        )
    }

    /// Returns `true` if this operator is valid for a field of `kind`.
    pub fn supports(self, kind: FieldKind) -> bool {
        !self.is_string_op() || kind == FieldKind::String
    }

    /// Evaluates a comparison given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Neq => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesnotcontain",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Matches => "matches",
            Operator::IsNull => "isnull",
            Operator::IsNotNull => "isnotnull",
            Operator::IsEmpty => "isempty",
            Operator::IsNotEmpty => "isnotempty",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
