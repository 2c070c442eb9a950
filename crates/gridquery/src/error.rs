//! Error types for the gridquery crate.

use thiserror::Error;

/// Errors raised while compiling a request into a query plan.
///
/// Every variant is detected before the data source is touched, so a
/// malformed request never partially executes.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter, sort, group or aggregate references a field the record type does not expose.
    #[error("field '{field}' does not exist on the record type")]
    FieldNotFound { field: String },

    /// The operator is unknown, or not valid for the field's kind.
    #[error("operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator { operator: String, field: String },

    /// A filter value cannot be converted to the field's kind.
    #[error("cannot convert {value} to {expected} for field '{field}'")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// Invalid regular expression pattern for the `matches` operator.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// The request or options document is not valid JSON for its shape.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}

impl QueryError {
    pub(crate) fn field_not_found(field: impl Into<String>) -> Self {
        QueryError::FieldNotFound {
            field: field.into(),
        }
    }
}

/// Result type for gridquery operations.
pub type Result<T> = std::result::Result<T, QueryError>;
