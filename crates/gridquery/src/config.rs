//! Engine options.
//!
//! Defaults reproduce the documented pipeline semantics; options only loosen
//! or cap them for deployments that need it.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options applied while compiling and executing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Compare string fields lower-cased on both sides.
    pub case_insensitive_strings: bool,
    /// Rewrite `eq` on date/time fields into a whole-day range.
    pub expand_date_equality: bool,
    /// Upper bound for positive `take` values.
    pub max_take: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            case_insensitive_strings: true,
            expand_date_equality: true,
            max_take: None,
        }
    }
}

impl QueryOptions {
    /// Loads options from a JSON document. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies `max_take` to a requested page size. `0` means "no paging"
    /// and is left alone.
    pub fn effective_take(&self, take: usize) -> usize {
        match self.max_take {
            Some(max) if take > max => max,
            _ => take,
        }
    }
}
