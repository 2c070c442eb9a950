//! gridquery - server-side query engine for remote data grids.
//!
//! A grid client sends a declarative request: a filter tree, sort keys,
//! grouping levels, aggregates and a paging window. gridquery compiles it
//! against a typed record and runs it over a data source, producing a page
//! of rows (or a group tree), the total match count and the aggregates.
//!
//! - Typed field registry via the [`Record`] trait (derivable with
//!   `gridquery-macros`)
//! - Nested `and`/`or` filters with string, comparison, null and regex
//!   operators
//! - Multi-key stable sorting with a deterministic fallback for paging
//! - `sum`, `count`, `average`, `min`, `max` over the whole filtered set
//! - Recursive multi-level grouping with per-group aggregates
//! - JSON wire format compatible with grid widgets
//!
//! # Quick Start
//!
//! ```rust
//! use gridquery::{FieldDef, FieldKind, Number, QueryExt, QueryRequest, Record, Value};
//!
//! // Define your data
//! struct Person {
//!     id: u32,
//!     name: String,
//!     age: u8,
//! }
//!
//! // Expose its fields
//! impl Record for Person {
//!     fn fields() -> &'static [FieldDef] {
//!         const FIELDS: &[FieldDef] = &[
//!             FieldDef::new("id", FieldKind::Number, false),
//!             FieldDef::new("name", FieldKind::String, false),
//!             FieldDef::new("age", FieldKind::Number, false),
//!         ];
//!         FIELDS
//!     }
//!
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "id" => Value::Number(Number::from(self.id)),
//!             "name" => Value::String(&self.name),
//!             "age" => Value::Number(Number::from(self.age)),
//!             _ => Value::Null,
//!         }
//!     }
//! }
//!
//! let people = vec![
//!     Person { id: 1, name: "Ann".into(), age: 30 },
//!     Person { id: 2, name: "Bob".into(), age: 30 },
//!     Person { id: 3, name: "Cid".into(), age: 40 },
//! ];
//!
//! // Requests usually arrive as JSON
//! let request = QueryRequest::from_json(r#"{
//!     "take": 2,
//!     "skip": 0,
//!     "sort": [{ "field": "name", "dir": "asc" }],
//!     "filter": { "logic": "and", "filters": [
//!         { "field": "age", "operator": "gte", "value": 30 }
//!     ]},
//!     "aggregates": [{ "field": "age", "aggregate": "sum" }]
//! }"#).unwrap();
//!
//! let result = people.query(&request).unwrap();
//! assert_eq!(result.total, 3);
//! assert_eq!(result.rows().len(), 2);
//! assert_eq!(result.rows()[0].name, "Ann");
//!
//! let json = serde_json::to_value(result.aggregates).unwrap();
//! assert_eq!(json, serde_json::json!({ "age": { "sum": 100 } }));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! filter -> count (total) -> aggregate -> sort -> page -> group | materialize
//! ```
//!
//! - Aggregates and `total` cover the filtered set before paging.
//! - Paging (`take > 0`) without sort keys sorts by a fallback key: the
//!   field named `id`, else the first field containing `id`, else the first
//!   field, descending.
//! - Group keys are sorted first, in declaration order, ahead of the
//!   requested sort keys.
//!
//! # Field Kinds and Operators
//!
//! | Kind | Operators |
//! |------|-----------|
//! | String | `eq`, `neq`, `lt`, `lte`, `gt`, `gte`, `contains`, `doesnotcontain`, `startswith`, `endswith`, `matches`, `isempty`, `isnotempty` |
//! | Number, Decimal | `eq`, `neq`, `lt`, `lte`, `gt`, `gte` |
//! | DateTime | `eq` (whole day), `neq`, `lt`, `lte`, `gt`, `gte` |
//! | Bool, Guid | `eq`, `neq`, `lt`, `lte`, `gt`, `gte` |
//!
//! Every kind also accepts `isnull` and `isnotnull`. String comparisons are
//! case-insensitive unless [`QueryOptions::case_insensitive_strings`] is off.

mod aggregate;
mod clause;
mod config;
mod error;
mod filter;
mod group;
mod op;
mod ordering;
mod pipeline;
mod predicate;
mod request;
mod result;
mod source;
mod traits;
mod value;

// Re-export public API
pub use aggregate::{evaluate, AggregateFunction, AggregateResults, Aggregator};
pub use clause::{coerce, parse_date_time, Condition};
pub use config::QueryOptions;
pub use error::{QueryError, Result};
pub use filter::{FilterLeaf, FilterNode, Logic};
pub use group::{GroupDescriptor, GroupItems, GroupResult};
pub use op::Operator;
pub use ordering::{
    compare_by_orderings, compare_values, default_sort, total_order, Dir, SortDescriptor,
};
pub use pipeline::{execute, execute_with_options, QueryExt, QueryPlan};
pub use predicate::{Expr, Predicate};
pub use request::QueryRequest;
pub use result::QueryResult;
pub use source::{DataSource, MemorySource};
pub use traits::{resolve_field, AsDateTime, FieldDef, FieldKind, Record};
pub use value::{Number, Scalar, Value};
