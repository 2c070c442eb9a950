//! Proc macros for gridquery.
//!
//! # Derive Macros
//!
//! - [`Record`] - Generate the field registry and value accessor of a
//!   queryable struct
//!
//! For working examples, see `gridquery/tests/derive.rs`.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod record;

/// Derives the `Record` trait for queryable structs.
///
/// Every named field becomes a grid field unless marked `#[grid(skip)]`.
/// The kind is inferred from the field type; `Option<T>` makes the field
/// nullable.
///
/// | Field type | Kind |
/// |------------|------|
/// | `String`, `&str` | `String` |
/// | integer and float primitives | `Number` |
/// | `rust_decimal::Decimal` | `Decimal` |
/// | `NaiveDateTime`, `NaiveDate`, `DateTime<Tz>` | `DateTime` |
/// | `bool` | `Bool` |
/// | `uuid::Uuid` | `Guid` |
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `String`, `Number`, `Decimal`, `DateTime`, `Bool`, `Guid` | Explicit kind, required for types not listed above |
/// | `kind = "..."` | Explicit kind as a string (`"bool"`, `"datetime"`, ...) |
/// | `skip` | Exclude this field from the registry |
/// | `rename = "..."` | Use a custom name in requests |
///
/// A `DateTime` field of a custom type must implement `gridquery::AsDateTime`.
///
/// # Generated Code
///
/// 1. Field name constants (e.g., `Order::CUSTOMER`, `Order::SHIPPED_ON`)
/// 2. Implementation of `Record::fields()` and `Record::field_value()`
///
/// # Example
///
/// ```ignore
/// use gridquery::{QueryExt, QueryRequest};
/// use gridquery_macros::Record;
///
/// #[derive(Record)]
/// struct Order {
///     id: u64,
///
///     #[grid(rename = "customer")]
///     customer_name: String,
///
///     shipped_on: Option<chrono::NaiveDate>,
///
///     #[grid(skip)]
///     notes: Vec<String>,
/// }
///
/// let orders: Vec<Order> = load_orders();
/// let page = orders.query(&QueryRequest::new().take(20).sort_asc(Order::CUSTOMER))?;
/// ```
#[proc_macro_derive(Record, attributes(grid))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
