//! Integration tests for the Record derive macro.
//!
//! These tests verify that `#[derive(Record)]` builds the field registry,
//! the value accessor and the field constants that the engine relies on.

#![allow(dead_code)] // Some fields are intentionally skipped for testing

use chrono::{NaiveDate, NaiveDateTime};
use gridquery::{
    AggregateFunction, AsDateTime, FieldDef, FieldKind, FilterNode, GroupDescriptor, Number,
    Operator, QueryExt, QueryRequest, Record, Scalar, Value,
};
use gridquery_macros::Record as DeriveRecord;
use rust_decimal::Decimal;
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, DeriveRecord)]
struct Order {
    id: u64,

    #[grid(rename = "customer")]
    customer_name: String,

    total: Decimal,

    placed: NaiveDateTime,

    shipped_on: Option<NaiveDate>,

    discount: Option<f64>,

    paid: bool,

    reference: Uuid,

    #[grid(skip)]
    notes: Vec<String>,
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn order(id: u64, customer: &str, cents: i64, day: u32) -> Order {
    Order {
        id,
        customer_name: customer.to_string(),
        total: Decimal::new(cents, 2),
        placed: at(2024, 5, day, 9),
        shipped_on: None,
        discount: None,
        paid: false,
        reference: Uuid::from_u128(id as u128),
        notes: Vec::new(),
    }
}

fn orders() -> Vec<Order> {
    let mut first = order(1, "acme", 1050, 1);
    first.shipped_on = NaiveDate::from_ymd_opt(2024, 5, 3);
    first.paid = true;

    let mut second = order(2, "globex", 2000, 1);
    second.discount = Some(0.1);

    let third = order(3, "acme", 450, 2);

    vec![first, second, third]
}

// =============================================================================
// Generated registry
// =============================================================================

#[test]
fn test_field_constants_generated() {
    assert_eq!(Order::ID, "id");
    assert_eq!(Order::CUSTOMER, "customer");
    assert_eq!(Order::SHIPPED_ON, "shipped_on");
    assert_eq!(Order::REFERENCE, "reference");
}

#[test]
fn test_registry_in_declaration_order() {
    let names: Vec<&str> = Order::fields().iter().map(|def| def.name).collect();
    assert_eq!(
        names,
        [
            "id",
            "customer",
            "total",
            "placed",
            "shipped_on",
            "discount",
            "paid",
            "reference"
        ]
    );
}

#[test]
fn test_inferred_kinds() {
    let kind = |name: &str| Order::field(name).unwrap().kind;
    assert_eq!(kind("id"), FieldKind::Number);
    assert_eq!(kind("customer"), FieldKind::String);
    assert_eq!(kind("total"), FieldKind::Decimal);
    assert_eq!(kind("placed"), FieldKind::DateTime);
    assert_eq!(kind("shipped_on"), FieldKind::DateTime);
    assert_eq!(kind("paid"), FieldKind::Bool);
    assert_eq!(kind("reference"), FieldKind::Guid);
}

#[test]
fn test_option_fields_are_nullable() {
    assert_eq!(
        *Order::field("discount").unwrap(),
        FieldDef::new("discount", FieldKind::Number, true)
    );
    assert!(Order::field("shipped_on").unwrap().nullable);
    assert!(!Order::field("id").unwrap().nullable);
}

#[test]
fn test_skipped_and_renamed_fields_are_not_registered() {
    assert!(Order::field("notes").is_err());
    assert!(Order::field("customer_name").is_err());
}

#[test]
fn test_field_values() {
    let orders = orders();
    let first = &orders[0];

    assert_eq!(first.field_value("id"), Value::Number(Number::U64(1)));
    assert_eq!(first.field_value("customer"), Value::String("acme"));
    assert_eq!(first.field_value("total"), Value::Decimal(Decimal::new(1050, 2)));
    assert_eq!(first.field_value("placed"), Value::DateTime(at(2024, 5, 1, 9)));
    assert_eq!(first.field_value("shipped_on"), Value::DateTime(at(2024, 5, 3, 0)));
    assert_eq!(first.field_value("discount"), Value::Null);
    assert_eq!(first.field_value("paid"), Value::Bool(true));
    assert_eq!(first.field_value("reference"), Value::Guid(Uuid::from_u128(1)));
    assert_eq!(first.field_value("unknown"), Value::Null);
}

// =============================================================================
// Explicit kinds and borrowed data
// =============================================================================

struct Stamp(i64);

impl AsDateTime for Stamp {
    fn as_date_time(&self) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(self.0, 0)
            .unwrap_or_default()
            .naive_utc()
    }
}

#[derive(DeriveRecord)]
struct Event<'a> {
    #[grid(String)]
    code: &'a str,

    #[grid(DateTime)]
    at: Stamp,

    #[grid(kind = "bool", rename = "isOpen")]
    open: Option<bool>,
}

#[test]
fn test_explicit_kinds() {
    assert_eq!(Event::IS_OPEN, "isOpen");

    let event = Event {
        code: "E1",
        at: Stamp(86_400),
        open: Some(true),
    };

    assert_eq!(event.field_value("code"), Value::String("E1"));
    assert_eq!(event.field_value("at"), Value::DateTime(at(1970, 1, 2, 0)));
    assert_eq!(event.field_value("isOpen"), Value::Bool(true));
    assert!(Event::field("isOpen").unwrap().nullable);
}

#[test]
fn test_borrowed_records_query() {
    let events = [
        Event { code: "b", at: Stamp(0), open: None },
        Event { code: "a", at: Stamp(10), open: Some(false) },
    ];

    let result = events
        .query(&QueryRequest::new().filter(FilterNode::leaf("isopen", Operator::IsNotNull, ())))
        .unwrap();
    let codes: Vec<&str> = result.rows().iter().map(|e| e.code).collect();
    assert_eq!(codes, ["a"]);
}

// =============================================================================
// End to end
// =============================================================================

#[test]
fn test_derived_record_query() {
    let orders = orders();
    let request = QueryRequest::new()
        .take(10)
        .sort_desc(Order::TOTAL)
        .filter(FilterNode::leaf(Order::PLACED, Operator::Eq, "2024-05-01"))
        .aggregate(Order::TOTAL, AggregateFunction::Sum)
        .aggregate(Order::SHIPPED_ON, AggregateFunction::Count);

    let result = orders.query(&request).unwrap();

    let ids: Vec<u64> = result.rows().iter().map(|o| o.id).collect();
    assert_eq!(ids, [2, 1]);
    assert_eq!(result.total, 2);
    assert_eq!(
        result.aggregate("total", AggregateFunction::Sum),
        Some(&Scalar::Decimal(Decimal::new(3050, 2)))
    );
    assert_eq!(
        result.aggregate("shipped_on", AggregateFunction::Count),
        Some(&Scalar::from(1i64))
    );
}

#[test]
fn test_derived_record_grouping() {
    let orders = orders();
    let request = QueryRequest::new()
        .group_by(GroupDescriptor::asc(Order::CUSTOMER).aggregate(Order::TOTAL, AggregateFunction::Max));

    let result = orders.query(&request).unwrap();
    let groups = result.groups();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].value, Scalar::from("acme"));
    assert_eq!(groups[0].count, 2);
    assert_eq!(
        groups[0].aggregates.get("total", AggregateFunction::Max),
        Some(&Scalar::Decimal(Decimal::new(1050, 2)))
    );
    assert_eq!(groups[1].value, Scalar::from("globex"));
}

#[test]
fn test_guid_filter() {
    let orders = orders();
    let request = QueryRequest::new().filter(FilterNode::leaf(
        Order::REFERENCE,
        Operator::Eq,
        Uuid::from_u128(3).to_string(),
    ));

    let result = orders.query(&request).unwrap();
    let ids: Vec<u64> = result.rows().iter().map(|o| o.id).collect();
    assert_eq!(ids, [3]);
}
