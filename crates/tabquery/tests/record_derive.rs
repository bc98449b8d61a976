//! Tests for `#[derive(Record)]`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tabquery::{
    AggregateValue, EnumVariant, FieldKind, QueryEngine, Record, RecordEnum, Schema,
    TabularQuery, Timestamp, Value,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Pending,
    Shipped,
    Cancelled,
}

impl RecordEnum for Status {
    const VARIANTS: &'static [EnumVariant] = &[
        EnumVariant::new("Pending", 0),
        EnumVariant::new("Shipped", 1),
        EnumVariant::new("Cancelled", 2),
    ];

    fn discriminant(&self) -> u32 {
        *self as u32
    }
}

#[derive(Debug, Record)]
struct Order {
    customer_name: String,
    quantity: u32,
    unit_price: f64,
    express: bool,
    #[record(Enum)]
    status: Status,
    placed_at: DateTime<Utc>,
    ship_by: Option<NaiveDate>,
    #[record(rename = "ref")]
    reference: String,
    #[record(skip)]
    internal_notes: String,
    attachments: Vec<u8>,
}

fn order(customer: &str, quantity: u32, status: Status, day: u32) -> Order {
    Order {
        customer_name: customer.to_string(),
        quantity,
        unit_price: 2.5,
        express: quantity > 5,
        status,
        placed_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        ship_by: NaiveDate::from_ymd_opt(2024, 4, day),
        reference: format!("R-{}", day),
        internal_notes: String::new(),
        attachments: Vec::new(),
    }
}

fn orders() -> Vec<Order> {
    vec![
        order("Acme", 10, Status::Shipped, 1),
        order("Globex", 2, Status::Pending, 2),
        order("Initech", 7, Status::Cancelled, 3),
        order("acme east", 1, Status::Shipped, 4),
    ]
}

#[test]
fn registry_names_and_kinds() {
    let names: Vec<&str> = Order::fields().iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        [
            "CustomerName",
            "Quantity",
            "UnitPrice",
            "Express",
            "Status",
            "PlacedAt",
            "ShipBy",
            "Ref"
        ]
    );

    let schema = Schema::<Order>::new().unwrap();
    assert_eq!(schema.resolve("unitPrice").unwrap().kind(), FieldKind::Float);
    assert_eq!(schema.resolve("express").unwrap().kind(), FieldKind::Bool);
    assert_eq!(schema.resolve("placedAt").unwrap().kind(), FieldKind::Timestamp);
    assert_eq!(
        schema.resolve("status").unwrap().kind(),
        FieldKind::Enum(Status::VARIANTS)
    );
    assert!(schema.resolve("shipBy").unwrap().is_nullable());
    assert!(!schema.resolve("quantity").unwrap().is_nullable());
    assert!(schema.resolve("internalNotes").is_err());
    assert!(schema.resolve("attachments").is_err());
    assert!(schema.resolve("reference").is_err());
}

#[test]
fn name_constants_hold_external_names() {
    assert_eq!(Order::CUSTOMER_NAME, "customerName");
    assert_eq!(Order::UNIT_PRICE, "unitPrice");
    assert_eq!(Order::REF, "ref");
}

#[test]
fn getters_read_fields() {
    let schema = Schema::<Order>::new().unwrap();
    let first = order("Acme", 10, Status::Shipped, 1);

    assert_eq!(
        schema.resolve("customerName").unwrap().value(&first),
        Value::String("Acme")
    );
    assert_eq!(
        schema.resolve("status").unwrap().value(&first),
        Value::Enum(1)
    );
    assert_eq!(
        schema.resolve("placedAt").unwrap().value(&first),
        Value::Timestamp(Timestamp::from_secs(1_709_294_400))
    );

    let mut unscheduled = first;
    unscheduled.ship_by = None;
    assert!(schema
        .resolve("shipBy")
        .unwrap()
        .value(&unscheduled)
        .is_null());
}

#[test]
fn enum_filters_by_variant_name() {
    let data = orders();
    let engine = QueryEngine::<Order>::new().unwrap();
    let query = TabularQuery::new()
        .where_field(Order::STATUS, "eq", "shipped")
        .order_asc(Order::QUANTITY);

    let response = engine.apply(&data, &query).unwrap();
    let customers: Vec<&str> = response
        .items
        .iter()
        .map(|o| o.customer_name.as_str())
        .collect();
    assert_eq!(customers, ["acme east", "Acme"]);
}

#[test]
fn timestamp_filters_accept_dates() {
    let data = orders();
    let engine = QueryEngine::<Order>::new().unwrap();
    let query = TabularQuery::new()
        .where_field("placedAt", "gte", "2024-03-03")
        .where_field("shipBy", "lt", "2024-04-04T00:00:00Z");

    let response = engine.apply(&data, &query).unwrap();
    assert_eq!(response.count, 1);
    assert_eq!(response.items[0].customer_name, "Initech");
}

#[test]
fn bool_and_float_fields() {
    let data = orders();
    let engine = QueryEngine::<Order>::new().unwrap();
    let query = TabularQuery::new()
        .where_field("express", "eq", "TRUE")
        .aggregate("unitPrice", "sum")
        .aggregate("status", "max")
        .aggregate("placedAt", "min");

    let response = engine.apply(&data, &query).unwrap();
    assert_eq!(response.count, 2);

    let aggregates = response.aggregates.unwrap();
    assert_eq!(
        aggregates.get("unitPrice", "sum"),
        Some(&AggregateValue::Float(5.0))
    );
    assert_eq!(
        aggregates.get("status", "max"),
        Some(&AggregateValue::Text("Cancelled".into()))
    );
    assert_eq!(
        aggregates.get("placedAt", "min"),
        Some(&AggregateValue::Timestamp(Timestamp::from_secs(1_709_294_400)))
    );
}

#[test]
fn string_operators_ignore_case() {
    let data = orders();
    let engine = QueryEngine::<Order>::new().unwrap();
    let query = TabularQuery::new().where_field(Order::CUSTOMER_NAME, "startswith", "ACME");

    let response = engine.apply(&data, &query).unwrap();
    assert_eq!(response.count, 2);
}

#[derive(Debug, Record)]
struct Ticket {
    label: String,
    price: f32,
    discount: Option<f32>,
}

fn tickets() -> Vec<Ticket> {
    vec![
        Ticket {
            label: "child".into(),
            price: 0.1,
            discount: Some(0.05),
        },
        Ticket {
            label: "adult".into(),
            price: 0.3,
            discount: None,
        },
        Ticket {
            label: "student".into(),
            price: 0.1,
            discount: Some(0.05),
        },
    ]
}

#[test]
fn f32_fields_compare_by_their_decimal_value() {
    let data = tickets();
    let engine = QueryEngine::<Ticket>::new().unwrap();

    let eq = engine
        .apply(&data, &TabularQuery::new().where_field("price", "eq", "0.1"))
        .unwrap();
    assert_eq!(eq.count, 2);

    let gt = engine
        .apply(&data, &TabularQuery::new().where_field("price", "gt", "0.1"))
        .unwrap();
    let labels: Vec<&str> = gt.items.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["adult"]);

    let lte = engine
        .apply(&data, &TabularQuery::new().where_field("discount", "lte", "0.05"))
        .unwrap();
    assert_eq!(lte.count, 2);
}

#[test]
fn f32_aggregates_report_decimal_values() {
    let data = tickets();
    let query = TabularQuery::new()
        .aggregate("price", "min")
        .aggregate("price", "max");

    let response = QueryEngine::<Ticket>::new()
        .unwrap()
        .apply(&data, &query)
        .unwrap();
    let aggregates = response.aggregates.unwrap();
    assert_eq!(aggregates.get("price", "min"), Some(&AggregateValue::Float(0.1)));
    assert_eq!(aggregates.get("price", "max"), Some(&AggregateValue::Float(0.3)));
}
