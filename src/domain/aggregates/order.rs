//! Order Aggregate
//!
//! An [`Order`] owns a list of [`OrderDetail`] line items. The backend only
//! accepts a detail once its `orderID` names a persisted parent, so a new
//! order is saved in two phases: the parent first, then every line item
//! stamped with the id the parent create returned. [`OrderDraft`] holds the
//! editable state of one aggregate between dialog open and submit.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::api::Resource;
use crate::domain::value_objects::{EntityId, Sku};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_order", skip_on_field_errors = false))]
pub struct Order {
    #[serde(rename = "orderID", default, skip_serializing_if = "EntityId::is_new")]
    pub order_id: EntityId,
    #[serde(rename = "customerID")]
    pub customer_id: EntityId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_name: String,
    #[serde(with = "order_date")]
    pub order_date: NaiveDateTime,
    #[validate(length(min = 1, message = "Order status is required"))]
    pub order_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_details: Vec<OrderDetail>,
}

impl Order {
    pub fn new(customer_id: EntityId, status: impl Into<String>) -> Self {
        Self {
            order_id: EntityId::NEW, customer_id, customer_name: String::new(),
            order_date: Utc::now().naive_utc(), order_status: status.into(),
            total_amount: None, order_details: vec![],
        }
    }

    /// The parent record as sent to the backend, without embedded line items.
    pub fn header(&self) -> Order { Order { order_details: vec![], ..self.clone() } }
}

impl Default for Order {
    fn default() -> Self { Self::new(EntityId::NEW, "") }
}

fn validate_order(o: &Order) -> Result<(), ValidationError> {
    if o.customer_id.is_new() { return Err(ValidationError::new("customer_required")); }
    Ok(())
}

impl Resource for Order {
    const PATH: &'static str = "orders";
    const LABEL: &'static str = "Order";
    fn id(&self) -> EntityId { self.order_id }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_detail", skip_on_field_errors = false))]
pub struct OrderDetail {
    #[serde(rename = "orderDetailID", default, skip_serializing_if = "EntityId::is_new")]
    pub order_detail_id: EntityId,
    #[serde(rename = "orderID", default)]
    pub order_id: EntityId,
    #[serde(rename = "productID")]
    pub product_id: EntityId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub sku: String,
}

impl OrderDetail {
    pub fn new(product_id: EntityId, quantity: u32, unit_price: Decimal) -> Self {
        Self { product_id, quantity, unit_price, ..Default::default() }
    }

    pub fn line_total(&self) -> Decimal { self.unit_price * Decimal::from(self.quantity) }
}

fn validate_detail(d: &OrderDetail) -> Result<(), ValidationError> {
    if d.product_id.is_new() { return Err(ValidationError::new("product_required")); }
    if d.quantity < 1 { return Err(ValidationError::new("quantity_min_1")); }
    if d.unit_price.is_sign_negative() { return Err(ValidationError::new("negative_unit_price")); }
    if !d.sku.is_empty() { Sku::new(d.sku.as_str()).map_err(|_| ValidationError::new("invalid_sku"))?; }
    Ok(())
}

/// Editable state of one order plus its line items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderDraft {
    order: Order,
    items: Vec<OrderDetail>,
}

impl OrderDraft {
    pub fn new(order: Order) -> Self {
        let mut order = order;
        let items = std::mem::take(&mut order.order_details);
        Self { order, items }
    }

    pub fn with_items(order: Order, items: Vec<OrderDetail>) -> Self {
        let mut draft = Self::new(order);
        draft.items = items;
        draft
    }

    pub fn order(&self) -> &Order { &self.order }
    pub fn order_mut(&mut self) -> &mut Order { &mut self.order }
    pub fn items(&self) -> &[OrderDetail] { &self.items }
    pub fn is_new(&self) -> bool { self.order.order_id.is_new() }

    pub fn add_item(&mut self, mut item: OrderDetail) {
        item.order_id = self.order.order_id;
        self.items.push(item);
    }

    pub fn update_item(&mut self, index: usize, item: OrderDetail) -> Result<(), DraftError> {
        let slot = self.items.get_mut(index).ok_or(DraftError::NoSuchItem(index))?;
        *slot = item;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<OrderDetail, DraftError> {
        if index >= self.items.len() { return Err(DraftError::NoSuchItem(index)); }
        Ok(self.items.remove(index))
    }

    /// Header fields replaced from a fresh server copy; line items are left alone.
    pub fn replace_order(&mut self, fresh: Order) {
        self.order = fresh.header();
    }

    pub fn replace_items(&mut self, items: Vec<OrderDetail>) { self.items = items; }

    pub fn total(&self) -> Decimal { self.items.iter().map(OrderDetail::line_total).sum() }

    /// Checks everything that can be checked without the network.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.items.is_empty() { return Err(DraftError::NoItems); }
        self.order.validate().map_err(|e| DraftError::InvalidOrder(e.to_string()))?;
        for (index, item) in self.items.iter().enumerate() {
            item.validate().map_err(|e| DraftError::InvalidItem(index, e.to_string()))?;
        }
        Ok(())
    }

    /// Line items stamped with the persisted parent id, ready to send.
    pub fn stamped_items(&self, order_id: EntityId) -> Vec<OrderDetail> {
        self.items.iter().cloned().map(|mut item| { item.order_id = order_id; item }).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError { NoItems, NoSuchItem(usize), InvalidOrder(String), InvalidItem(usize, String) }
impl std::error::Error for DraftError {}
impl std::fmt::Display for DraftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "An order needs at least one line item"),
            Self::NoSuchItem(i) => write!(f, "No line item at position {}", i + 1),
            Self::InvalidOrder(e) => write!(f, "Invalid order: {}", e),
            Self::InvalidItem(i, e) => write!(f, "Invalid line item {}: {}", i + 1, e),
        }
    }
}

/// Order dates come back as RFC 3339, a bare date-time, or a plain date.
mod order_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("unrecognised order date: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) { return Some(dt.naive_utc()); }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") { return Some(dt); }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: i64, qty: u32) -> OrderDetail { OrderDetail::new(EntityId::new(product), qty, Decimal::new(10, 0)) }

    #[test]
    fn test_empty_draft_is_rejected() {
        let draft = OrderDraft::new(Order::new(EntityId::new(1), "Pending"));
        assert_eq!(draft.validate(), Err(DraftError::NoItems));
    }

    #[test]
    fn test_draft_workflow() {
        let mut draft = OrderDraft::new(Order::new(EntityId::new(1), "Pending"));
        draft.add_item(line(7, 2));
        draft.add_item(line(8, 1));
        assert!(draft.validate().is_ok());
        assert_eq!(draft.total(), Decimal::new(30, 0));

        let stamped = draft.stamped_items(EntityId::new(55));
        assert!(stamped.iter().all(|d| d.order_id == EntityId::new(55)));
        assert!(draft.items().iter().all(|d| d.order_id.is_new()));

        draft.remove_item(0).unwrap();
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.remove_item(5), Err(DraftError::NoSuchItem(5)));
    }

    #[test]
    fn test_invalid_item_is_reported_by_position() {
        let mut draft = OrderDraft::new(Order::new(EntityId::new(1), "Pending"));
        draft.add_item(line(7, 1));
        draft.add_item(line(8, 0));
        assert!(matches!(draft.validate(), Err(DraftError::InvalidItem(1, _))));
    }

    #[test]
    fn test_order_without_customer_is_invalid() {
        let mut draft = OrderDraft::new(Order::new(EntityId::NEW, "Pending"));
        draft.add_item(line(7, 1));
        assert!(matches!(draft.validate(), Err(DraftError::InvalidOrder(_))));
    }

    #[test]
    fn test_order_dates() {
        assert!(order_date::parse("2024-05-01T10:30:00").is_some());
        assert!(order_date::parse("2024-05-01T10:30:00.123").is_some());
        assert!(order_date::parse("2024-05-01T10:30:00Z").is_some());
        assert_eq!(order_date::parse("2024-05-01").unwrap().format("%H:%M").to_string(), "00:00");
        assert!(order_date::parse("yesterday").is_none());
    }

    #[test]
    fn test_order_wire_shape() {
        let o: Order = serde_json::from_str(
            r#"{"orderID":9,"customerID":3,"customerName":"Ada Lovelace","orderDate":"2024-05-01T00:00:00","orderStatus":"Shipped","orderDetails":[{"orderDetailID":1,"orderID":9,"productID":4,"productName":"Lamp","quantity":2,"unitPrice":5.5,"sku":"L-1"}]}"#,
        ).unwrap();
        let draft = OrderDraft::new(o);
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.order().order_status, "Shipped");
        let header = serde_json::to_value(draft.order()).unwrap();
        assert!(header.get("orderDetails").is_none());
        assert_eq!(header["orderDate"], "2024-05-01T00:00:00");
    }
}
