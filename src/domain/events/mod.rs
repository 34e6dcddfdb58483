//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    VariationsSaved { product_id: Uuid, count: usize },
    AttributeChanged { attribute_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentConfirmed { order_id: String },
    PaymentFailed { order_id: String, reason: String },
    Shipped { order_id: String },
    Delivered { order_id: String },
    Cancelled { order_id: String },
}
