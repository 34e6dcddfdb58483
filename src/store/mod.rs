//! Storage collaborators
//!
//! Everything the variation and payment flows need from persistence is
//! expressed as a trait here. [`postgres::PgStore`] backs the running service
//! and [`memory::MemoryStore`] backs tests and local experiments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus, Variation};
use crate::variation::VariationInput;
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeKind {
    #[default]
    Select,
    Radio,
    Checkbox,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Select => "SELECT", Self::Radio => "RADIO", Self::Checkbox => "CHECKBOX" }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw { "SELECT" => Some(Self::Select), "RADIO" => Some(Self::Radio), "CHECKBOX" => Some(Self::Checkbox), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    pub kind: AttributeKind,
    pub values: Vec<AttributeValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub value: String,
    pub price: Option<Decimal>,
}

/// Partial order update; `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

/// What the payment flow needs back from an order update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderContact {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::CreditCard => "CREDIT_CARD", Self::BankTransfer => "BANK_TRANSFER", Self::CashOnDelivery => "CASH_ON_DELIVERY" }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "CREDIT_CARD" => Some(Self::CreditCard),
            "BANK_TRANSFER" => Some(Self::BankTransfer),
            "CASH_ON_DELIVERY" => Some(Self::CashOnDelivery),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub order_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_response: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub payment: NewPayment,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Attributes sorted by name, each with values sorted by label.
    async fn list_attributes(&self) -> Result<Vec<Attribute>>;
    /// Returns the existing attribute when one with the same trimmed name
    /// exists. The flag is true only when a new row was inserted.
    async fn create_attribute(&self, name: &str, kind: AttributeKind) -> Result<(Attribute, bool)>;
    /// Same contract as `create_attribute`, keyed by (attribute, trimmed label).
    async fn create_value(&self, attribute_id: Uuid, label: &str, price: Option<Decimal>) -> Result<(AttributeValue, bool)>;
    /// `NotFound` unless the value belongs to `attribute_id`.
    async fn update_value_price(&self, attribute_id: Uuid, value_id: Uuid, price: Option<Decimal>) -> Result<AttributeValue>;
    /// `NotFound` unless the value belongs to `attribute_id`; `Conflict` while
    /// a variation still uses it.
    async fn delete_value(&self, attribute_id: Uuid, value_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Replace the product's variation set. Inputs carrying an id update that
    /// variation; the rest are created. Variations not listed are removed.
    async fn save_variations(&self, product_id: Uuid, variations: Vec<VariationInput>) -> Result<Vec<Variation>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, order_id: &str) -> Result<Order>;
    /// Newest first, optionally narrowed to one status.
    async fn list_orders(&self, status: Option<OrderStatus>, limit: u32) -> Result<Vec<Order>>;
    async fn update_order(&self, order_id: &str, update: OrderUpdate) -> Result<OrderContact>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Duplicate transaction ids for the same order are rejected with `Conflict`.
    async fn record_payment(&self, payment: NewPayment) -> Result<PaymentRecord>;
    /// Newest first.
    async fn list_payments(&self, order_id: Option<&str>) -> Result<Vec<PaymentRecord>>;
}
