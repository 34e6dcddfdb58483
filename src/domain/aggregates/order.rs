//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    order_number: String,
    email: Option<String>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    total: Money,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Confirmed, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING", Self::Confirmed => "CONFIRMED", Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED", Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(Self::Pending), "CONFIRMED" => Some(Self::Confirmed), "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered), "CANCELLED" => Some(Self::Cancelled), _ => None,
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "PENDING", Self::Completed => "COMPLETED", Self::Failed => "FAILED" }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw { "PENDING" => Some(Self::Pending), "COMPLETED" => Some(Self::Completed), "FAILED" => Some(Self::Failed), _ => None }
    }
}

impl Order {
    pub fn create(id: impl Into<String>, order_number: impl Into<String>, email: Option<String>, total: Money) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(), order_number: order_number.into(), email,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending, total,
            notes: None, created_at: now, updated_at: now, events: vec![],
        }
    }

    /// Rebuild a stored order. No events are raised.
    pub fn restored(
        mut self,
        status: OrderStatus,
        payment_status: PaymentStatus,
        notes: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.status = status;
        self.payment_status = payment_status;
        self.notes = notes;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn email(&self) -> Option<&str> { self.email.as_deref() }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn total(&self) -> &Money { &self.total }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Gateway approved the payment.
    pub fn confirm_payment(&mut self, note: impl Into<String>) {
        self.payment_status = PaymentStatus::Completed;
        self.status = OrderStatus::Confirmed;
        self.notes = Some(note.into());
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentConfirmed { order_id: self.id.clone() }));
    }

    /// Gateway rejected the payment. Order status is left as it was.
    pub fn fail_payment(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.payment_status = PaymentStatus::Failed;
        self.notes = Some(note.clone());
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentFailed { order_id: self.id.clone(), reason: note }));
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) { self.payment_status = status; self.touch(); }

    pub fn annotate(&mut self, note: impl Into<String>) { self.notes = Some(note.into()); self.touch(); }

    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if self.status == next { return Ok(()); }
        let order_id = self.id.clone();
        let event = match (self.status, next) {
            (OrderStatus::Delivered | OrderStatus::Cancelled, _) => return Err(OrderError::Closed(self.status)),
            (_, OrderStatus::Pending) => return Err(OrderError::InvalidTransition(self.status, next)),
            (_, OrderStatus::Confirmed) => None,
            (_, OrderStatus::Shipped) => Some(OrderEvent::Shipped { order_id }),
            (OrderStatus::Shipped, OrderStatus::Delivered) => Some(OrderEvent::Delivered { order_id }),
            (_, OrderStatus::Delivered) => return Err(OrderError::InvalidTransition(self.status, next)),
            (_, OrderStatus::Cancelled) => Some(OrderEvent::Cancelled { order_id }),
        };
        self.status = next;
        self.touch();
        if let Some(e) = event { self.raise_event(DomainEvent::Order(e)); }
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { Closed(OrderStatus), InvalidTransition(OrderStatus, OrderStatus) }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed(s) => write!(f, "Order is {} and cannot change", s.as_str()),
            Self::InvalidTransition(from, to) => write!(f, "Cannot move order from {} to {}", from.as_str(), to.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order() -> Order { Order::create("ORDER123", "ORD-1001", Some("buyer@example.com".into()), Money::new(Decimal::new(4990, 2), "TRY")) }

    #[test]
    fn test_payment_confirmation() {
        let mut o = order();
        o.confirm_payment("AuthCode: A1");
        assert_eq!(o.status(), OrderStatus::Confirmed);
        assert_eq!(o.payment_status(), PaymentStatus::Completed);
        let events = o.take_events();
        assert!(matches!(events.as_slice(), [DomainEvent::Order(OrderEvent::PaymentConfirmed { .. })]));
    }

    #[test]
    fn test_payment_failure_keeps_status() {
        let mut o = order();
        o.fail_payment("CardDeclined");
        assert_eq!(o.status(), OrderStatus::Pending);
        assert_eq!(o.payment_status(), PaymentStatus::Failed);
        assert_eq!(o.notes(), Some("CardDeclined"));
    }

    #[test]
    fn test_order_workflow() {
        let mut o = order();
        o.transition(OrderStatus::Confirmed).unwrap();
        o.transition(OrderStatus::Shipped).unwrap();
        o.transition(OrderStatus::Delivered).unwrap();
        assert_eq!(o.transition(OrderStatus::Cancelled), Err(OrderError::Closed(OrderStatus::Delivered)));
        assert_eq!(o.take_events().len(), 2);
    }

    #[test]
    fn test_restored_order_serializes_without_events() {
        let o = order().restored(OrderStatus::Shipped, PaymentStatus::Completed, Some("AuthCode: A1".into()), Utc::now(), Utc::now());
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "SHIPPED");
        assert_eq!(json["paymentStatus"], "COMPLETED");
        assert!(json.get("events").is_none());
        assert_eq!(OrderStatus::parse("CANCELLED"), Some(OrderStatus::Cancelled));
        assert_eq!(PaymentStatus::parse("paid"), None);
    }

    #[test]
    fn test_cannot_deliver_unshipped() {
        let mut o = order();
        assert!(o.transition(OrderStatus::Delivered).is_err());
    }
}
