//! In-process store backed by the domain aggregates

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    Attribute, AttributeKind, AttributeStore, AttributeValue, NewPayment, OrderContact, OrderStore, OrderUpdate,
    PaymentLedger, PaymentRecord, ProductStore,
};
use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus, Product, Variation};
use crate::domain::events::DomainEvent;
use crate::variation::VariationInput;
use crate::{Result, StorefrontError};

#[derive(Default)]
struct State {
    attributes: Vec<Attribute>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<String, Order>,
    payments: Vec<PaymentRecord>,
    events: Vec<DomainEvent>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_product(&self, product: Product) { self.lock().products.insert(product.id(), product); }
    pub fn insert_order(&self, order: Order) { self.lock().orders.insert(order.id().to_string(), order); }
    pub fn product(&self, id: Uuid) -> Option<Product> { self.lock().products.get(&id).cloned() }
    pub fn order(&self, id: &str) -> Option<Order> { self.lock().orders.get(id).cloned() }
    pub fn payments(&self) -> Vec<PaymentRecord> { self.lock().payments.clone() }
    /// Domain events raised by aggregates held in this store, oldest first.
    pub fn events(&self) -> Vec<DomainEvent> { self.lock().events.clone() }
}

fn sort_attribute(attr: &mut Attribute) { attr.values.sort_by(|a, b| a.value.cmp(&b.value)); }

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn list_attributes(&self) -> Result<Vec<Attribute>> {
        let mut attrs = self.lock().attributes.clone();
        attrs.sort_by(|a, b| a.name.cmp(&b.name));
        attrs.iter_mut().for_each(sort_attribute);
        Ok(attrs)
    }

    async fn create_attribute(&self, name: &str, kind: AttributeKind) -> Result<(Attribute, bool)> {
        let name = name.trim();
        if name.is_empty() { return Err(StorefrontError::Validation("attribute name required".into())); }
        let mut state = self.lock();
        if let Some(existing) = state.attributes.iter().find(|a| a.name == name) {
            return Ok((existing.clone(), false));
        }
        let attr = Attribute { id: Uuid::now_v7(), name: name.to_string(), kind, values: vec![] };
        state.attributes.push(attr.clone());
        Ok((attr, true))
    }

    async fn create_value(&self, attribute_id: Uuid, label: &str, price: Option<Decimal>) -> Result<(AttributeValue, bool)> {
        let label = label.trim();
        if label.is_empty() { return Err(StorefrontError::Validation("value label required".into())); }
        let mut state = self.lock();
        let attr = state
            .attributes
            .iter_mut()
            .find(|a| a.id == attribute_id)
            .ok_or_else(|| StorefrontError::NotFound(format!("attribute {}", attribute_id)))?;
        if let Some(existing) = attr.values.iter().find(|v| v.value == label) {
            return Ok((existing.clone(), false));
        }
        let value = AttributeValue { id: Uuid::now_v7(), attribute_id, value: label.to_string(), price };
        attr.values.push(value.clone());
        Ok((value, true))
    }

    async fn update_value_price(&self, attribute_id: Uuid, value_id: Uuid, price: Option<Decimal>) -> Result<AttributeValue> {
        let mut state = self.lock();
        let value = state
            .attributes
            .iter_mut()
            .filter(|a| a.id == attribute_id)
            .flat_map(|a| a.values.iter_mut())
            .find(|v| v.id == value_id)
            .ok_or_else(|| StorefrontError::NotFound(format!("attribute value {}", value_id)))?;
        value.price = price;
        Ok(value.clone())
    }

    async fn delete_value(&self, attribute_id: Uuid, value_id: Uuid) -> Result<()> {
        let mut state = self.lock();
        let attr = state
            .attributes
            .iter()
            .position(|a| a.id == attribute_id && a.values.iter().any(|v| v.id == value_id))
            .ok_or_else(|| StorefrontError::NotFound(format!("attribute value {}", value_id)))?;
        let in_use = state
            .products
            .values()
            .flat_map(|p| p.variations())
            .any(|v| v.attributes.iter().any(|a| a.attribute_value_id == value_id));
        if in_use { return Err(StorefrontError::Conflict("attribute value is used by a variation".into())); }
        state.attributes[attr].values.retain(|v| v.id != value_id);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn save_variations(&self, product_id: Uuid, variations: Vec<VariationInput>) -> Result<Vec<Variation>> {
        let mut state = self.lock();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| StorefrontError::NotFound(format!("product {}", product_id)))?;
        let saved = product
            .replace_variations(variations)
            .map_err(|e| StorefrontError::Validation(e.to_string()))?
            .to_vec();
        let events = product.take_events();
        state.events.extend(events);
        Ok(saved)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.order(order_id).ok_or_else(|| StorefrontError::NotFound(format!("order {}", order_id)))
    }

    async fn list_orders(&self, status: Option<OrderStatus>, limit: u32) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .lock()
            .orders
            .values()
            .filter(|o| status.map_or(true, |s| o.status() == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn update_order(&self, order_id: &str, update: OrderUpdate) -> Result<OrderContact> {
        let mut state = self.lock();
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StorefrontError::NotFound(format!("order {}", order_id)))?;
        match (update.status, update.payment_status) {
            (Some(OrderStatus::Confirmed), Some(PaymentStatus::Completed)) => {
                order.confirm_payment(update.notes.unwrap_or_default())
            }
            (None, Some(PaymentStatus::Failed)) => order.fail_payment(update.notes.unwrap_or_default()),
            (status, payment) => {
                if let Some(status) = status {
                    order.transition(status).map_err(|e| StorefrontError::Conflict(e.to_string()))?;
                }
                if let Some(payment) = payment { order.set_payment_status(payment); }
                if let Some(notes) = update.notes { order.annotate(notes); }
            }
        }
        let contact = OrderContact { id: order.id().to_string(), email: order.email().map(str::to_string) };
        let events = order.take_events();
        state.events.extend(events);
        Ok(contact)
    }
}

#[async_trait]
impl PaymentLedger for MemoryStore {
    async fn record_payment(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let mut state = self.lock();
        let duplicate = payment.transaction_id.is_some()
            && state.payments.iter().any(|p| p.payment.order_id == payment.order_id && p.payment.transaction_id == payment.transaction_id);
        if duplicate { return Err(StorefrontError::Conflict("payment already recorded".into())); }
        let record = PaymentRecord { id: Uuid::now_v7(), payment, created_at: Utc::now() };
        state.payments.push(record.clone());
        Ok(record)
    }

    async fn list_payments(&self, order_id: Option<&str>) -> Result<Vec<PaymentRecord>> {
        Ok(self
            .lock()
            .payments
            .iter()
            .rev()
            .filter(|p| order_id.map_or(true, |id| p.payment.order_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Money, Stock};
    use crate::variation::ResolvedPair;

    #[tokio::test]
    async fn test_attribute_creation_is_idempotent() {
        let store = MemoryStore::new();
        let (a, created) = store.create_attribute(" Color ", AttributeKind::Select).await.unwrap();
        assert!(created);
        let (b, created) = store.create_attribute("Color", AttributeKind::Radio).await.unwrap();
        assert!(!created);
        assert_eq!(a.id, b.id);
        let (red, created) = store.create_value(a.id, "Red", None).await.unwrap();
        assert!(created);
        let (again, created) = store.create_value(a.id, " Red", Some(Decimal::ONE)).await.unwrap();
        assert!(!created);
        assert_eq!(red.id, again.id);
        assert!(store.create_value(Uuid::new_v4(), "Red", None).await.is_err());
    }

    #[tokio::test]
    async fn test_value_in_use_cannot_be_deleted() {
        let store = MemoryStore::new();
        let (attr, _) = store.create_attribute("Size", AttributeKind::Select).await.unwrap();
        let (m, _) = store.create_value(attr.id, "M", None).await.unwrap();
        let (l, _) = store.create_value(attr.id, "L", None).await.unwrap();
        let product = Product::create_variable("Hoodie");
        let product_id = product.id();
        store.insert_product(product);
        store.save_variations(product_id, vec![VariationInput {
            id: None, sku: None, price: Decimal::TEN, stock: Stock::Unlimited,
            attributes: vec![ResolvedPair { attribute_id: attr.id, attribute_value_id: m.id }],
        }]).await.unwrap();

        assert!(matches!(store.delete_value(attr.id, m.id).await, Err(StorefrontError::Conflict(_))));
        store.delete_value(attr.id, l.id).await.unwrap();
        assert_eq!(store.list_attributes().await.unwrap()[0].values.len(), 1);
        assert_eq!(store.events().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_payment_rejected() {
        let store = MemoryStore::new();
        store.insert_order(Order::create("O1", "ORD-1", None, Money::zero("TRY")));
        let payment = NewPayment {
            order_id: "O1".into(), amount: Decimal::TEN, method: Default::default(), status: PaymentStatus::Completed,
            transaction_id: Some("T1".into()), gateway_response: serde_json::json!({}),
        };
        store.record_payment(payment.clone()).await.unwrap();
        assert!(matches!(store.record_payment(payment).await, Err(StorefrontError::Conflict(_))));
        assert_eq!(store.list_payments(Some("O1")).await.unwrap().len(), 1);
        assert!(store.list_payments(Some("O2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_value_must_belong_to_attribute() {
        let store = MemoryStore::new();
        let (color, _) = store.create_attribute("Color", AttributeKind::Select).await.unwrap();
        let (size, _) = store.create_attribute("Size", AttributeKind::Select).await.unwrap();
        let (red, _) = store.create_value(color.id, "Red", None).await.unwrap();

        assert!(matches!(store.update_value_price(size.id, red.id, Some(Decimal::ONE)).await, Err(StorefrontError::NotFound(_))));
        assert!(matches!(store.delete_value(size.id, red.id).await, Err(StorefrontError::NotFound(_))));
        let updated = store.update_value_price(color.id, red.id, Some(Decimal::ONE)).await.unwrap();
        assert_eq!(updated.price, Some(Decimal::ONE));
        store.delete_value(color.id, red.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_orders_listed_by_status() {
        let store = MemoryStore::new();
        store.insert_order(Order::create("O1", "ORD-1", None, Money::zero("TRY")));
        store.insert_order(Order::create("O2", "ORD-2", None, Money::zero("TRY")));
        store.update_order("O2", OrderUpdate { status: Some(OrderStatus::Shipped), ..Default::default() }).await.unwrap();

        assert_eq!(store.list_orders(None, 10).await.unwrap().len(), 2);
        let shipped = store.list_orders(Some(OrderStatus::Shipped), 10).await.unwrap();
        assert_eq!(shipped.iter().map(Order::id).collect::<Vec<_>>(), vec!["O2"]);
        assert_eq!(store.list_orders(None, 1).await.unwrap().len(), 1);
        assert!(matches!(store.get_order("O3").await, Err(StorefrontError::NotFound(_))));
    }
}
