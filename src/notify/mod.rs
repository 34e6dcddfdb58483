//! Order status notifications
//!
//! Mail delivery lives outside this service. With NATS configured, status
//! changes are published for the mailer to pick up; otherwise they are only
//! logged.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::aggregates::OrderStatus;
use crate::store::OrderContact;
use crate::{Result, StorefrontError};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_status_changed(&self, order: &OrderContact, status: OrderStatus) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusMessage<'a> {
    order_id: &'a str,
    recipient: &'a str,
    status: OrderStatus,
}

pub struct NatsNotifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self { client, subject: subject.into() }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn order_status_changed(&self, order: &OrderContact, status: OrderStatus) -> Result<()> {
        let Some(recipient) = order.email.as_deref() else {
            tracing::warn!(order_id = %order.id, "order has no email, skipping status notification");
            return Ok(());
        };
        let payload = serde_json::to_vec(&StatusMessage { order_id: &order.id, recipient, status })
            .map_err(|e| StorefrontError::Messaging(e.to_string()))?;
        self.client
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| StorefrontError::Messaging(e.to_string()))?;
        tracing::debug!(order_id = %order.id, subject = %self.subject, "status notification published");
        Ok(())
    }
}

/// Used when no message broker is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_status_changed(&self, order: &OrderContact, status: OrderStatus) -> Result<()> {
        tracing::info!(order_id = %order.id, recipient = ?order.email, status = status.as_str(), "order status notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_shape() {
        let msg = StatusMessage { order_id: "O1", recipient: "a@b.c", status: OrderStatus::Confirmed };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({ "orderId": "O1", "recipient": "a@b.c", "status": "CONFIRMED" }));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let contact = OrderContact { id: "O1".into(), email: None };
        assert!(LogNotifier.order_status_changed(&contact, OrderStatus::Confirmed).await.is_ok());
    }
}
