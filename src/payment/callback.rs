//! Payment gateway callback handling

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio_util::task::TaskTracker;

use super::gateway::{CallbackFields, GatewayVerifier};
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::notify::Notifier;
use crate::store::{NewPayment, OrderStore, OrderUpdate, PaymentLedger, PaymentMethod};
use crate::Result;

/// Field names the gateway has been seen to use for the order id.
pub const ORDER_ID_ALIASES: [&str; 3] = ["oid", "OID", "OrderId"];

pub const ERROR_ORDER_NOT_FOUND: &str = "OrderNotFound";
pub const ERROR_PAYMENT_FAILED: &str = "PaymentFailed";
pub const ERROR_SYSTEM: &str = "SystemError";

/// Where to send the shopper after a callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub success: bool,
    pub redirect_url: String,
}

impl CallbackOutcome {
    fn success(base_url: &str, order_id: &str) -> Self {
        Self { success: true, redirect_url: format!("{}/payment/success?orderId={}", base(base_url), urlencoding::encode(order_id)) }
    }

    fn failure(base_url: &str, order_id: Option<&str>, error: &str) -> Self {
        let redirect_url = match order_id {
            Some(id) => format!("{}/payment/fail?orderId={}&error={}", base(base_url), urlencoding::encode(id), urlencoding::encode(error)),
            None => format!("{}/payment/fail?error={}", base(base_url), urlencoding::encode(error)),
        };
        Self { success: false, redirect_url }
    }

    /// Fallback when handling itself failed.
    pub fn system_error(base_url: &str) -> Self { Self::failure(base_url, None, ERROR_SYSTEM) }
}

fn base(url: &str) -> &str { url.trim_end_matches('/') }

/// Drives order and payment state from gateway callbacks.
///
/// An approved payment redirects immediately. The order confirmation, the
/// payment ledger entry and the notification run afterwards on tracked
/// background tasks: their failures are logged and nothing is retried, so a
/// shopper can land on the success page while the order stays unconfirmed.
/// A declined payment is written before the redirect is returned.
pub struct PaymentCallbackHandler {
    verifier: Arc<dyn GatewayVerifier>,
    orders: Arc<dyn OrderStore>,
    ledger: Arc<dyn PaymentLedger>,
    notifier: Arc<dyn Notifier>,
    tasks: TaskTracker,
}

impl PaymentCallbackHandler {
    pub fn new(
        verifier: Arc<dyn GatewayVerifier>,
        orders: Arc<dyn OrderStore>,
        ledger: Arc<dyn PaymentLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { verifier, orders, ledger, notifier, tasks: TaskTracker::new() }
    }

    /// Background work spawned by approved callbacks.
    pub fn tasks(&self) -> &TaskTracker { &self.tasks }

    pub async fn handle(&self, fields: CallbackFields, base_url: &str) -> Result<CallbackOutcome> {
        let Some(order_id) = fields.first_of(&ORDER_ID_ALIASES).map(str::to_string) else {
            tracing::warn!("payment callback without order id");
            return Ok(CallbackOutcome::failure(base_url, None, ERROR_ORDER_NOT_FOUND));
        };

        let verification = self.verifier.verify(&fields).await?;
        if verification.success {
            tracing::info!(order_id = %order_id, "payment approved");
            self.confirm_in_background(order_id.clone(), fields);
            return Ok(CallbackOutcome::success(base_url, &order_id));
        }

        let error = verification.error.unwrap_or_else(|| ERROR_PAYMENT_FAILED.to_string());
        tracing::warn!(order_id = %order_id, error = %error, "payment declined");
        self.orders
            .update_order(&order_id, OrderUpdate {
                payment_status: Some(PaymentStatus::Failed),
                notes: Some(format!("Gateway error: {}", error)),
                ..Default::default()
            })
            .await?;

        let mut response = fields.to_json();
        if let serde_json::Value::Object(map) = &mut response {
            map.insert("error".to_string(), serde_json::Value::String(error.clone()));
        }
        let failed = NewPayment {
            order_id: order_id.clone(),
            amount: amount_of(&fields),
            method: PaymentMethod::CreditCard,
            status: PaymentStatus::Failed,
            transaction_id: fields.get("TransId").map(str::to_string),
            gateway_response: response,
        };
        if let Err(e) = self.ledger.record_payment(failed).await {
            tracing::warn!(order_id = %order_id, error = %e, "failed payment not recorded");
        }
        Ok(CallbackOutcome::failure(base_url, Some(&order_id), &error))
    }

    fn confirm_in_background(&self, order_id: String, fields: CallbackFields) {
        let orders = Arc::clone(&self.orders);
        let ledger = Arc::clone(&self.ledger);
        let notifier = Arc::clone(&self.notifier);
        self.tasks.spawn(async move {
            let auth_code = fields.get("AuthCode").unwrap_or("-");
            let trans_id = fields.get("TransId");
            let update = OrderUpdate {
                status: Some(OrderStatus::Confirmed),
                payment_status: Some(PaymentStatus::Completed),
                notes: Some(format!("Gateway approved. AuthCode: {}, TransId: {}", auth_code, trans_id.unwrap_or("-"))),
            };
            let contact = match orders.update_order(&order_id, update).await {
                Ok(contact) => contact,
                Err(e) => {
                    tracing::error!(order_id = %order_id, error = %e, "order confirmation failed after success redirect");
                    return;
                }
            };

            let payment = NewPayment {
                order_id: contact.id.clone(),
                amount: amount_of(&fields),
                method: PaymentMethod::CreditCard,
                status: PaymentStatus::Completed,
                transaction_id: Some(trans_id.map(str::to_string).unwrap_or_else(|| format!("TX-{}", Utc::now().timestamp_millis()))),
                gateway_response: fields.to_json(),
            };
            let (recorded, notified) = futures::join!(
                ledger.record_payment(payment),
                notifier.order_status_changed(&contact, OrderStatus::Confirmed),
            );
            if let Err(e) = recorded {
                tracing::warn!(order_id = %order_id, error = %e, "payment record not created");
            }
            if let Err(e) = notified {
                tracing::error!(order_id = %order_id, error = %e, "status notification failed");
            }
        });
    }
}

fn amount_of(fields: &CallbackFields) -> Decimal {
    fields.get("amount").and_then(|a| a.trim().parse().ok()).unwrap_or(Decimal::ZERO)
}
