//! Order and payment ledger endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{not_blank, validated, AppState};
use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus};
use crate::store::{NewPayment, OrderUpdate, PaymentMethod, PaymentRecord};
use crate::{Result, StorefrontError};

const DEFAULT_ORDER_PAGE: u32 = 50;
const MAX_ORDER_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<OrderStatus>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsParams {
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(length(max = 64), custom = "not_blank")]
    pub order_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
}

/// GET /api/v1/admin/orders
pub async fn list(State(s): State<AppState>, Query(p): Query<ListOrdersParams>) -> Result<Json<Vec<Order>>> {
    let limit = p.limit.unwrap_or(DEFAULT_ORDER_PAGE).clamp(1, MAX_ORDER_PAGE);
    Ok(Json(s.orders.list_orders(p.status, limit).await?))
}

pub async fn get(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    Ok(Json(s.orders.get_order(&id).await?))
}

/// PUT /api/v1/orders/:id
///
/// A status change must be a legal transition and notifies the customer.
pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(r): Json<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let mut order = s.orders.get_order(&id).await?;
    let previous = order.status();
    if let Some(next) = r.status {
        order.transition(next).map_err(|e| StorefrontError::Conflict(e.to_string()))?;
    }

    let update = OrderUpdate { status: r.status, payment_status: r.payment_status, notes: r.notes };
    let contact = s.orders.update_order(&id, update).await?;
    if let Some(next) = r.status.filter(|next| *next != previous) {
        tracing::info!(order_id = %id, from = previous.as_str(), to = next.as_str(), "order status changed");
        if let Err(e) = s.notifier.order_status_changed(&contact, next).await {
            tracing::warn!(order_id = %id, error = %e, "status notification failed");
        }
    }
    Ok(Json(s.orders.get_order(&id).await?))
}

/// GET /api/v1/payments
pub async fn list_payments(State(s): State<AppState>, Query(p): Query<ListPaymentsParams>) -> Result<Json<Vec<PaymentRecord>>> {
    Ok(Json(s.ledger.list_payments(p.order_id.as_deref()).await?))
}

/// POST /api/v1/payments
pub async fn create_payment(
    State(s): State<AppState>,
    Json(r): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentRecord>)> {
    let r = validated(r)?;
    if r.amount <= Decimal::ZERO {
        return Err(StorefrontError::Validation("amount must be positive".into()));
    }
    let order = s.orders.get_order(r.order_id.trim()).await?;
    let record = s
        .ledger
        .record_payment(NewPayment {
            order_id: order.id().to_string(),
            amount: r.amount,
            method: r.method,
            status: r.status,
            transaction_id: r.transaction_id.filter(|t| !t.trim().is_empty()),
            gateway_response: serde_json::json!({}),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
