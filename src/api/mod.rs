//! HTTP surface

mod attributes;
mod error;
mod orders;
mod payment;
mod variations;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::{Validate, ValidationError};

use crate::domain::events::ProductEvent;
use crate::notify::Notifier;
use crate::payment::{GatewayVerifier, PaymentCallbackHandler};
use crate::store::{AttributeStore, OrderStore, PaymentLedger, ProductStore};
use crate::{Result, StorefrontError};

pub use payment::base_url;

const CATALOG_EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub attributes: Arc<dyn AttributeStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub ledger: Arc<dyn PaymentLedger>,
    pub notifier: Arc<dyn Notifier>,
    pub payments: Arc<PaymentCallbackHandler>,
    pub catalog_events: broadcast::Sender<ProductEvent>,
    pub public_base_url: Option<String>,
}

impl AppState {
    pub fn new(
        attributes: Arc<dyn AttributeStore>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        ledger: Arc<dyn PaymentLedger>,
        notifier: Arc<dyn Notifier>,
        verifier: Arc<dyn GatewayVerifier>,
        public_base_url: Option<String>,
    ) -> Self {
        let payments = Arc::new(PaymentCallbackHandler::new(verifier, orders.clone(), ledger.clone(), notifier.clone()));
        let (catalog_events, _) = broadcast::channel(CATALOG_EVENT_CAPACITY);
        Self { attributes, products, orders, ledger, notifier, payments, catalog_events, public_base_url }
    }

    /// Tell connected admin sessions the catalog changed.
    pub fn publish(&self, event: ProductEvent) {
        if self.catalog_events.send(event).is_err() {
            tracing::trace!("no catalog subscribers");
        }
    }
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("blank")) } else { Ok(()) }
}

fn validated<T: Validate>(req: T) -> Result<T> {
    req.validate().map_err(|e| StorefrontError::Validation(e.to_string()))?;
    Ok(req)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/api/v1/attributes", get(attributes::list).post(attributes::create))
        .route("/api/v1/attributes/:id/values", post(attributes::create_value))
        .route("/api/v1/attributes/:id/values/:value_id", put(attributes::update_value).delete(attributes::delete_value))
        .route("/api/v1/admin/variations/generate", post(variations::generate))
        .route("/api/v1/admin/catalog/events", get(variations::catalog_events))
        .route("/api/v1/admin/orders", get(orders::list))
        .route("/api/v1/products/:id/variations", put(variations::save))
        .route("/api/v1/orders/:id", get(orders::get).put(orders::update))
        .route("/api/v1/payments", get(orders::list_payments).post(orders::create_payment))
        .route("/api/payment/callback", get(payment::callback_get).post(payment::callback_post))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
