//! Variation table endpoints for the product editor

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::AppState;
use crate::domain::aggregates::Variation;
use crate::domain::events::ProductEvent;
use crate::variation::{generate_variations, reconcile_variations, GeneratedVariation, VariationType};
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationForm {
    pub types: Vec<VariationType>,
    #[serde(default)]
    pub variations: Vec<GeneratedVariation>,
}

/// POST /api/v1/admin/variations/generate
pub async fn generate(Json(form): Json<VariationForm>) -> Json<Vec<GeneratedVariation>> {
    Json(generate_variations(&form.types, &form.variations))
}

/// PUT /api/v1/products/:id/variations
pub async fn save(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(form): Json<VariationForm>,
) -> Result<Json<Vec<Variation>>> {
    let inputs = reconcile_variations(s.attributes.as_ref(), &form.types, &form.variations).await?;
    let saved = s.products.save_variations(product_id, inputs).await?;
    tracing::info!(product_id = %product_id, count = saved.len(), "variations saved");
    s.publish(ProductEvent::VariationsSaved { product_id, count: saved.len() });
    Ok(Json(saved))
}

/// GET /api/v1/admin/catalog/events
///
/// Lets open admin lists refresh when the catalog changes.
pub async fn catalog_events(State(s): State<AppState>) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = s.catalog_events.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().event("catalog").data(data)), rx));
                }
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "catalog subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
