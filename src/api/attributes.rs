//! Attribute and attribute value endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{not_blank, validated, AppState};
use crate::domain::events::ProductEvent;
use crate::store::{Attribute, AttributeKind, AttributeValue};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttributeRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: AttributeKind,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateValueRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub value: String,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateValueRequest {
    #[serde(default)]
    pub price: Option<Decimal>,
}

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<Attribute>>> {
    Ok(Json(s.attributes.list_attributes().await?))
}

fn created_or_existing<T>((record, created): (T, bool)) -> (StatusCode, Json<T>) {
    (if created { StatusCode::CREATED } else { StatusCode::OK }, Json(record))
}

/// 201 for a new attribute, 200 when one with the same name already exists.
pub async fn create(State(s): State<AppState>, Json(r): Json<CreateAttributeRequest>) -> Result<(StatusCode, Json<Attribute>)> {
    let r = validated(r)?;
    let (attr, created) = s.attributes.create_attribute(&r.name, r.kind).await?;
    if created {
        s.publish(ProductEvent::AttributeChanged { attribute_id: attr.id });
    }
    Ok(created_or_existing((attr, created)))
}

pub async fn create_value(
    State(s): State<AppState>,
    Path(attribute_id): Path<Uuid>,
    Json(r): Json<CreateValueRequest>,
) -> Result<(StatusCode, Json<AttributeValue>)> {
    let r = validated(r)?;
    let (value, created) = s.attributes.create_value(attribute_id, &r.value, r.price).await?;
    if created {
        s.publish(ProductEvent::AttributeChanged { attribute_id });
    }
    Ok(created_or_existing((value, created)))
}

pub async fn update_value(
    State(s): State<AppState>,
    Path((attribute_id, value_id)): Path<(Uuid, Uuid)>,
    Json(r): Json<UpdateValueRequest>,
) -> Result<Json<AttributeValue>> {
    let value = s.attributes.update_value_price(attribute_id, value_id, r.price).await?;
    s.publish(ProductEvent::AttributeChanged { attribute_id: value.attribute_id });
    Ok(Json(value))
}

pub async fn delete_value(
    State(s): State<AppState>,
    Path((attribute_id, value_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    s.attributes.delete_value(attribute_id, value_id).await?;
    s.publish(ProductEvent::AttributeChanged { attribute_id });
    Ok(StatusCode::NO_CONTENT)
}
