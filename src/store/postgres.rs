//! PostgreSQL store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    Attribute, AttributeKind, AttributeStore, AttributeValue, NewPayment, OrderContact, OrderStore, OrderUpdate,
    PaymentLedger, PaymentMethod, PaymentRecord, ProductStore,
};
use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus, Variation};
use crate::domain::value_objects::Money;
use crate::variation::VariationInput;
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
    pub fn pool(&self) -> &PgPool { &self.pool }
}

fn conflict_on_unique(e: sqlx::Error, what: &str) -> StorefrontError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorefrontError::Conflict(format!("{} already exists", what)),
        _ => e.into(),
    }
}

fn kind_of(raw: &str) -> AttributeKind { AttributeKind::parse(raw).unwrap_or_default() }

fn unknown(column: &str, raw: &str) -> StorefrontError { StorefrontError::Storage(format!("unknown {} {:?}", column, raw)) }

const ORDER_COLUMNS: &str =
    "SELECT id, order_number, customer_email, status, payment_status, total, currency, notes, created_at, updated_at FROM orders";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_email: Option<String>,
    status: String,
    payment_status: String,
    total: Decimal,
    currency: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| unknown("order status", &self.status))?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| unknown("payment status", &self.payment_status))?;
        Ok(Order::create(self.id, self.order_number, self.customer_email, Money::new(self.total, &self.currency))
            .restored(status, payment_status, self.notes, self.created_at, self.updated_at))
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: String,
    amount: Decimal,
    method: String,
    status: String,
    transaction_id: Option<String>,
    gateway_response: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_record(self) -> Result<PaymentRecord> {
        let method = PaymentMethod::parse(&self.method).ok_or_else(|| unknown("payment method", &self.method))?;
        let status = PaymentStatus::parse(&self.status).ok_or_else(|| unknown("payment status", &self.status))?;
        Ok(PaymentRecord {
            id: self.id,
            payment: NewPayment {
                order_id: self.order_id,
                amount: self.amount,
                method,
                status,
                transaction_id: self.transaction_id,
                gateway_response: self.gateway_response,
            },
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl AttributeStore for PgStore {
    async fn list_attributes(&self) -> Result<Vec<Attribute>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String)>("SELECT id, name, kind FROM product_attributes ORDER BY name")
            .fetch_all(&self.pool).await?;
        let values = sqlx::query_as::<_, AttributeValue>("SELECT id, attribute_id, value, price FROM product_attribute_values ORDER BY value")
            .fetch_all(&self.pool).await?;
        let mut grouped: HashMap<Uuid, Vec<AttributeValue>> = HashMap::new();
        for v in values { grouped.entry(v.attribute_id).or_default().push(v); }
        Ok(rows
            .into_iter()
            .map(|(id, name, kind)| Attribute { id, name, kind: kind_of(&kind), values: grouped.remove(&id).unwrap_or_default() })
            .collect())
    }

    async fn create_attribute(&self, name: &str, kind: AttributeKind) -> Result<(Attribute, bool)> {
        let name = name.trim();
        if name.is_empty() { return Err(StorefrontError::Validation("attribute name required".into())); }
        let inserted = sqlx::query("INSERT INTO product_attributes (id, name, kind, created_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::now_v7()).bind(name).bind(kind.as_str())
            .execute(&self.pool).await?;
        let (id, name, kind) = sqlx::query_as::<_, (Uuid, String, String)>("SELECT id, name, kind FROM product_attributes WHERE name = $1")
            .bind(name).fetch_one(&self.pool).await?;
        let values = sqlx::query_as::<_, AttributeValue>("SELECT id, attribute_id, value, price FROM product_attribute_values WHERE attribute_id = $1 ORDER BY value")
            .bind(id).fetch_all(&self.pool).await?;
        Ok((Attribute { id, name, kind: kind_of(&kind), values }, inserted.rows_affected() == 1))
    }

    async fn create_value(&self, attribute_id: Uuid, label: &str, price: Option<Decimal>) -> Result<(AttributeValue, bool)> {
        let label = label.trim();
        if label.is_empty() { return Err(StorefrontError::Validation("value label required".into())); }
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM product_attributes WHERE id = $1)")
            .bind(attribute_id).fetch_one(&self.pool).await?;
        if !exists.0 { return Err(StorefrontError::NotFound(format!("attribute {}", attribute_id))); }
        let inserted = sqlx::query("INSERT INTO product_attribute_values (id, attribute_id, value, price, created_at) VALUES ($1, $2, $3, $4, NOW()) ON CONFLICT (attribute_id, value) DO NOTHING")
            .bind(Uuid::now_v7()).bind(attribute_id).bind(label).bind(price)
            .execute(&self.pool).await?;
        let value = sqlx::query_as::<_, AttributeValue>("SELECT id, attribute_id, value, price FROM product_attribute_values WHERE attribute_id = $1 AND value = $2")
            .bind(attribute_id).bind(label).fetch_one(&self.pool).await?;
        Ok((value, inserted.rows_affected() == 1))
    }

    async fn update_value_price(&self, attribute_id: Uuid, value_id: Uuid, price: Option<Decimal>) -> Result<AttributeValue> {
        sqlx::query_as::<_, AttributeValue>(
            "UPDATE product_attribute_values SET price = $3 WHERE id = $1 AND attribute_id = $2 RETURNING id, attribute_id, value, price",
        )
        .bind(value_id).bind(attribute_id).bind(price)
        .fetch_optional(&self.pool).await?
        .ok_or_else(|| StorefrontError::NotFound(format!("attribute value {}", value_id)))
    }

    async fn delete_value(&self, attribute_id: Uuid, value_id: Uuid) -> Result<()> {
        let owned: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM product_attribute_values WHERE id = $1 AND attribute_id = $2)")
            .bind(value_id).bind(attribute_id).fetch_one(&self.pool).await?;
        if !owned.0 { return Err(StorefrontError::NotFound(format!("attribute value {}", value_id))); }
        let in_use: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM product_variation_attributes WHERE attribute_value_id = $1)")
            .bind(value_id).fetch_one(&self.pool).await?;
        if in_use.0 { return Err(StorefrontError::Conflict("attribute value is used by a variation".into())); }
        let done = sqlx::query("DELETE FROM product_attribute_values WHERE id = $1 AND attribute_id = $2")
            .bind(value_id).bind(attribute_id).execute(&self.pool).await?;
        if done.rows_affected() == 0 { return Err(StorefrontError::NotFound(format!("attribute value {}", value_id))); }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn save_variations(&self, product_id: Uuid, variations: Vec<VariationInput>) -> Result<Vec<Variation>> {
        if variations.is_empty() { return Err(StorefrontError::NoVariations); }
        let mut tx = self.pool.begin().await?;

        let product_type: Option<(String,)> = sqlx::query_as("SELECT product_type FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id).fetch_optional(&mut *tx).await?;
        match product_type {
            None => return Err(StorefrontError::NotFound(format!("product {}", product_id))),
            Some((t,)) if t != "VARIABLE" => return Err(StorefrontError::Validation("product has no variations".into())),
            Some(_) => {}
        }

        let kept: Vec<Uuid> = variations.iter().filter_map(|v| v.id).collect();
        sqlx::query("DELETE FROM product_variations WHERE product_id = $1 AND NOT (id = ANY($2))")
            .bind(product_id).bind(&kept).execute(&mut *tx).await?;

        let mut saved = Vec::with_capacity(variations.len());
        for input in variations {
            let id = input.id.unwrap_or_else(Uuid::now_v7);
            let written = sqlx::query(
                "INSERT INTO product_variations (id, product_id, sku, price, stock, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
                 ON CONFLICT (id) DO UPDATE SET sku = EXCLUDED.sku, price = EXCLUDED.price, stock = EXCLUDED.stock, updated_at = NOW() \
                 WHERE product_variations.product_id = EXCLUDED.product_id",
            )
            .bind(id).bind(product_id).bind(&input.sku).bind(input.price).bind(i32::try_from(input.stock)?)
            .execute(&mut *tx).await
            .map_err(|e| conflict_on_unique(e, "variation SKU"))?;
            if written.rows_affected() == 0 {
                return Err(StorefrontError::Conflict(format!("variation {} belongs to another product", id)));
            }

            sqlx::query("DELETE FROM product_variation_attributes WHERE variation_id = $1").bind(id).execute(&mut *tx).await?;
            for pair in &input.attributes {
                let linked = sqlx::query(
                    "INSERT INTO product_variation_attributes (variation_id, attribute_value_id) \
                     SELECT $1, id FROM product_attribute_values WHERE id = $2 AND attribute_id = $3 ON CONFLICT DO NOTHING",
                )
                .bind(id).bind(pair.attribute_value_id).bind(pair.attribute_id)
                .execute(&mut *tx).await?;
                if linked.rows_affected() == 0 {
                    return Err(StorefrontError::Validation(format!("value {} does not belong to attribute {}", pair.attribute_value_id, pair.attribute_id)));
                }
            }
            saved.push(Variation { id, product_id, sku: input.sku, price: input.price, stock: input.stock, attributes: input.attributes });
        }

        sqlx::query("UPDATE products SET updated_at = NOW() WHERE id = $1").bind(product_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(saved)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn get_order(&self, order_id: &str) -> Result<Order> {
        sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1", ORDER_COLUMNS))
            .bind(order_id)
            .fetch_optional(&self.pool).await?
            .ok_or_else(|| StorefrontError::NotFound(format!("order {}", order_id)))?
            .into_order()
    }

    async fn list_orders(&self, status: Option<OrderStatus>, limit: u32) -> Result<Vec<Order>> {
        sqlx::query_as::<_, OrderRow>(&format!("{} WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC LIMIT $2", ORDER_COLUMNS))
            .bind(status.map(|s| s.as_str()))
            .bind(i64::from(limit))
            .fetch_all(&self.pool).await?
            .into_iter()
            .map(OrderRow::into_order)
            .collect()
    }

    async fn update_order(&self, order_id: &str, update: OrderUpdate) -> Result<OrderContact> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            "UPDATE orders SET status = COALESCE($2, status), payment_status = COALESCE($3, payment_status), notes = COALESCE($4, notes), updated_at = NOW() \
             WHERE id = $1 RETURNING id, customer_email",
        )
        .bind(order_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.payment_status.map(|s| s.as_str()))
        .bind(update.notes)
        .fetch_optional(&self.pool).await?;
        let (id, email) = row.ok_or_else(|| StorefrontError::NotFound(format!("order {}", order_id)))?;
        Ok(OrderContact { id, email })
    }
}

#[async_trait]
impl PaymentLedger for PgStore {
    async fn record_payment(&self, payment: NewPayment) -> Result<PaymentRecord> {
        let id = Uuid::now_v7();
        let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
            "INSERT INTO payments (id, order_id, amount, method, status, transaction_id, gateway_response, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING created_at",
        )
        .bind(id).bind(&payment.order_id).bind(payment.amount).bind(payment.method.as_str())
        .bind(payment.status.as_str()).bind(&payment.transaction_id).bind(&payment.gateway_response)
        .fetch_one(&self.pool).await
        .map_err(|e| conflict_on_unique(e, "payment"))?;
        Ok(PaymentRecord { id, payment, created_at })
    }

    async fn list_payments(&self, order_id: Option<&str>) -> Result<Vec<PaymentRecord>> {
        sqlx::query_as::<_, PaymentRow>(
            "SELECT id, order_id, amount, method, status, transaction_id, gateway_response, created_at FROM payments \
             WHERE ($1::TEXT IS NULL OR order_id = $1) ORDER BY created_at DESC",
        )
        .bind(order_id)
        .fetch_all(&self.pool).await?
        .into_iter()
        .map(PaymentRow::into_record)
        .collect()
    }
}
