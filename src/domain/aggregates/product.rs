//! Product Aggregate

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Stock;
use crate::variation::{ResolvedPair, VariationInput};

#[derive(Clone, Debug)]
pub struct Product {
    id: Uuid,
    name: String,
    product_type: ProductType,
    price: Decimal,
    stock: Stock,
    variations: Vec<Variation>,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

/// One sellable combination as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: Stock,
    pub attributes: Vec<ResolvedPair>,
}

impl Variation {
    /// True when the selection (attribute id to value id) names exactly this combination.
    pub fn matches(&self, selection: &BTreeMap<Uuid, Uuid>) -> bool {
        self.attributes.len() == selection.len()
            && self.attributes.iter().all(|a| selection.get(&a.attribute_id) == Some(&a.attribute_value_id))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType { #[default] Simple, Variable }

#[derive(Clone, Debug, Default, PartialEq, Eq)] pub enum ProductStatus { #[default] Draft, Active, Archived }

impl Product {
    pub fn create_simple(name: impl Into<String>, price: Decimal, stock: Stock) -> Self {
        Self::create(name.into(), ProductType::Simple, price, stock)
    }

    /// Variable products carry price and stock on their variations.
    pub fn create_variable(name: impl Into<String>) -> Self {
        Self::create(name.into(), ProductType::Variable, Decimal::ZERO, Stock::Limited(0))
    }

    fn create(name: String, product_type: ProductType, price: Decimal, stock: Stock) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name, product_type, price, stock, variations: vec![],
            status: ProductStatus::Draft, created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn product_type(&self) -> ProductType { self.product_type }
    pub fn price(&self) -> Decimal { self.price }
    pub fn status(&self) -> &ProductStatus { &self.status }
    pub fn variations(&self) -> &[Variation] { &self.variations }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.product_type == ProductType::Variable && self.variations.is_empty() { return Err(ProductError::NoVariations); }
        self.status = ProductStatus::Active;
        self.touch();
        Ok(())
    }

    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    /// Replace the variation set. Inputs with an id keep it; the rest get a new one.
    pub fn replace_variations(&mut self, inputs: Vec<VariationInput>) -> Result<&[Variation], ProductError> {
        if self.product_type != ProductType::Variable { return Err(ProductError::NotVariable); }
        if inputs.is_empty() { return Err(ProductError::NoVariations); }
        let product_id = self.id;
        self.variations = inputs
            .into_iter()
            .map(|v| Variation {
                id: v.id.unwrap_or_else(Uuid::now_v7),
                product_id,
                sku: v.sku,
                price: v.price,
                stock: v.stock,
                attributes: v.attributes,
            })
            .collect();
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::VariationsSaved { product_id: self.id, count: self.variations.len() }));
        Ok(&self.variations)
    }

    pub fn find_variation(&self, selection: &BTreeMap<Uuid, Uuid>) -> Option<&Variation> {
        self.variations.iter().find(|v| v.matches(selection))
    }

    pub fn variation(&self, id: Uuid) -> Option<&Variation> { self.variations.iter().find(|v| v.id == id) }

    /// Stock of the selected variation, or of the product itself.
    pub fn effective_stock(&self, selected: Option<&Variation>) -> Stock {
        selected.map(|v| v.stock).unwrap_or(self.stock)
    }

    pub fn effective_price(&self, selected: Option<&Variation>) -> Decimal {
        selected.map(|v| v.price).unwrap_or(self.price)
    }

    /// Variations that can be sold now; unlimited ones always qualify.
    pub fn available_variations(&self) -> impl Iterator<Item = &Variation> {
        self.variations.iter().filter(|v| v.stock.is_available())
    }

    pub fn is_in_stock(&self) -> bool {
        match self.product_type {
            ProductType::Simple => self.stock.is_available(),
            ProductType::Variable => self.available_variations().next().is_some(),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, NotVariable, NoVariations }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::NotVariable => write!(f, "Product has no variations"),
            Self::NoVariations => write!(f, "At least one variation required"),
        }
    }
}
