//! Cart Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::product::{Product, ProductType};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    session_id: Option<String>,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CartItem {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self {
            id: Uuid::new_v4(), session_id: None,
            items: vec![], subtotal: Money::zero(currency), currency: currency.to_string(),
            created_at: Utc::now(), updated_at: Utc::now(),
        }
    }

    pub fn for_session(session_id: impl Into<String>, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.session_id = Some(session_id.into());
        cart
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Add `quantity` of a product, or of one of its variations. Price and
    /// stock come from the variation when one is given.
    pub fn add(&mut self, product: &Product, variation_id: Option<Uuid>, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        let variation = match (product.product_type(), variation_id) {
            (ProductType::Variable, Some(id)) => Some(product.variation(id).ok_or(CartError::UnknownVariation)?),
            (ProductType::Variable, None) => return Err(CartError::VariationRequired),
            (ProductType::Simple, _) => None,
        };
        let variation_id = variation.map(|v| v.id);
        let stock = product.effective_stock(variation);
        let in_cart = self.quantity_of(product.id(), variation_id);
        let wanted = in_cart.saturating_add(quantity);
        if wanted > stock.pick_limit() || !stock.can_fulfil(wanted) {
            return Err(CartError::InsufficientStock { available: stock.pick_limit().saturating_sub(in_cart) });
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product.id() && i.variation_id == variation_id) {
            existing.quantity = wanted;
        } else {
            self.items.push(CartItem {
                product_id: product.id(),
                variation_id,
                name: product.name().to_string(),
                quantity,
                unit_price: Money::new(product.effective_price(variation), &self.currency),
            });
        }
        self.recalculate();
        Ok(())
    }

    pub fn quantity_of(&self, product_id: Uuid, variation_id: Option<Uuid>) -> u32 {
        self.items.iter().find(|i| i.product_id == product_id && i.variation_id == variation_id).map_or(0, |i| i.quantity)
    }

    pub fn remove_item(&mut self, product_id: Uuid, variation_id: Option<Uuid>) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !(i.product_id == product_id && i.variation_id == variation_id));
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.recalculate(); }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError { ItemNotFound, InvalidQuantity, VariationRequired, UnknownVariation, InsufficientStock { available: u32 } }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found"),
            Self::InvalidQuantity => write!(f, "Invalid quantity"),
            Self::VariationRequired => write!(f, "Choose a variation first"),
            Self::UnknownVariation => write!(f, "Unknown variation"),
            Self::InsufficientStock { available } => write!(f, "Only {} more available", available),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Stock, UNLIMITED_PICK_CAP};
    use crate::variation::{ResolvedPair, VariationInput};
    use rust_decimal::Decimal;

    fn shirt(stock: Stock) -> (Product, Uuid) {
        let mut p = Product::create_variable("T-Shirt");
        let saved = p.replace_variations(vec![VariationInput {
            id: None, sku: None, price: Decimal::new(25, 0), stock,
            attributes: vec![ResolvedPair { attribute_id: Uuid::new_v4(), attribute_value_id: Uuid::new_v4() }],
        }]).unwrap();
        let id = saved[0].id;
        (p, id)
    }

    #[test]
    fn test_cart_merges_lines() {
        let (p, var) = shirt(Stock::Limited(5));
        let mut cart = Cart::for_session("sess-1", "TRY");
        cart.add(&p, Some(var), 2).unwrap();
        cart.add(&p, Some(var), 1).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.subtotal().amount(), Decimal::new(75, 0));
    }

    #[test]
    fn test_limited_stock_bounds_quantity() {
        let (p, var) = shirt(Stock::Limited(2));
        let mut cart = Cart::new("TRY");
        cart.add(&p, Some(var), 2).unwrap();
        assert_eq!(cart.add(&p, Some(var), 1), Err(CartError::InsufficientStock { available: 0 }));
    }

    #[test]
    fn test_unlimited_stock_uses_pick_cap() {
        let (p, var) = shirt(Stock::Unlimited);
        let mut cart = Cart::new("TRY");
        cart.add(&p, Some(var), UNLIMITED_PICK_CAP).unwrap();
        assert!(cart.add(&p, Some(var), 1).is_err());
    }

    #[test]
    fn test_variable_product_needs_variation() {
        let (p, _) = shirt(Stock::Unlimited);
        let mut cart = Cart::new("TRY");
        assert_eq!(cart.add(&p, None, 1), Err(CartError::VariationRequired));
        assert_eq!(cart.add(&p, Some(Uuid::new_v4()), 1), Err(CartError::UnknownVariation));
        assert_eq!(cart.remove_item(p.id(), None), Err(CartError::ItemNotFound));
    }
}
