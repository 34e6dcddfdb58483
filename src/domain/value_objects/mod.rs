//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of an entity that may or may not have been saved yet.
///
/// Form state refers to unsaved attributes, values and variations through a
/// client-side token; once storage assigns an id the reference becomes
/// `Persisted`. Ordering puts every `Temporary` before every `Persisted`,
/// which keeps composite keys stable when sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    Temporary(String),
    Persisted(Uuid),
}

impl Identifier {
    /// Fresh temporary identifier for a row that exists only in form state.
    pub fn temporary() -> Self { Self::Temporary(Uuid::new_v4().simple().to_string()) }
    pub fn is_persisted(&self) -> bool { matches!(self, Self::Persisted(_)) }
    pub fn persisted(&self) -> Option<Uuid> {
        match self { Self::Persisted(id) => Some(*id), Self::Temporary(_) => None }
    }
}

impl From<Uuid> for Identifier {
    fn from(id: Uuid) -> Self { Self::Persisted(id) }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Temporary(t) => write!(f, "tmp:{}", t), Self::Persisted(id) => write!(f, "{}", id) }
    }
}

/// Largest quantity a shopper may pick for an item with unlimited stock.
pub const UNLIMITED_PICK_CAP: u32 = 999;

/// Stock level. Crosses every boundary as an integer where `-1` means unlimited.
///
/// JSON carries the full `u32` range. The SQL column is `INTEGER`, so
/// [`i32::try_from`] rejects counts it cannot hold instead of clamping them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Stock {
    Unlimited,
    Limited(u32),
}

impl Stock {
    pub const UNLIMITED_SENTINEL: i32 = -1;

    pub fn is_unlimited(&self) -> bool { matches!(self, Self::Unlimited) }

    /// Whether at least one unit can be sold.
    pub fn is_available(&self) -> bool {
        match self { Self::Unlimited => true, Self::Limited(n) => *n > 0 }
    }

    pub fn can_fulfil(&self, qty: u32) -> bool {
        match self { Self::Unlimited => true, Self::Limited(n) => qty <= *n }
    }

    /// Upper bound for a quantity picker.
    pub fn pick_limit(&self) -> u32 {
        match self { Self::Unlimited => UNLIMITED_PICK_CAP, Self::Limited(n) => *n }
    }
}

impl Default for Stock { fn default() -> Self { Self::Limited(0) } }

impl TryFrom<i64> for Stock {
    type Error = StockError;
    fn try_from(raw: i64) -> Result<Self, StockError> {
        match raw {
            -1 => Ok(Self::Unlimited),
            n if n < 0 => Err(StockError::Negative(n)),
            n => u32::try_from(n).map(Self::Limited).map_err(|_| StockError::TooLarge(n)),
        }
    }
}

impl From<Stock> for i64 {
    fn from(stock: Stock) -> i64 {
        match stock {
            Stock::Unlimited => i64::from(Stock::UNLIMITED_SENTINEL),
            Stock::Limited(n) => i64::from(n),
        }
    }
}

impl TryFrom<Stock> for i32 {
    type Error = StockError;
    fn try_from(stock: Stock) -> Result<i32, StockError> {
        match stock {
            Stock::Unlimited => Ok(Stock::UNLIMITED_SENTINEL),
            Stock::Limited(n) => i32::try_from(n).map_err(|_| StockError::TooLarge(i64::from(n))),
        }
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Unlimited => write!(f, "unlimited"), Self::Limited(n) => write!(f, "{}", n) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum StockError { Negative(i64), TooLarge(i64) }
impl std::error::Error for StockError {}
impl fmt::Display for StockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative(n) => write!(f, "invalid stock {}: only -1 may be negative", n),
            Self::TooLarge(n) => write!(f, "stock {} is too large", n),
        }
    }
}

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 64 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// Optional form field: blank means "no SKU".
    pub fn parse_optional(value: &str) -> Result<Option<Self>, SkuError> {
        if value.trim().is_empty() { Ok(None) } else { Self::new(value).map(Some) }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() { let sku = Sku::new("tshirt-red-m").unwrap(); assert_eq!(sku.as_str(), "TSHIRT-RED-M"); }

    #[test]
    fn test_blank_sku_is_none() { assert!(Sku::parse_optional("   ").unwrap().is_none()); }

    #[test]
    fn test_stock_sentinel() {
        let stock: Stock = serde_json::from_str("-1").unwrap();
        assert_eq!(stock, Stock::Unlimited);
        assert!(stock.is_available());
        assert_eq!(serde_json::to_string(&stock).unwrap(), "-1");
        assert_eq!(stock.to_string(), "unlimited");
        assert_eq!(stock.pick_limit(), UNLIMITED_PICK_CAP);
        assert!(serde_json::from_str::<Stock>("-2").is_err());
    }

    #[test]
    fn test_stock_limited() {
        assert!(!Stock::Limited(0).is_available());
        assert!(Stock::Limited(3).can_fulfil(3));
        assert!(!Stock::Limited(3).can_fulfil(4));
        assert_eq!(i32::try_from(Stock::Limited(7)), Ok(7));
        assert_eq!(i32::try_from(Stock::Unlimited), Ok(-1));
    }

    #[test]
    fn test_large_stock_is_not_clamped() {
        let big = Stock::Limited(u32::MAX);
        let json = serde_json::to_string(&big).unwrap();
        assert_eq!(json, u32::MAX.to_string());
        assert_eq!(serde_json::from_str::<Stock>(&json).unwrap(), big);
        assert_eq!(i32::try_from(big), Err(StockError::TooLarge(i64::from(u32::MAX))));
        assert!(serde_json::from_str::<Stock>("4294967296").is_err());
    }

    #[test]
    fn test_identifier_ordering() {
        let tmp = Identifier::Temporary("zzz".into());
        let saved = Identifier::Persisted(Uuid::nil());
        assert!(tmp < saved);
        assert!(!tmp.is_persisted());
        assert_eq!(saved.persisted(), Some(Uuid::nil()));
        assert_ne!(Identifier::temporary(), Identifier::temporary());
    }

    #[test]
    fn test_money_add() {
        let a = Money::new(Decimal::new(100, 0), "TRY");
        let b = Money::new(Decimal::new(50, 0), "TRY");
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert!(a.add(&Money::zero("USD")).is_err());
    }
}
