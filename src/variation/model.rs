//! Form-state shapes for variation editing

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Identifier, Stock};

/// One axis of variation as edited in the admin form (e.g. "Color").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationType {
    /// Form token, stable for the lifetime of the form.
    pub id: String,
    /// Set once the type exists as a stored attribute.
    #[serde(default)]
    pub attribute_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub values: Vec<VariationValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationValue {
    pub id: String,
    #[serde(default)]
    pub value_id: Option<Uuid>,
    pub value: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Price as last loaded from storage.
    #[serde(default)]
    pub saved_price: Option<Decimal>,
}

impl VariationType {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.values.iter().any(VariationValue::is_filled)
    }

    /// Reference used for this type inside combinations.
    pub fn reference(&self) -> Identifier {
        match self.attribute_id {
            Some(id) => Identifier::Persisted(id),
            None => Identifier::Temporary(self.id.clone()),
        }
    }

    /// Non-blank values, first occurrence of each trimmed label.
    pub fn distinct_values(&self) -> Vec<&VariationValue> {
        let mut seen: Vec<&str> = Vec::new();
        self.values
            .iter()
            .filter(|v| v.is_filled())
            .filter(|v| {
                let label = v.value.trim();
                if seen.contains(&label) { false } else { seen.push(label); true }
            })
            .collect()
    }
}

impl VariationValue {
    pub fn is_filled(&self) -> bool { !self.value.trim().is_empty() }

    pub fn reference(&self) -> Identifier {
        match self.value_id {
            Some(id) => Identifier::Persisted(id),
            None => Identifier::Temporary(self.id.clone()),
        }
    }

    pub fn price_changed(&self) -> bool { self.price != self.saved_price }
}

/// One (attribute, value) assignment of a combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributePair {
    pub attribute: Identifier,
    pub value: Identifier,
    #[serde(default)]
    pub display_name: String,
}

/// Sorted (attribute, value) pairs identifying a combination regardless of pair order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinationKey(Vec<(Identifier, Identifier)>);

impl CombinationKey {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a AttributePair>) -> Self {
        let mut key: Vec<_> = pairs.into_iter().map(|p| (p.attribute.clone(), p.value.clone())).collect();
        key.sort();
        Self(key)
    }
}

/// A row of the variation table: one combination with its sellable fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVariation {
    pub id: Identifier,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<Stock>,
    pub attributes: Vec<AttributePair>,
    #[serde(default)]
    pub display_name: String,
}

impl GeneratedVariation {
    pub fn key(&self) -> CombinationKey { CombinationKey::from_pairs(&self.attributes) }

    /// Blank row for a combination nobody has filled in yet.
    pub fn blank(attributes: Vec<AttributePair>) -> Self {
        let display_name = attributes.iter().map(|a| a.display_name.as_str()).collect::<Vec<_>>().join(" | ");
        Self { id: Identifier::temporary(), sku: String::new(), price: None, stock: None, attributes, display_name }
    }
}

/// Variation as sent to the product store after reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationInput {
    pub id: Option<Uuid>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: Stock,
    pub attributes: Vec<ResolvedPair>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPair {
    pub attribute_id: Uuid,
    pub attribute_value_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(id: &str, label: &str) -> VariationValue {
        VariationValue { id: id.into(), value: label.into(), ..Default::default() }
    }

    #[test]
    fn test_blank_type_is_invalid() {
        let t = VariationType { id: "t".into(), name: "  ".into(), values: vec![value("v", "Red")], ..Default::default() };
        assert!(!t.is_valid());
        let t = VariationType { id: "t".into(), name: "Color".into(), values: vec![value("v", " ")], ..Default::default() };
        assert!(!t.is_valid());
    }

    #[test]
    fn test_distinct_values_first_wins() {
        let t = VariationType {
            id: "t".into(),
            name: "Color".into(),
            values: vec![value("a", "Red"), value("b", " Red "), value("c", ""), value("d", "Blue")],
            ..Default::default()
        };
        let ids: Vec<_> = t.distinct_values().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_key_ignores_pair_order() {
        let a = AttributePair { attribute: Identifier::Temporary("c".into()), value: Identifier::Temporary("r".into()), display_name: String::new() };
        let b = AttributePair { attribute: Identifier::Temporary("s".into()), value: Identifier::Temporary("m".into()), display_name: String::new() };
        assert_eq!(CombinationKey::from_pairs([&a, &b]), CombinationKey::from_pairs([&b, &a]));
    }

    #[test]
    fn test_identifier_json_shape() {
        let v: GeneratedVariation = serde_json::from_value(serde_json::json!({
            "id": { "kind": "persisted", "value": "00000000-0000-0000-0000-000000000000" },
            "price": "12.50",
            "stock": -1,
            "attributes": []
        })).unwrap();
        assert!(v.id.is_persisted());
        assert_eq!(v.stock, Some(Stock::Unlimited));
    }
}
