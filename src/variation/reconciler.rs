//! Submit-time reconciliation of form variations against stored attributes

use std::collections::HashMap;

use uuid::Uuid;

use super::model::{GeneratedVariation, ResolvedPair, VariationInput, VariationType};
use crate::domain::value_objects::{Identifier, Sku};
use crate::store::{AttributeKind, AttributeStore};
use crate::{Result, StorefrontError};

/// Form token to stored id, for types and for values.
#[derive(Debug, Default)]
pub struct IdMap {
    attributes: HashMap<String, Uuid>,
    values: HashMap<String, Uuid>,
}

impl IdMap {
    fn attribute(&self, reference: &Identifier) -> Option<Uuid> {
        match reference {
            Identifier::Persisted(id) => Some(*id),
            Identifier::Temporary(token) => self.attributes.get(token).copied(),
        }
    }

    fn value(&self, reference: &Identifier) -> Option<Uuid> {
        match reference {
            Identifier::Persisted(id) => Some(*id),
            Identifier::Temporary(token) => self.values.get(token).copied(),
        }
    }
}

/// Make sure every attribute and value the form uses exists in storage and
/// translate the variation table into the payload for the product store.
///
/// Creation failures abort with the offending label. Attributes and values
/// created before the failure stay stored.
pub async fn reconcile_variations(
    store: &dyn AttributeStore,
    types: &[VariationType],
    variations: &[GeneratedVariation],
) -> Result<Vec<VariationInput>> {
    let ids = persist_attributes(store, types).await?;
    let inputs = resolve_variations(&ids, variations)?;
    if inputs.is_empty() {
        tracing::warn!(rows = variations.len(), "no complete variation left after reconciliation");
        return Err(StorefrontError::NoVariations);
    }
    Ok(inputs)
}

pub async fn persist_attributes(store: &dyn AttributeStore, types: &[VariationType]) -> Result<IdMap> {
    let mut ids = IdMap::default();
    for vtype in types.iter().filter(|t| t.is_valid()) {
        let name = vtype.name.trim();
        let attribute_id = match vtype.attribute_id {
            Some(id) => id,
            None => {
                let (attr, created) = store
                    .create_attribute(name, AttributeKind::Select)
                    .await
                    .map_err(|e| StorefrontError::AttributeCreation { label: name.to_string(), reason: e.to_string() })?;
                if created {
                    tracing::info!(attribute_id = %attr.id, name, "attribute created");
                }
                attr.id
            }
        };
        ids.attributes.insert(vtype.id.clone(), attribute_id);

        for value in vtype.values.iter().filter(|v| v.is_filled()) {
            let label = value.value.trim();
            let value_id = match value.value_id {
                Some(id) => {
                    if value.price_changed() {
                        if let Err(e) = store.update_value_price(attribute_id, id, value.price).await {
                            tracing::warn!(value_id = %id, label, error = %e, "attribute value price update failed");
                        }
                    }
                    id
                }
                None => {
                    let (created, _) = store
                        .create_value(attribute_id, label, value.price)
                        .await
                        .map_err(|e| StorefrontError::ValueCreation { label: label.to_string(), reason: e.to_string() })?;
                    created.id
                }
            };
            ids.values.insert(value.id.clone(), value_id);
        }
    }
    Ok(ids)
}

/// Rows missing a price, a stock entry or any resolvable attribute are left out.
pub fn resolve_variations(ids: &IdMap, variations: &[GeneratedVariation]) -> Result<Vec<VariationInput>> {
    let mut inputs = Vec::with_capacity(variations.len());
    for v in variations {
        let (Some(price), Some(stock)) = (v.price, v.stock) else {
            tracing::debug!(variation = %v.id, "skipping variation without price or stock");
            continue;
        };
        let attributes: Vec<ResolvedPair> = v
            .attributes
            .iter()
            .filter_map(|pair| {
                Some(ResolvedPair { attribute_id: ids.attribute(&pair.attribute)?, attribute_value_id: ids.value(&pair.value)? })
            })
            .collect();
        if attributes.is_empty() {
            tracing::debug!(variation = %v.id, "skipping variation without resolved attributes");
            continue;
        }
        let sku = Sku::parse_optional(&v.sku).map_err(|e| StorefrontError::Validation(format!("{}: {}", v.display_name, e)))?;
        inputs.push(VariationInput { id: v.id.persisted(), sku: sku.map(|s| s.to_string()), price, stock, attributes });
    }
    Ok(inputs)
}
