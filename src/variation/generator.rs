//! Cartesian combination of variation types into variation rows

use std::collections::{HashMap, HashSet};

use super::model::{AttributePair, CombinationKey, GeneratedVariation, VariationType};

/// Rebuild the variation table for the current attribute types.
///
/// Saved variations are always carried over untouched. Every combination of
/// the valid types that no saved variation covers gets a row: the previous
/// unsaved row for the same combination if there is one, else a blank row.
/// Reused rows keep their id, SKU, price and stock; labels always come from
/// the current types.
pub fn generate_variations(types: &[VariationType], current: &[GeneratedVariation]) -> Vec<GeneratedVariation> {
    let persisted: Vec<GeneratedVariation> = current.iter().filter(|v| v.id.is_persisted()).cloned().collect();

    let valid: Vec<&VariationType> = types.iter().filter(|t| t.is_valid()).collect();
    if valid.is_empty() {
        tracing::debug!(kept = persisted.len(), "no valid variation types, keeping saved variations only");
        return persisted;
    }

    let covered: HashSet<CombinationKey> = persisted.iter().map(GeneratedVariation::key).collect();
    let mut drafts: HashMap<CombinationKey, &GeneratedVariation> = HashMap::new();
    for v in current.iter().filter(|v| !v.id.is_persisted()) {
        drafts.entry(v.key()).or_insert(v);
    }

    let mut result = persisted;
    let mut created = 0usize;
    for combination in combinations(&valid) {
        let key = CombinationKey::from_pairs(&combination);
        if covered.contains(&key) { continue; }
        match drafts.get(&key) {
            Some(draft) => result.push(GeneratedVariation {
                id: draft.id.clone(),
                sku: draft.sku.clone(),
                price: draft.price,
                stock: draft.stock,
                ..GeneratedVariation::blank(combination)
            }),
            None => { result.push(GeneratedVariation::blank(combination)); created += 1; }
        }
    }
    tracing::debug!(total = result.len(), created, "variations regenerated");
    result
}

/// All combinations in lexicographic order: the first type varies slowest.
pub fn combinations(types: &[&VariationType]) -> Vec<Vec<AttributePair>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(types.len());
    walk(types, &mut current, &mut out);
    out
}

fn walk(types: &[&VariationType], current: &mut Vec<AttributePair>, out: &mut Vec<Vec<AttributePair>>) {
    let Some((head, rest)) = types.split_first() else {
        out.push(current.clone());
        return;
    };
    for value in head.distinct_values() {
        current.push(AttributePair {
            attribute: head.reference(),
            value: value.reference(),
            display_name: format!("{}: {}", head.name.trim(), value.value.trim()),
        });
        walk(rest, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Identifier, Stock};
    use crate::variation::model::VariationValue;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn vtype(id: &str, name: &str, labels: &[&str]) -> VariationType {
        VariationType {
            id: id.into(),
            attribute_id: None,
            name: name.into(),
            values: labels.iter().enumerate().map(|(i, l)| VariationValue { id: format!("{}-{}", id, i), value: (*l).into(), ..Default::default() }).collect(),
        }
    }

    fn names(vs: &[GeneratedVariation]) -> Vec<String> { vs.iter().map(|v| v.display_name.clone()).collect() }

    #[test]
    fn test_color_size_scenario() {
        let types = vec![vtype("c", "Color", &["Red", "Blue"]), vtype("s", "Size", &["M", "L"])];
        let out = generate_variations(&types, &[]);
        assert_eq!(names(&out), vec![
            "Color: Red | Size: M", "Color: Red | Size: L", "Color: Blue | Size: M", "Color: Blue | Size: L",
        ]);
        assert!(out.iter().all(|v| !v.id.is_persisted() && v.price.is_none() && v.stock.is_none()));
    }

    #[test]
    fn test_count_is_product_of_value_counts() {
        let types = vec![vtype("a", "A", &["1", "2", "3"]), vtype("b", "B", &["x", "y"]), vtype("c", "C", &["p", "q", "r", "s"])];
        let out = generate_variations(&types, &[]);
        assert_eq!(out.len(), 24);
        let keys: HashSet<_> = out.iter().map(GeneratedVariation::key).collect();
        assert_eq!(keys.len(), 24);
    }

    #[test]
    fn test_invalid_types_and_duplicate_labels_skipped() {
        let types = vec![vtype("c", "Color", &["Red", "Red", " "]), vtype("x", "", &["ignored"]), vtype("s", "Size", &[])];
        let out = generate_variations(&types, &[]);
        assert_eq!(names(&out), vec!["Color: Red"]);
    }

    #[test]
    fn test_idempotent() {
        let types = vec![vtype("c", "Color", &["Red", "Blue"]), vtype("s", "Size", &["M"])];
        let mut first = generate_variations(&types, &[]);
        first[0].price = Some(Decimal::new(1000, 2));
        let second = generate_variations(&types, &first);
        assert_eq!(first, second);
        assert_eq!(generate_variations(&types, &second), second);
    }

    #[test]
    fn test_no_valid_types_keeps_only_persisted() {
        let types = vec![vtype("c", "Color", &["Red"])];
        let mut rows = generate_variations(&types, &[]);
        let saved_id = Uuid::new_v4();
        rows.push(GeneratedVariation { id: Identifier::Persisted(saved_id), ..rows[0].clone() });
        let out = generate_variations(&[vtype("c", "Color", &[" "])], &rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, Identifier::Persisted(saved_id));
    }

    fn saved_types() -> (Vec<VariationType>, Vec<GeneratedVariation>) {
        let color = Uuid::new_v4();
        let size = Uuid::new_v4();
        let mut types = vec![vtype("c", "Color", &["Red", "Blue"]), vtype("s", "Size", &["M"])];
        types[0].attribute_id = Some(color);
        types[1].attribute_id = Some(size);
        for t in types.iter_mut() {
            for v in t.values.iter_mut() { v.value_id = Some(Uuid::new_v4()); }
        }
        let saved = combinations(&types.iter().collect::<Vec<_>>())
            .into_iter()
            .map(|attrs| GeneratedVariation {
                id: Identifier::Persisted(Uuid::new_v4()),
                price: Some(Decimal::new(5000, 2)),
                stock: Some(Stock::Limited(4)),
                ..GeneratedVariation::blank(attrs)
            })
            .collect();
        (types, saved)
    }

    #[test]
    fn test_added_value_keeps_saved_rows() {
        let (mut types, saved) = saved_types();
        types[1].values.push(VariationValue { id: "s-new".into(), value: "L".into(), ..Default::default() });
        let out = generate_variations(&types, &saved);
        assert_eq!(out.len(), 4);
        assert_eq!(&out[..2], &saved[..]);
        assert_eq!(names(&out[2..]), vec!["Color: Red | Size: L", "Color: Blue | Size: L"]);
        assert!(out[2..].iter().all(|v| !v.id.is_persisted()));
    }

    #[test]
    fn test_removed_value_drops_drafts_only() {
        let (mut types, saved) = saved_types();
        types[1].values.push(VariationValue { id: "s-new".into(), value: "L".into(), ..Default::default() });
        let with_drafts = generate_variations(&types, &saved);
        types[0].values.remove(0);
        let out = generate_variations(&types, &with_drafts);
        // both saved rows survive, only the Blue/L draft remains
        assert_eq!(out.len(), 3);
        assert_eq!(&out[..2], &saved[..]);
        assert_eq!(out[2], with_drafts[3]);
    }

    #[test]
    fn test_reused_draft_takes_current_labels() {
        let mut types = vec![vtype("c", "Color", &["Red"]), vtype("s", "Size", &["M"])];
        let mut rows = generate_variations(&types, &[]);
        rows[0].price = Some(Decimal::new(1500, 2));
        let draft_id = rows[0].id.clone();

        types[0].values[0].value = "Crimson".into();
        let renamed = generate_variations(&types, &rows);
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].id, draft_id);
        assert_eq!(renamed[0].price, Some(Decimal::new(1500, 2)));
        assert_eq!(renamed[0].display_name, "Color: Crimson | Size: M");
        assert_eq!(renamed[0].attributes[0].display_name, "Color: Crimson");

        types.swap(0, 1);
        let reordered = generate_variations(&types, &renamed);
        assert_eq!(reordered[0].id, draft_id);
        assert_eq!(reordered[0].display_name, "Size: M | Color: Crimson");
        assert_eq!(reordered[0].attributes[0].attribute, Identifier::Temporary("s".into()));
    }
}
