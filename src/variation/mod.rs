//! Product variations: combination generation and submit-time reconciliation
pub mod generator;
pub mod model;
pub mod reconciler;

pub use generator::{combinations, generate_variations};
pub use model::{AttributePair, CombinationKey, GeneratedVariation, ResolvedPair, VariationInput, VariationType, VariationValue};
pub use reconciler::{reconcile_variations, IdMap};
