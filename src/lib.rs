//! Storefront catalog and payment service
//!
//! Backend for a storefront with an admin panel.
//!
//! ## Features
//! - Attribute-based product variations (cartesian combinations of
//!   attribute values, preserved across edits)
//! - Submit-time reconciliation of unsaved attributes and values
//! - Bank payment gateway callback handling
//! - Shopping cart with the `-1` unlimited stock sentinel

pub mod api;
pub mod config;
pub mod domain;
pub mod notify;
pub mod payment;
pub mod store;
pub mod variation;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("attribute \"{label}\" could not be created: {reason}")]
    AttributeCreation { label: String, reason: String },

    #[error("value \"{label}\" could not be created: {reason}")]
    ValueCreation { label: String, reason: String },

    #[error("at least one variation required for a variable product")]
    NoVariations,

    #[error("Invalid stock: {0}")]
    InvalidStock(#[from] domain::value_objects::StockError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Messaging error: {0}")]
    Messaging(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound("record".to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
