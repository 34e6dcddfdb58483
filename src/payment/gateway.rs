//! Gateway callback payload and verification

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Raw callback fields as posted (form body) or redirected (query string) by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackFields(BTreeMap<String, String>);

impl CallbackFields {
    /// Field value, treating blank values as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// First non-blank value among `keys`, checked in order.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) { self.0.insert(key.into(), value.into()); }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.iter().map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone()))).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of checking a callback with the gateway's rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    pub success: bool,
    pub error: Option<String>,
}

impl Verification {
    pub fn approved() -> Self { Self { success: true, error: None } }
    pub fn declined(error: impl Into<String>) -> Self { Self { success: false, error: Some(error.into()) } }
}

#[async_trait]
pub trait GatewayVerifier: Send + Sync {
    async fn verify(&self, fields: &CallbackFields) -> Result<Verification>;
}

/// Approves on `ProcReturnCode=00` or `Response=Approved`.
#[derive(Debug, Default)]
pub struct ResponseCodeVerifier;

#[async_trait]
impl GatewayVerifier for ResponseCodeVerifier {
    async fn verify(&self, fields: &CallbackFields) -> Result<Verification> {
        let approved = fields.get("ProcReturnCode") == Some("00")
            || fields.get("Response").is_some_and(|r| r.eq_ignore_ascii_case("approved"));
        if approved {
            return Ok(Verification::approved());
        }
        let error = fields.first_of(&["ErrMsg", "mdErrorMsg"]).unwrap_or("PaymentFailed");
        Ok(Verification::declined(error))
    }
}
