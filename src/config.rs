//! Environment configuration

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_NOTIFY_SUBJECT: &str = "storefront.orders.status";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub nats_url: Option<String>,
    pub port: u16,
    /// Overrides the host-derived base for payment redirects.
    pub public_base_url: Option<String>,
    pub notify_subject: String,
}

impl Config {
    /// Read from the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = match get("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {}", raw))?,
            None => DEFAULT_PORT,
        };
        let non_blank = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            database_url,
            nats_url: non_blank("NATS_URL"),
            port,
            public_base_url: non_blank("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            notify_subject: non_blank("NOTIFY_SUBJECT").unwrap_or_else(|| DEFAULT_NOTIFY_SUBJECT.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(c.port, DEFAULT_PORT);
        assert!(c.nats_url.is_none());
        assert_eq!(c.notify_subject, DEFAULT_NOTIFY_SUBJECT);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = config(&[("DATABASE_URL", "x"), ("PUBLIC_BASE_URL", "https://shop.test/"), ("NATS_URL", " ")]).unwrap();
        assert_eq!(c.public_base_url.as_deref(), Some("https://shop.test"));
        assert!(c.nats_url.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        assert!(config(&[]).is_err());
        assert!(config(&[("DATABASE_URL", "x"), ("PORT", "http")]).is_err());
    }
}
