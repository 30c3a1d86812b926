// src/config.rs
use std::env;

use crate::services::messaging_service::DEFAULT_FCM_BASE_URL;

pub const CREDENTIALS_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_JSON";
pub const DEFAULT_ORDERS_TOPIC: &str = "orders";

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Raw service account JSON. Only parsed when the first order arrives.
    pub service_account_json: Option<String>,
    pub webhook_secret: Option<String>,
    pub orders_topic: String,
    pub fcm_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            service_account_json: None,
            webhook_secret: None,
            orders_topic: DEFAULT_ORDERS_TOPIC.to_string(),
            fcm_base_url: DEFAULT_FCM_BASE_URL.to_string(),
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_account_json", &self.service_account_json.as_ref().map(|_| "<set>"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<set>"))
            .field("orders_topic", &self.orders_topic)
            .field("fcm_base_url", &self.fcm_base_url)
            .finish()
    }
}

impl AppConfig {
    /// Read settings from the process environment. A `.env` file, when
    /// present, is loaded first.
    ///
    /// Missing credentials are not an error here: the handler reports them on
    /// every request instead, so preflight requests keep working.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", raw, e))?,
            None => defaults.port,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            service_account_json: non_empty(CREDENTIALS_ENV),
            webhook_secret: non_empty("WEBHOOK_SECRET"),
            orders_topic: non_empty("ORDERS_TOPIC").unwrap_or(defaults.orders_topic),
            fcm_base_url: non_empty("FCM_BASE_URL").unwrap_or(defaults.fcm_base_url),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.orders_topic, "orders");
        assert_eq!(config.fcm_base_url, DEFAULT_FCM_BASE_URL);
        assert!(config.service_account_json.is_none());
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("ORDERS_TOPIC", "kitchen"),
            ("WEBHOOK_SECRET", "s3cret"),
            (CREDENTIALS_ENV, "{}"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.orders_topic, "kitchen");
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.service_account_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("WEBHOOK_SECRET", ""),
            (CREDENTIALS_ENV, "   "),
        ]))
        .unwrap();

        assert!(config.webhook_secret.is_none());
        assert!(config.service_account_json.is_none());
    }

    #[test]
    fn test_invalid_port() {
        assert!(AppConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AppConfig {
            webhook_secret: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
