//! Client configuration.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:1234/api";
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(4000);
pub const DEFAULT_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings shared by the transports and the controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// How long a line or cart notice stays visible.
    pub notice_ttl: Duration,
    /// Per-request timeout for the HTTP transport. Unset means no timeout.
    pub request_timeout: Option<Duration>,
    /// Buffer size of the sandbox request channel.
    pub channel_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            notice_ttl: DEFAULT_NOTICE_TTL,
            request_timeout: None,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment
    ///
    /// A `.env` file is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("STOREFRONT_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "STOREFRONT_API_URL",
                    value: url.to_string(),
                });
            }
            config.base_url = url.to_string();
        }
        if let Some(ms) = parse::<u64>(&lookup, "STOREFRONT_NOTICE_TTL_MS")? {
            config.notice_ttl = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "STOREFRONT_TIMEOUT_MS")? {
            config.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(buffer) = parse::<usize>(&lookup, "STOREFRONT_CHANNEL_BUFFER")? {
            if buffer == 0 {
                return Err(ConfigError::Invalid {
                    key: "STOREFRONT_CHANNEL_BUFFER",
                    value: buffer.to_string(),
                });
            }
            config.channel_buffer = buffer;
        }
        Ok(config)
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.url("/user/cart"), "http://localhost:1234/api/user/cart");
        assert_eq!(config.notice_ttl, Duration::from_secs(4));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("STOREFRONT_API_URL", "https://shop.example.com/api/"),
            ("STOREFRONT_NOTICE_TTL_MS", "1500"),
            ("STOREFRONT_TIMEOUT_MS", "10000"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://shop.example.com/api");
        assert_eq!(config.notice_ttl, Duration::from_millis(1500));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_lookup(lookup(&[("STOREFRONT_NOTICE_TTL_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "STOREFRONT_NOTICE_TTL_MS",
                value: "soon".into()
            }
        );
        assert!(ClientConfig::from_lookup(lookup(&[("STOREFRONT_CHANNEL_BUFFER", "0")])).is_err());
    }
}
