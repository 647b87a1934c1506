//! Market data configuration: provider mode, endpoints, credentials, quotas,
//! cache lifetimes and the aggregator deadline.
//!
//! The server fills this from the environment; tests build it directly.

use std::time::Duration;

use thiserror::Error;

use crate::provider::{alpha_vantage, binance, news_api, ProviderMode};
use crate::registry::DEFAULT_REQUESTS_PER_MINUTE;
use crate::sentiment::{DEFAULT_NEGATIVE, DEFAULT_POSITIVE};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing credential for {provider}: set {variable}")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct MarketDataConfig {
    pub mode: ProviderMode,

    pub binance_base_url: String,
    pub alpha_vantage_base_url: String,
    pub news_api_base_url: String,

    pub alpha_vantage_api_key: Option<String>,
    pub news_api_key: Option<String>,

    pub binance_quota_per_minute: u32,
    pub alpha_vantage_quota_per_minute: u32,
    pub news_api_quota_per_minute: u32,

    pub price_ttl: Duration,
    pub indicator_ttl: Duration,
    pub news_ttl: Duration,

    /// `None` keeps the cache in-process.
    pub redis_url: Option<String>,

    /// Per-adapter deadline inside the aggregator.
    pub fetch_timeout: Duration,

    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            mode: ProviderMode::Live,
            binance_base_url: binance::DEFAULT_BASE_URL.to_string(),
            alpha_vantage_base_url: alpha_vantage::DEFAULT_BASE_URL.to_string(),
            news_api_base_url: news_api::DEFAULT_BASE_URL.to_string(),
            alpha_vantage_api_key: None,
            news_api_key: None,
            binance_quota_per_minute: 1200,
            // Free tier: 5 calls/min
            alpha_vantage_quota_per_minute: 5,
            news_api_quota_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            price_ttl: Duration::from_secs(30),
            indicator_ttl: Duration::from_secs(300),
            news_ttl: Duration::from_secs(900),
            redis_url: None,
            fetch_timeout: Duration::from_secs(5),
            positive_words: DEFAULT_POSITIVE.iter().map(|w| w.to_string()).collect(),
            negative_words: DEFAULT_NEGATIVE.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl MarketDataConfig {
    /// Offline configuration backed by synthetic providers.
    pub fn synthetic() -> Self {
        Self {
            mode: ProviderMode::Synthetic,
            ..Self::default()
        }
    }

    /// Live mode needs both API keys; every mode needs non-zero quotas and
    /// timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ProviderMode::Live {
            if is_blank(&self.alpha_vantage_api_key) {
                return Err(ConfigError::MissingCredential {
                    provider: "ALPHA_VANTAGE",
                    variable: "HERMES_ALPHA_VANTAGE_API_KEY",
                });
            }
            if is_blank(&self.news_api_key) {
                return Err(ConfigError::MissingCredential {
                    provider: "NEWS_API",
                    variable: "HERMES_NEWS_API_KEY",
                });
            }
        }

        for (field, quota) in [
            ("binance_quota_per_minute", self.binance_quota_per_minute),
            ("alpha_vantage_quota_per_minute", self.alpha_vantage_quota_per_minute),
            ("news_api_quota_per_minute", self.news_api_quota_per_minute),
        ] {
            if quota == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "quota must be at least 1".to_string(),
                });
            }
        }

        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout",
                message: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_requires_keys() {
        let config = MarketDataConfig::default();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingCredential {
                provider: "ALPHA_VANTAGE",
                variable: "HERMES_ALPHA_VANTAGE_API_KEY",
            })
        );

        let config = MarketDataConfig {
            alpha_vantage_api_key: Some("demo".to_string()),
            news_api_key: Some("   ".to_string()),
            ..MarketDataConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential { provider: "NEWS_API", .. })
        ));
    }

    #[test]
    fn test_synthetic_needs_no_keys() {
        assert!(MarketDataConfig::synthetic().validate().is_ok());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let config = MarketDataConfig {
            news_api_quota_per_minute: 0,
            ..MarketDataConfig::synthetic()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "news_api_quota_per_minute", .. })
        ));
    }
}
