//! Provider capabilities and rate limiting configuration.
//!
//! This module defines structures for describing what a market data provider
//! serves, where its data comes from and how it should be rate-limited.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of data a provider serves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Price,
    Indicators,
    News,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Indicators => "indicators",
            Self::News => "news",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a provider talks to a real upstream or fabricates data offline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Live,
    Synthetic,
}

impl ProviderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Synthetic => "synthetic",
        }
    }
}

impl std::str::FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "synthetic" | "offline" | "mock" => Ok(Self::Synthetic),
            other => Err(format!("unknown provider mode '{}'", other)),
        }
    }
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting its quota and getting blocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Upstream requests consumed by one logical fetch.
    pub calls_per_fetch: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            calls_per_fetch: 1,
        }
    }
}

impl RateLimit {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_mode_parse() {
        assert_eq!("LIVE".parse::<ProviderMode>().unwrap(), ProviderMode::Live);
        assert_eq!(
            "offline".parse::<ProviderMode>().unwrap(),
            ProviderMode::Synthetic
        );
        assert!("sometimes".parse::<ProviderMode>().is_err());
    }
}
