//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: errors raised by providers while fetching data
//! - [`CacheError`]: errors raised by a cache backing store
//! - [`RetryClass`] / [`RetryPolicy`]: how transient failures are retried

mod retry;

pub use retry::{retry, RetryClass, RetryPolicy};

use thiserror::Error;

/// Errors that can occur while talking to a market data provider.
///
/// These never leave a provider adapter. The adapter classifies them through
/// [`retry_class`](Self::retry_class), retries the transient ones and turns
/// whatever is left into an unavailable result.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider answered with a 5xx status.
    #[error("Server error: {provider} - HTTP {status}")]
    ServerError {
        /// The provider that failed
        provider: String,
        /// HTTP status code
        status: u16,
    },

    /// The provider rate limited the request (HTTP 429 or an in-body quota note).
    ///
    /// Not retried: the quota window is minutes long, far beyond any backoff.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// A provider-specific error occurred (4xx, API error message in body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("Parse error: {provider} - {message}")]
    Parse {
        /// The provider whose payload was malformed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The provider returned no usable records.
    #[error("No data: {provider}")]
    NoData {
        /// The provider that returned nothing
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// Only timeouts, 5xx responses and connection failures are transient.
    ///
    /// ```
    /// use hermes_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "BINANCE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::RateLimited { provider: "BINANCE".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. } | Self::ServerError { .. } => RetryClass::WithBackoff,

            Self::Network(e) if e.is_timeout() || e.is_connect() => RetryClass::WithBackoff,
            Self::Network(e) => match e.status() {
                Some(status) if status.is_server_error() => RetryClass::WithBackoff,
                _ => RetryClass::Never,
            },

            Self::RateLimited { .. }
            | Self::ProviderError { .. }
            | Self::Parse { .. }
            | Self::NoData { .. } => RetryClass::Never,
        }
    }

    /// Short machine-readable tag, used in unavailability reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::ServerError { .. } => "server_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::ProviderError { .. } => "provider_error",
            Self::Parse { .. } => "parse_error",
            Self::NoData { .. } => "no_data",
            Self::Network(_) => "network",
        }
    }
}

/// Errors from a cache backing store.
///
/// The [`Cache`](crate::cache::Cache) facade absorbs these; callers never see them.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}
