//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that every live
//! and synthetic provider implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::MarketDataError;
use crate::models::{Bar, FetchParams, IndicatorReading, Instrument, NewsItem};

use super::capabilities::{DataKind, ProviderMode, RateLimit};

/// Trait for market data providers.
///
/// A provider serves exactly one [`DataKind`], expressed through its
/// associated `Data` type. Live and synthetic implementations of the same
/// kind are interchangeable behind a [`ProviderAdapter`](crate::registry::ProviderAdapter).
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use hermes_market_data::provider::{DataKind, MarketDataProvider, RateLimit};
///
/// struct MyNewsProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyNewsProvider {
///     type Data = Vec<NewsItem>;
///
///     fn id(&self) -> &'static str {
///         "MY_NEWS"
///     }
///
///     fn kind(&self) -> DataKind {
///         DataKind::News
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::per_minute(30)
///     }
///
///     // ... implement fetch
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Normalized payload returned by [`fetch`](Self::fetch).
    type Data: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "BINANCE", "ALPHA_VANTAGE", etc.
    /// Used for logging, rate limiting and cache keys.
    fn id(&self) -> &'static str;

    fn kind(&self) -> DataKind;

    fn mode(&self) -> ProviderMode {
        ProviderMode::Live
    }

    /// Rate limiting configuration. Ignored for synthetic providers.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Fetch and normalize data for `instrument`.
    ///
    /// One attempt only; retries are the caller's concern.
    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Self::Data, MarketDataError>;
}

pub type PriceProvider = dyn MarketDataProvider<Data = Vec<Bar>>;
pub type IndicatorProvider = dyn MarketDataProvider<Data = Vec<IndicatorReading>>;
pub type NewsProvider = dyn MarketDataProvider<Data = Vec<NewsItem>>;
