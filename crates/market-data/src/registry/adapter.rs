//! Provider adapter: the cache, rate limiter and retry policy wrapped around
//! one provider.
//!
//! Fetch order:
//! 1. cache lookup
//! 2. provider call through the shared retry helper, spending a rate limiter
//!    permit before every attempt (live providers only)
//! 4. write-through to the cache with the adapter's TTL
//!
//! Any failure along the way becomes [`ProviderResult::Unavailable`]; the
//! adapter never returns an error.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{RateLimiter, UnavailableReason};
use crate::cache::Cache;
use crate::errors::{retry, MarketDataError, RetryPolicy};
use crate::models::{DataSource, FetchParams, Instrument, ProviderId};
use crate::provider::{DataKind, MarketDataProvider, ProviderMode};

/// Outcome of [`ProviderAdapter::fetch`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderResult<T> {
    Available {
        data: T,
        source: DataSource,
        cached: bool,
    },
    Unavailable(UnavailableReason),
}

impl<T> ProviderResult<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Data and its source, or `default` flagged unavailable.
    pub fn into_parts(self, default: T) -> (T, DataSource) {
        match self {
            Self::Available { data, source, .. } => (data, source),
            Self::Unavailable(_) => (default, DataSource::Unavailable),
        }
    }
}

pub struct ProviderAdapter<T> {
    provider: Arc<dyn MarketDataProvider<Data = T>>,
    cache: Arc<Cache>,
    limiter: Arc<RateLimiter>,
    ttl: Duration,
    retry: RetryPolicy,
}

impl<T> ProviderAdapter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Wrap `provider`. Registers the provider's quota with `limiter`.
    pub fn new(
        provider: Arc<dyn MarketDataProvider<Data = T>>,
        cache: Arc<Cache>,
        limiter: Arc<RateLimiter>,
        ttl: Duration,
        retry: RetryPolicy,
    ) -> Self {
        if provider.mode() == ProviderMode::Live {
            let id: ProviderId = Cow::Borrowed(provider.id());
            limiter.configure(&id, provider.rate_limit().requests_per_minute);
        }
        Self {
            provider,
            cache,
            limiter,
            ttl,
            retry,
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub fn kind(&self) -> DataKind {
        self.provider.kind()
    }

    pub fn mode(&self) -> ProviderMode {
        self.provider.mode()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn source(&self) -> DataSource {
        match self.provider.mode() {
            ProviderMode::Live => DataSource::Live,
            ProviderMode::Synthetic => DataSource::Synthetic,
        }
    }

    pub fn cache_key(&self, instrument: &Instrument, params: &FetchParams) -> String {
        format!(
            "{}:{}:{}:{}",
            self.provider.kind(),
            self.provider.id(),
            instrument,
            params.cache_fragment()
        )
    }

    /// Spends the permits for one HTTP attempt. A denial is not retryable.
    fn acquire_permit(&self) -> Result<(), MarketDataError> {
        if self.provider.mode() != ProviderMode::Live {
            return Ok(());
        }
        let id: ProviderId = Cow::Borrowed(self.provider.id());
        let cost = self.provider.rate_limit().calls_per_fetch.max(1);
        if self.limiter.try_acquire_n(&id, cost) {
            Ok(())
        } else {
            warn!(provider = self.provider.id(), "quota exhausted, skipping attempt");
            Err(MarketDataError::RateLimited {
                provider: self.provider.id().to_string(),
            })
        }
    }

    pub async fn fetch(&self, instrument: &Instrument, params: &FetchParams) -> ProviderResult<T> {
        let provider_id = self.provider.id();
        let key = self.cache_key(instrument, params);

        if let Some(data) = self.cache.get_json::<T>(&key).await {
            debug!(provider = provider_id, %instrument, "cache hit");
            return ProviderResult::Available {
                data,
                source: self.source(),
                cached: true,
            };
        }

        let result = retry(&self.retry, provider_id, || async move {
            self.acquire_permit()?;
            self.provider.fetch(instrument, params).await
        })
        .await;

        match result {
            Ok(data) => {
                self.cache.set_json(&key, &data, self.ttl).await;
                ProviderResult::Available {
                    data,
                    source: self.source(),
                    cached: false,
                }
            }
            Err(e) => {
                warn!(provider = provider_id, %instrument, error = %e, "provider unavailable");
                ProviderResult::Unavailable(UnavailableReason::from(&e))
            }
        }
    }
}
