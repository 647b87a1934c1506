//! Snapshot aggregation.
//!
//! [`Aggregator::build_snapshot`] fans out to the price, indicator and news
//! adapters at once, bounds each by the same deadline and assembles whatever
//! came back. A missing slice is recorded in the snapshot's availability; it
//! is never an error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::config::{ConfigError, MarketDataConfig};
use crate::errors::RetryPolicy;
use crate::models::{
    Bar, DataSource, FetchParams, IndicatorReading, Instrument, Interval, NewsItem, Snapshot,
    SourceAvailability, Ticker,
};
use crate::provider::alpha_vantage::AlphaVantageProvider;
use crate::provider::binance::BinanceProvider;
use crate::provider::news_api::NewsApiProvider;
use crate::provider::synthetic::{
    SyntheticIndicatorProvider, SyntheticNewsProvider, SyntheticPriceProvider,
};
use crate::provider::{DataKind, IndicatorProvider, NewsProvider, PriceProvider, ProviderMode};
use crate::registry::{ProviderAdapter, ProviderResult, RateLimiter, UnavailableReason};
use crate::sentiment::SentimentScorer;

/// Headlines requested per snapshot.
pub const NEWS_LIMIT: usize = 10;

/// One adapter as reported on health checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub kind: DataKind,
    pub provider: String,
    pub mode: ProviderMode,
}

pub struct Aggregator {
    price: ProviderAdapter<Vec<Bar>>,
    indicators: ProviderAdapter<Vec<IndicatorReading>>,
    news: ProviderAdapter<Vec<NewsItem>>,
    cache: Arc<Cache>,
    timeout: Duration,
    params: FetchParams,
}

impl Aggregator {
    pub fn new(
        price: ProviderAdapter<Vec<Bar>>,
        indicators: ProviderAdapter<Vec<IndicatorReading>>,
        news: ProviderAdapter<Vec<NewsItem>>,
        cache: Arc<Cache>,
        timeout: Duration,
    ) -> Self {
        Self {
            price,
            indicators,
            news,
            cache,
            timeout,
            params: FetchParams::default(),
        }
    }

    /// Build live or synthetic providers from `config` and wrap each one in
    /// an adapter sharing `cache` and `limiter`.
    pub fn from_config(
        config: &MarketDataConfig,
        cache: Arc<Cache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = SentimentScorer::new(&config.positive_words, &config.negative_words);

        let price: Arc<PriceProvider>;
        let indicators: Arc<IndicatorProvider>;
        let news: Arc<NewsProvider>;
        match config.mode {
            ProviderMode::Live => {
                price = Arc::new(BinanceProvider::new(
                    config.binance_base_url.clone(),
                    config.binance_quota_per_minute,
                ));
                indicators = Arc::new(AlphaVantageProvider::new(
                    config.alpha_vantage_base_url.clone(),
                    config.alpha_vantage_api_key.clone().unwrap_or_default(),
                    config.alpha_vantage_quota_per_minute,
                ));
                news = Arc::new(NewsApiProvider::new(
                    config.news_api_base_url.clone(),
                    config.news_api_key.clone().unwrap_or_default(),
                    config.news_api_quota_per_minute,
                    scorer,
                ));
            }
            ProviderMode::Synthetic => {
                price = Arc::new(SyntheticPriceProvider);
                indicators = Arc::new(SyntheticIndicatorProvider::default());
                news = Arc::new(SyntheticNewsProvider::new(scorer));
            }
        }

        info!(
            "Market data providers: {}, {}, {} ({})",
            price.id(),
            indicators.id(),
            news.id(),
            config.mode.as_str()
        );

        let retry = RetryPolicy::default();
        Ok(Self::new(
            ProviderAdapter::new(price, cache.clone(), limiter.clone(), config.price_ttl, retry.clone()),
            ProviderAdapter::new(
                indicators,
                cache.clone(),
                limiter.clone(),
                config.indicator_ttl,
                retry.clone(),
            ),
            ProviderAdapter::new(news, cache.clone(), limiter, config.news_ttl, retry),
            cache,
            config.fetch_timeout,
        ))
    }

    /// Bar window used for snapshots. Defaults to the latest 100 hourly bars.
    pub fn with_params(mut self, params: FetchParams) -> Self {
        self.params = params;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn providers(&self) -> Vec<ProviderStatus> {
        vec![
            ProviderStatus {
                kind: self.price.kind(),
                provider: self.price.provider_id().to_string(),
                mode: self.price.mode(),
            },
            ProviderStatus {
                kind: self.indicators.kind(),
                provider: self.indicators.provider_id().to_string(),
                mode: self.indicators.mode(),
            },
            ProviderStatus {
                kind: self.news.kind(),
                provider: self.news.provider_id().to_string(),
                mode: self.news.mode(),
            },
        ]
    }

    pub async fn build_snapshot(&self, instrument: &Instrument) -> Snapshot {
        let news_params = news_params(self.params.interval);
        let (price, indicators, news) = tokio::join!(
            self.bounded(DataKind::Price, self.price.fetch(instrument, &self.params)),
            self.bounded(
                DataKind::Indicators,
                self.indicators.fetch(instrument, &self.params)
            ),
            self.bounded(DataKind::News, self.news.fetch(instrument, &news_params)),
        );

        let (bars, price_source) = price.into_parts(Vec::new());
        let (indicators, indicator_source) = indicators.into_parts(Vec::new());
        let (news, news_source) = news.into_parts(Vec::new());

        let availability = SourceAvailability {
            price: price_source,
            indicators: indicator_source,
            news: news_source,
        };
        debug!(
            "Snapshot for {}: {} bars, {} readings, {} headlines ({:?})",
            instrument,
            bars.len(),
            indicators.len(),
            news.len(),
            availability
        );

        Snapshot {
            instrument: instrument.clone(),
            as_of: Utc::now(),
            ticker: Ticker::from_bars(&bars),
            bars,
            indicators,
            news,
            availability,
        }
    }

    /// Bars for an explicit window, bounded by the same deadline.
    pub async fn fetch_bars(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> ProviderResult<Vec<Bar>> {
        self.bounded(DataKind::Price, self.price.fetch(instrument, params))
            .await
    }

    pub async fn fetch_news(&self, instrument: &Instrument) -> ProviderResult<Vec<NewsItem>> {
        let params = news_params(self.params.interval);
        self.bounded(DataKind::News, self.news.fetch(instrument, &params))
            .await
    }

    async fn bounded<T>(
        &self,
        kind: DataKind,
        fut: impl Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} fetch exceeded {:?}, continuing without it", kind, self.timeout);
                ProviderResult::Unavailable(UnavailableReason::Timeout)
            }
        }
    }
}

fn news_params(interval: Interval) -> FetchParams {
    FetchParams::recent(interval, NEWS_LIMIT)
}

/// Source tag for a slice that came back, used by callers that only hold
/// the result.
pub fn source_of<T>(result: &ProviderResult<T>) -> DataSource {
    match result {
        ProviderResult::Available { source, .. } => *source,
        ProviderResult::Unavailable(_) => DataSource::Unavailable,
    }
}
