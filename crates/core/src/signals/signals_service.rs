use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use hermes_market_data::aggregator::source_of;
use hermes_market_data::{mean_sentiment, Aggregator, Cache, Instrument, ProviderResult, Snapshot};
use log::debug;

use super::signals_generator::generate;
use super::signals_model::{NewsFeed, Signal, SignalConfig};
use super::signals_traits::SignalServiceTrait;
use crate::errors::{Error, Result};

/// Upper bound on symbols per recommendations request.
pub const MAX_RECOMMENDATION_SYMBOLS: usize = 25;

pub struct SignalService {
    aggregator: Arc<Aggregator>,
    cache: Arc<Cache>,
    config: SignalConfig,
    ttl: Duration,
}

impl SignalService {
    pub fn new(aggregator: Arc<Aggregator>, config: SignalConfig, ttl: Duration) -> Result<Self> {
        config.validate()?;
        Ok(SignalService {
            cache: aggregator.cache().clone(),
            aggregator,
            config,
            ttl,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    fn cache_key(instrument: &Instrument) -> String {
        format!("signal:{}", instrument)
    }

    async fn signal_for(&self, instrument: &Instrument) -> Signal {
        let key = Self::cache_key(instrument);
        if let Some(mut signal) = self.cache.get_json::<Signal>(&key).await {
            debug!("Serving cached signal for {}", instrument);
            signal.cached = true;
            return signal;
        }

        let snapshot = self.aggregator.build_snapshot(instrument).await;
        let signal = generate(&snapshot, &self.config);
        debug!(
            "Generated {} for {} at {:.2} confidence",
            signal.recommendation, instrument, signal.confidence
        );
        if !self.ttl.is_zero() {
            self.cache.set_json(&key, &signal, self.ttl).await;
        }
        signal
    }
}

#[async_trait]
impl SignalServiceTrait for SignalService {
    async fn get_signal(&self, symbol: &str) -> Result<Signal> {
        let instrument = Instrument::parse(symbol)?;
        Ok(self.signal_for(&instrument).await)
    }

    async fn get_snapshot(&self, symbol: &str) -> Result<Snapshot> {
        let instrument = Instrument::parse(symbol)?;
        Ok(self.aggregator.build_snapshot(&instrument).await)
    }

    async fn get_news(&self, symbol: &str) -> Result<NewsFeed> {
        let instrument = Instrument::parse(symbol)?;
        let result = self.aggregator.fetch_news(&instrument).await;
        let source = source_of(&result);
        let items = match result {
            ProviderResult::Available { data, .. } => data,
            ProviderResult::Unavailable(_) => Vec::new(),
        };
        Ok(NewsFeed {
            mean_sentiment: mean_sentiment(&items),
            instrument,
            items,
            source,
        })
    }

    /// Signals for every symbol, strongest conviction first. All symbols are
    /// validated before any data is fetched.
    async fn recommendations(&self, symbols: &[String]) -> Result<Vec<Signal>> {
        let mut seen = HashSet::new();
        let mut instruments = Vec::new();
        for symbol in symbols {
            let instrument = Instrument::parse(symbol)?;
            if seen.insert(instrument.clone()) {
                instruments.push(instrument);
            }
        }

        if instruments.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one symbol is required".to_string(),
            ));
        }
        if instruments.len() > MAX_RECOMMENDATION_SYMBOLS {
            return Err(Error::InvalidRequest(format!(
                "at most {} symbols per request, got {}",
                MAX_RECOMMENDATION_SYMBOLS,
                instruments.len()
            )));
        }

        let mut signals = join_all(instruments.iter().map(|i| self.signal_for(i))).await;
        signals.sort_by(|a, b| {
            b.conviction()
                .partial_cmp(&a.conviction())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Span, TimeZone, Utc};
    use hermes_market_data::models::indicator::RSI;
    use hermes_market_data::{
        Bar, DataKind, DataSource, FetchParams, IndicatorReading, Interval, MarketDataConfig,
        MarketDataError, MarketDataProvider, NewsItem, ProviderAdapter, RateLimiter, RetryPolicy,
        Sentiment,
    };
    use rust_decimal::Decimal;
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    /// Live provider that answers every fetch with the same payload.
    struct Fixed<T> {
        id: &'static str,
        kind: DataKind,
        data: T,
    }

    #[async_trait]
    impl<T> MarketDataProvider for Fixed<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        type Data = T;

        fn id(&self) -> &'static str {
            self.id
        }

        fn kind(&self) -> DataKind {
            self.kind
        }

        async fn fetch(
            &self,
            _instrument: &Instrument,
            _params: &FetchParams,
        ) -> std::result::Result<T, MarketDataError> {
            Ok(self.data.clone())
        }
    }

    fn fixed<T>(
        id: &'static str,
        kind: DataKind,
        data: T,
        cache: &Arc<Cache>,
        limiter: &Arc<RateLimiter>,
    ) -> ProviderAdapter<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        ProviderAdapter::new(
            Arc::new(Fixed { id, kind, data }),
            cache.clone(),
            limiter.clone(),
            Duration::from_secs(60),
            RetryPolicy::default(),
        )
    }

    /// Rising closes, oversold RSI, positive MACD and upbeat headlines, all
    /// from live providers.
    fn live_bullish_service() -> SignalService {
        let instrument = Instrument::parse("BTCUSDT").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let bars: Vec<Bar> = (0..12)
            .map(|i| {
                let px = Decimal::from(100 + i * 2);
                Bar::new(
                    t0 + Span::hours(i),
                    Interval::OneHour,
                    px,
                    px + Decimal::ONE,
                    px - Decimal::ONE,
                    px,
                    Decimal::TEN,
                )
            })
            .collect();
        let as_of = t0 + Span::hours(11);
        let readings = vec![
            IndicatorReading::scalar(instrument.clone(), RSI, as_of, 25.0),
            IndicatorReading::macd(instrument, as_of, 1.2, 0.8, 0.4),
        ];
        let news: Vec<NewsItem> = [Sentiment::Positive, Sentiment::Positive, Sentiment::Neutral]
            .into_iter()
            .map(|sentiment| NewsItem {
                headline: "Upbeat headline".to_string(),
                source: "Wire".to_string(),
                url: None,
                published_at: as_of,
                sentiment,
            })
            .collect();

        let cache = Arc::new(Cache::in_memory());
        let limiter = Arc::new(RateLimiter::new());
        let aggregator = Aggregator::new(
            fixed("FIXED_PRICE", DataKind::Price, bars, &cache, &limiter),
            fixed("FIXED_INDICATORS", DataKind::Indicators, readings, &cache, &limiter),
            fixed("FIXED_NEWS", DataKind::News, news, &cache, &limiter),
            cache,
            Duration::from_secs(5),
        );
        SignalService::new(Arc::new(aggregator), SignalConfig::default(), Duration::from_secs(60))
            .unwrap()
    }

    fn service(ttl: Duration) -> SignalService {
        let aggregator = Aggregator::from_config(
            &MarketDataConfig::synthetic(),
            Arc::new(Cache::in_memory()),
            Arc::new(RateLimiter::new()),
        )
        .unwrap();
        SignalService::new(Arc::new(aggregator), SignalConfig::default(), ttl).unwrap()
    }

    #[tokio::test]
    async fn test_second_signal_is_cached() {
        let service = service(Duration::from_secs(60));

        let first = service.get_signal("btcusdt").await.unwrap();
        let second = service.get_signal("BTCUSDT").await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.recommendation, second.recommendation);
        assert_eq!(first.generated_at, second.generated_at);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_signal_cache() {
        let service = service(Duration::ZERO);
        service.get_signal("ETHUSDT").await.unwrap();
        assert!(!service.get_signal("ETHUSDT").await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_rejected() {
        let service = service(Duration::from_secs(60));
        let err = service.get_signal("not a symbol!").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInstrument(_)));
    }

    #[tokio::test]
    async fn test_recommendations_are_ranked_and_deduplicated() {
        let service = service(Duration::from_secs(60));
        let symbols = vec![
            "BTCUSDT".to_string(),
            "ethusdt".to_string(),
            "AAPL".to_string(),
            "btcusdt".to_string(),
        ];

        let signals = service.recommendations(&symbols).await.unwrap();

        assert_eq!(signals.len(), 3);
        assert!(signals
            .windows(2)
            .all(|w| w[0].conviction() >= w[1].conviction()));
    }

    #[tokio::test]
    async fn test_recommendations_validate_before_fetching() {
        let service = service(Duration::from_secs(60));
        let symbols = vec!["BTCUSDT".to_string(), "???".to_string()];
        assert!(matches!(
            service.recommendations(&symbols).await,
            Err(Error::InvalidInstrument(_))
        ));
        assert!(matches!(
            service.recommendations(&[]).await,
            Err(Error::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_news_feed() {
        let service = service(Duration::from_secs(60));
        let feed = service.get_news("SOLUSDT").await.unwrap();
        assert_eq!(feed.source, DataSource::Synthetic);
        assert!(!feed.items.is_empty());
        assert!(feed.mean_sentiment.is_some());
    }

    #[tokio::test]
    async fn test_all_live_signal_cites_every_factor() {
        let service = live_bullish_service();

        let snapshot = service.get_snapshot("BTCUSDT").await.unwrap();
        assert!(snapshot.availability.all_live());

        let signal = service.get_signal("BTCUSDT").await.unwrap();
        assert!(signal.sources.all_live());
        assert_eq!(signal.recommendation, crate::signals::Recommendation::Buy);
        assert!(signal.rationale.iter().any(|r| r.starts_with("Price momentum up")));
        assert!(signal.rationale.iter().any(|r| r.starts_with("RSI")));
        assert!(signal.rationale.iter().any(|r| r.starts_with("MACD histogram positive")));
        assert!(signal
            .rationale
            .iter()
            .any(|r| r.starts_with("News sentiment positive")));
        assert!(!signal.rationale.iter().any(|r| r.contains("unavailable")));
    }
}
