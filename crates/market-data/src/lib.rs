//! Hermes Market Data Crate
//!
//! This crate fetches price bars, technical indicators and news for an
//! instrument from independent, rate-limited providers and assembles them
//! into one [`Snapshot`].
//!
//! # Overview
//!
//! - Live providers: Binance klines, Alpha Vantage RSI/MACD, NewsAPI
//! - Synthetic providers with the same output shapes, for offline use
//! - Per-provider token-bucket rate limiting
//! - TTL cache in-process or on Redis, degrading to in-process on failure
//! - Concurrent aggregation with a per-adapter deadline
//!
//! # Architecture
//!
//! ```text
//!                      +------------------+
//!                      |    Aggregator    |  (fan-out, per-adapter timeout)
//!                      +------------------+
//!                        /       |       \
//!                       v        v        v
//!               +-----------------------------+
//!               |       ProviderAdapter       |  (cache -> limiter -> retry)
//!               +-----------------------------+
//!                       |        |        |
//!                       v        v        v
//!                   +-------+ +------+ +------+
//!                   | Price | | Ind. | | News |  (live or synthetic)
//!                   +-------+ +------+ +------+
//!                        \       |       /
//!                         v      v      v
//!                      +------------------+
//!                      |     Snapshot     |
//!                      +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Instrument`] - Validated, upper-cased symbol
//! - [`Bar`] - OHLCV bar for one [`Interval`]
//! - [`IndicatorReading`] - RSI scalar or MACD triple at a point in time
//! - [`NewsItem`] - Headline with a lexical [`Sentiment`]
//! - [`Snapshot`] - Everything above plus per-slice [`SourceAvailability`]

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod errors;
pub mod indicators;
pub mod models;
pub mod provider;
pub mod registry;
pub mod sentiment;

// Re-export all public types from models
pub use models::{
    mean_sentiment, Bar, DataSource, FetchParams, IndicatorReading, IndicatorValue, Instrument,
    Interval, InvalidInstrument, NewsItem, ProviderId, Sentiment, Snapshot, SourceAvailability,
    Ticker,
};

pub use aggregator::{Aggregator, ProviderStatus};
pub use cache::{Cache, CacheStatus, CacheStore};
pub use config::{ConfigError, MarketDataConfig};
pub use errors::{CacheError, MarketDataError, RetryClass, RetryPolicy};
pub use indicators::{default_calculators, IndicatorCalculator};
pub use provider::{DataKind, MarketDataProvider, ProviderMode, RateLimit};
pub use registry::{BarValidator, ProviderAdapter, ProviderResult, RateLimiter, UnavailableReason};
pub use sentiment::SentimentScorer;
