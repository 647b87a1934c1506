//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities, modes and rate limiting configuration
//! - Live providers (Binance, Alpha Vantage, NewsAPI)
//! - Synthetic providers with the same output shapes
//!
//! # Architecture
//!
//! Providers only fetch and normalize. Caching, rate limiting, retries and
//! the never-fail contract live in [`ProviderAdapter`](crate::registry::ProviderAdapter),
//! so a provider can be swapped for its synthetic twin without touching
//! any caller.

mod capabilities;
mod http;
mod traits;

pub mod alpha_vantage;
pub mod binance;
pub mod news_api;
pub mod synthetic;

pub use capabilities::{DataKind, ProviderMode, RateLimit};
pub use traits::{IndicatorProvider, MarketDataProvider, NewsProvider, PriceProvider};
