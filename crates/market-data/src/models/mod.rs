//! Market data models
//!
//! This module contains the core data types shared by providers, the
//! aggregator and downstream consumers:
//! - `instrument` - Normalized symbol (Instrument)
//! - `bar` - OHLCV bars and their frequency (Bar, Interval)
//! - `indicator` - Technical indicator readings (IndicatorReading)
//! - `news` - Scored headlines (NewsItem, Sentiment)
//! - `snapshot` - The merged per-instrument view (Snapshot, SourceAvailability)
//! - `params` - Provider request parameters (FetchParams)

mod bar;
pub mod indicator;
mod instrument;
mod news;
mod params;
mod snapshot;
mod types;

pub use bar::{Bar, Interval};
pub use indicator::{IndicatorReading, IndicatorValue};
pub use instrument::{Instrument, InvalidInstrument, MAX_SYMBOL_LEN};
pub use news::{mean_sentiment, NewsItem, Sentiment};
pub use params::{FetchParams, DEFAULT_LIMIT};
pub use snapshot::{DataSource, Snapshot, SourceAvailability, Ticker};
pub use types::ProviderId;
