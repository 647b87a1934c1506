use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::indicator::IndicatorReading;
use super::instrument::Instrument;
use super::news::NewsItem;

/// Where a slice of a snapshot came from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Fetched from a live provider (possibly through the cache).
    Live,
    /// Produced by an offline provider selected by configuration.
    Synthetic,
    /// The provider timed out, was rate limited or failed.
    #[default]
    Unavailable,
}

impl DataSource {
    pub fn is_live(self) -> bool {
        self == Self::Live
    }

    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }
}

/// Per-field provenance of a [`Snapshot`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceAvailability {
    pub price: DataSource,
    pub indicators: DataSource,
    pub news: DataSource,
}

impl SourceAvailability {
    pub fn all_live(&self) -> bool {
        self.price.is_live() && self.indicators.is_live() && self.news.is_live()
    }
}

/// Summary of the most recent bar window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub last_price: Decimal,
    pub open_price: Decimal,
    pub change_pct: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub as_of: DateTime<Utc>,
}

impl Ticker {
    /// Derives a ticker from a time-ordered bar window.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;
        let high = bars.iter().map(|b| b.high).max()?;
        let low = bars.iter().map(|b| b.low).min()?;
        let change_pct = if first.open.is_zero() {
            Decimal::ZERO
        } else {
            ((last.close - first.open) / first.open * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        };

        Some(Self {
            last_price: last.close,
            open_price: first.open,
            change_pct,
            high,
            low,
            volume: last.volume,
            as_of: last.close_time,
        })
    }
}

/// Point-in-time view of price, indicator and news data for one instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub instrument: Instrument,
    pub as_of: DateTime<Utc>,
    pub ticker: Option<Ticker>,
    pub bars: Vec<Bar>,
    pub indicators: Vec<IndicatorReading>,
    pub news: Vec<NewsItem>,
    pub availability: SourceAvailability,
}

impl Snapshot {
    pub fn latest_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }
}
