//! Strategies decide, bar by bar, what the backtester should do.

use hermes_market_data::indicators::{compute_readings, default_calculators, IndicatorCalculator};
use hermes_market_data::{Bar, DataSource, Instrument, Snapshot, SourceAvailability, Ticker};
use rust_decimal::Decimal;

use crate::signals::{generate, Recommendation, Signal, SignalConfig};

/// What a strategy wants on the current bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub recommendation: Recommendation,
    pub stop: Option<Decimal>,
    pub target: Option<Decimal>,
}

impl Decision {
    pub fn hold() -> Self {
        Self {
            recommendation: Recommendation::Hold,
            stop: None,
            target: None,
        }
    }

    pub fn buy() -> Self {
        Self {
            recommendation: Recommendation::Buy,
            ..Self::hold()
        }
    }

    pub fn sell() -> Self {
        Self {
            recommendation: Recommendation::Sell,
            ..Self::hold()
        }
    }
}

impl From<&Signal> for Decision {
    fn from(signal: &Signal) -> Self {
        Self {
            recommendation: signal.recommendation,
            stop: signal.stop,
            target: signal.target,
        }
    }
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// `history` ends with the bar being decided on; later bars are never
    /// passed in.
    fn decide(&mut self, history: &[Bar]) -> Decision;
}

/// Runs the signal generator over a trailing window, with RSI and MACD
/// computed locally and no news.
pub struct SignalStrategy {
    instrument: Instrument,
    config: SignalConfig,
    calculators: Vec<Box<dyn IndicatorCalculator>>,
    lookback: usize,
    source: DataSource,
}

impl SignalStrategy {
    pub fn new(instrument: Instrument, config: SignalConfig, lookback: usize) -> Self {
        Self {
            instrument,
            config,
            calculators: default_calculators(),
            lookback: lookback.max(2),
            source: DataSource::Live,
        }
    }

    /// Where the replayed bars came from; carried into each snapshot.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn signal_at(&self, history: &[Bar]) -> Option<Signal> {
        let last = history.last()?;
        let window = &history[history.len().saturating_sub(self.lookback)..];
        let indicators = compute_readings(&self.instrument, window, &self.calculators, 1);

        let snapshot = Snapshot {
            instrument: self.instrument.clone(),
            as_of: last.close_time,
            ticker: Ticker::from_bars(window),
            bars: window.to_vec(),
            availability: SourceAvailability {
                price: self.source,
                indicators: if indicators.is_empty() {
                    DataSource::Unavailable
                } else {
                    self.source
                },
                news: DataSource::Unavailable,
            },
            indicators,
            news: Vec::new(),
        };
        Some(generate(&snapshot, &self.config))
    }
}

impl Strategy for SignalStrategy {
    fn name(&self) -> &str {
        "signal"
    }

    fn decide(&mut self, history: &[Bar]) -> Decision {
        self.signal_at(history)
            .map(|s| Decision::from(&s))
            .unwrap_or_else(Decision::hold)
    }
}
