//! Local technical indicator calculators.
//!
//! Used by the synthetic indicator provider and by the backtester, which
//! must derive indicators from the bars it has seen so far instead of
//! asking a provider.

mod ema;
mod macd;
mod rsi;

pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;

use num_traits::ToPrimitive;

use crate::models::{Bar, IndicatorReading, IndicatorValue, Instrument};

/// A swappable indicator over a close-price series.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;

    /// Closes needed before the first value is produced.
    fn min_points(&self) -> usize;

    /// One entry per close; `None` while warming up.
    fn calculate(&self, closes: &[f64]) -> Vec<Option<IndicatorValue>>;
}

/// The default calculator set: RSI(14) and MACD(12, 26, 9).
pub fn default_calculators() -> Vec<Box<dyn IndicatorCalculator>> {
    vec![Box::new(Rsi::default()), Box::new(Macd::default())]
}

pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .map(|b| b.close.to_f64().unwrap_or_default())
        .collect()
}

/// Run every calculator over `bars` and keep the newest `keep` values of
/// each, stamped with the close time of the bar they belong to.
pub fn compute_readings(
    instrument: &Instrument,
    bars: &[Bar],
    calculators: &[Box<dyn IndicatorCalculator>],
    keep: usize,
) -> Vec<IndicatorReading> {
    let closes = closes(bars);
    let mut readings = Vec::new();

    for calc in calculators {
        let values = calc.calculate(&closes);
        let produced: Vec<_> = bars
            .iter()
            .zip(values)
            .filter_map(|(bar, value)| Some((bar.close_time, value?)))
            .collect();
        let skip = produced.len().saturating_sub(keep);

        readings.extend(produced.into_iter().skip(skip).map(|(as_of, value)| {
            IndicatorReading {
                instrument: instrument.clone(),
                name: calc.name().to_string(),
                as_of,
                value,
            }
        }));
    }
    readings
}
