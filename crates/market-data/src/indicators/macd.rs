use super::ema::Ema;
use super::IndicatorCalculator;
use crate::models::indicator::MACD;
use crate::models::IndicatorValue;

/// MACD line (fast EMA − slow EMA), its signal EMA and the histogram.
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        MACD
    }

    /// Slow EMA warm-up plus signal EMA warm-up.
    fn min_points(&self) -> usize {
        self.slow + self.signal - 1
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<IndicatorValue>> {
        let mut fast = Ema::new(self.fast);
        let mut slow = Ema::new(self.slow);
        let mut signal = Ema::new(self.signal);
        let warm_from = self.min_points().saturating_sub(1);

        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let line = fast.update(close) - slow.update(close);
                // The signal EMA only starts once the slow EMA is warm.
                if !slow.is_warm() {
                    return None;
                }
                let sig = signal.update(line);
                (i >= warm_from).then_some(IndicatorValue::Macd {
                    line,
                    signal: sig,
                    histogram: line - sig,
                })
            })
            .collect()
    }
}
