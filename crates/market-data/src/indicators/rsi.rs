// Relative Strength Index with Wilder smoothing
use super::IndicatorCalculator;
use crate::models::indicator::RSI;
use crate::models::IndicatorValue;

pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        RSI
    }

    fn min_points(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<IndicatorValue>> {
        if self.period == 0 || closes.len() <= self.period {
            return vec![None; closes.len()];
        }

        let mut results = vec![None; self.period];
        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=self.period {
            let change = closes[i] - closes[i - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let n = self.period as f64;
        let mut avg_gain = gains / n;
        let mut avg_loss = losses / n;
        results.push(Some(IndicatorValue::Scalar {
            value: Self::value(avg_gain, avg_loss),
        }));

        for i in (self.period + 1)..closes.len() {
            let change = closes[i] - closes[i - 1];
            let (gain, loss) = if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            };
            avg_gain = (avg_gain * (n - 1.0) + gain) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss) / n;
            results.push(Some(IndicatorValue::Scalar {
                value: Self::value(avg_gain, avg_loss),
            }));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: &Option<IndicatorValue>) -> f64 {
        match v {
            Some(IndicatorValue::Scalar { value }) => *value,
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let rsi = Rsi::new(14);
        let out = rsi.calculate(&[1.0; 10]);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn test_only_gains_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = Rsi::new(14).calculate(&closes);
        assert_eq!(out.len(), 20);
        assert!(out[13].is_none());
        assert_eq!(scalar(&out[14]), 100.0);
        assert_eq!(scalar(&out[19]), 100.0);
    }

    #[test]
    fn test_only_losses_is_0() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = Rsi::new(14).calculate(&closes);
        assert_eq!(scalar(&out[19]), 0.0);
    }

    #[test]
    fn test_flat_series_is_neutral() {
        let out = Rsi::new(3).calculate(&[5.0; 6]);
        assert_eq!(scalar(&out[5]), 50.0);
    }

    #[test]
    fn test_mixed_series_in_range() {
        let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1];
        let out = Rsi::new(5).calculate(&closes);
        for v in out.iter().skip(5) {
            let x = scalar(v);
            assert!((0.0..=100.0).contains(&x));
        }
    }
}
