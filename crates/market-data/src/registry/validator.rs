//! Bar data validation.
//!
//! Checks bars coming out of providers (and bars handed to the backtester):
//! - OHLC invariants (high >= low, open/close between high/low)
//! - Non-negative values
//! - Time ordering within a bar and across a series

use log::warn;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Bar;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - the bar is rejected.
    Hard,
    /// Soft warning - accept the bar but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

/// A bar broke one or more hard invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed: {message}")]
pub struct ValidationFailed {
    pub message: String,
}

/// Why a bar series was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesViolation {
    #[error("bar {index} is not strictly after the previous bar")]
    NonMonotonic { index: usize },

    #[error("bar {index}: {message}")]
    InvalidBar { index: usize, message: String },
}

#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Reject bars with a negative price or volume.
    pub reject_negative_values: bool,
    /// Maximum allowed price value (sanity check).
    pub max_price: Option<Decimal>,
    /// Warn on zero volume.
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_negative_values: true,
            max_price: Some(Decimal::from(1_000_000_000i64)),
            warn_on_zero_volume: false,
        }
    }
}

/// Bar validator.
#[derive(Clone, Debug, Default)]
pub struct BarValidator {
    config: ValidatorConfig,
}

impl BarValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate one bar. Soft issues are logged, hard issues returned.
    pub fn validate(&self, bar: &Bar) -> Result<(), ValidationFailed> {
        let issues = self.issues(bar);

        let hard: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();
        if !hard.is_empty() {
            return Err(ValidationFailed {
                message: hard.join("; "),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!("Bar validation warning for {}: {}", bar.open_time, issue.message);
        }
        Ok(())
    }

    /// Every issue found on `bar`, hard and soft.
    pub fn issues(&self, bar: &Bar) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut hard = |message: String| {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message,
            })
        };

        if bar.high < bar.low {
            hard(format!("High ({}) is less than Low ({})", bar.high, bar.low));
        }
        if bar.open < bar.low || bar.open > bar.high {
            hard(format!(
                "Open ({}) is outside High/Low range ({}-{})",
                bar.open, bar.low, bar.high
            ));
        }
        if bar.close < bar.low || bar.close > bar.high {
            hard(format!(
                "Close ({}) is outside High/Low range ({}-{})",
                bar.close, bar.low, bar.high
            ));
        }
        if self.config.reject_negative_values {
            if bar.low < Decimal::ZERO {
                hard(format!("Negative low price: {}", bar.low));
            }
            if bar.volume < Decimal::ZERO {
                hard(format!("Negative volume: {}", bar.volume));
            }
        }
        if bar.open_time > bar.close_time {
            hard(format!(
                "Open time {} is after close time {}",
                bar.open_time, bar.close_time
            ));
        }

        if let Some(max) = self.config.max_price {
            if bar.high > max {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!("High price ({}) exceeds max threshold ({})", bar.high, max),
                });
            }
        }
        if self.config.warn_on_zero_volume && bar.volume.is_zero() {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero volume".to_string(),
            });
        }

        issues
    }

    /// Validate a whole series: every bar valid, strictly increasing open
    /// times and no bar opening before the previous one closed.
    pub fn validate_series(&self, bars: &[Bar]) -> Result<(), SeriesViolation> {
        for (index, bar) in bars.iter().enumerate() {
            self.validate(bar)
                .map_err(|e| SeriesViolation::InvalidBar {
                    index,
                    message: e.message,
                })?;

            if index > 0 {
                let prev = &bars[index - 1];
                if bar.open_time <= prev.open_time || bar.open_time < prev.close_time {
                    return Err(SeriesViolation::NonMonotonic { index });
                }
            }
        }
        Ok(())
    }

    /// Drop invalid bars, order by open time and keep the first bar of any
    /// overlapping run. Used on provider payloads, which are not trusted.
    pub fn sanitize(&self, mut bars: Vec<Bar>, source: &str) -> Vec<Bar> {
        let before = bars.len();
        bars.retain(|bar| match self.validate(bar) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: dropping bar at {}: {}", source, bar.open_time, e.message);
                false
            }
        });
        bars.sort_by_key(|b| b.open_time);

        let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match out.last() {
                Some(prev) if bar.open_time < prev.close_time => {}
                _ => out.push(bar),
            }
        }

        if out.len() != before {
            warn!("{}: kept {} of {} bars after validation", source, out.len(), before);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn bar_at(hour: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar::new(t(hour), Interval::OneHour, open, high, low, close, dec!(1000))
    }

    #[test]
    fn test_valid_bar() {
        let validator = BarValidator::new();
        let bar = bar_at(0, dec!(100), dec!(110), dec!(95), dec!(105));
        assert!(validator.validate(&bar).is_ok());
    }

    #[test]
    fn test_high_less_than_low_rejected() {
        let validator = BarValidator::new();
        let bar = bar_at(0, dec!(100), dec!(90), dec!(95), dec!(92));

        let err = validator.validate(&bar).unwrap_err();
        assert!(err.message.contains("less than Low"));
    }

    #[test]
    fn test_close_outside_range_rejected() {
        let validator = BarValidator::new();
        let bar = bar_at(0, dec!(100), dec!(110), dec!(95), dec!(120));
        assert!(validator.validate(&bar).is_err());
    }

    #[test]
    fn test_negative_volume_rejected() {
        let validator = BarValidator::new();
        let mut bar = bar_at(0, dec!(100), dec!(110), dec!(95), dec!(105));
        bar.volume = dec!(-1);
        assert!(validator.validate(&bar).is_err());
    }

    #[test]
    fn test_soft_issue_does_not_reject() {
        let validator = BarValidator::with_config(ValidatorConfig {
            warn_on_zero_volume: true,
            ..Default::default()
        });
        let mut bar = bar_at(0, dec!(100), dec!(110), dec!(95), dec!(105));
        bar.volume = Decimal::ZERO;

        assert!(validator.validate(&bar).is_ok());
        assert_eq!(validator.issues(&bar).len(), 1);
    }

    #[test]
    fn test_series_must_be_monotonic() {
        let validator = BarValidator::new();
        let bars = vec![
            bar_at(0, dec!(100), dec!(101), dec!(99), dec!(100)),
            bar_at(2, dec!(100), dec!(101), dec!(99), dec!(100)),
            bar_at(1, dec!(100), dec!(101), dec!(99), dec!(100)),
        ];
        assert_eq!(
            validator.validate_series(&bars),
            Err(SeriesViolation::NonMonotonic { index: 2 })
        );
    }

    #[test]
    fn test_series_reports_invalid_bar_index() {
        let validator = BarValidator::new();
        let bars = vec![
            bar_at(0, dec!(100), dec!(101), dec!(99), dec!(100)),
            bar_at(1, dec!(100), dec!(90), dec!(99), dec!(100)),
        ];
        assert!(matches!(
            validator.validate_series(&bars),
            Err(SeriesViolation::InvalidBar { index: 1, .. })
        ));
    }

    #[test]
    fn test_sanitize_sorts_and_drops() {
        let validator = BarValidator::new();
        let bars = vec![
            bar_at(2, dec!(100), dec!(101), dec!(99), dec!(100)),
            bar_at(0, dec!(100), dec!(101), dec!(99), dec!(100)),
            bar_at(1, dec!(100), dec!(90), dec!(99), dec!(100)),
            bar_at(0, dec!(100), dec!(102), dec!(99), dec!(101)),
        ];

        let clean = validator.sanitize(bars, "TEST");
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].open_time, t(0));
        assert_eq!(clean[1].open_time, t(2));
        assert!(validator.validate_series(&clean).is_ok());
    }
}
