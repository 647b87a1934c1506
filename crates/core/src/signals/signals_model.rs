use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hermes_market_data::{DataSource, Instrument, NewsItem, SourceAvailability};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }

    pub fn opposes(self, other: Recommendation) -> bool {
        matches!(
            (self, other),
            (Self::Buy, Self::Sell) | (Self::Sell, Self::Buy)
        )
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scales target and stop distances.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn multiplier(self) -> Decimal {
        match self {
            Self::Low => dec!(0.5),
            Self::Medium => Decimal::ONE,
            Self::High => dec!(1.5),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::Configuration(format!(
                "unknown risk level '{}', expected low, medium or high",
                other
            ))),
        }
    }
}

/// Relative weight of each factor in the combined score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub momentum: f64,
    pub indicators: f64,
    pub sentiment: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            momentum: 0.4,
            indicators: 0.35,
            sentiment: 0.25,
        }
    }
}

/// Thresholds and scales used by [`generate`](super::generate).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignalConfig {
    /// Bars spanned by the momentum measure.
    pub momentum_lookback: usize,
    /// Minimum absolute % change for a momentum clause.
    pub momentum_threshold_pct: f64,
    /// % change that maps to a full +/-1 contribution.
    pub momentum_scale_pct: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Minimum absolute mean sentiment for a sentiment clause.
    pub sentiment_threshold: f64,
    pub weights: FactorWeights,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    /// Target distance in % of entry at full conviction and medium risk.
    pub target_pct: Decimal,
    /// Stop distance in % of entry at full conviction and medium risk.
    pub stop_pct: Decimal,
    pub risk_level: RiskLevel,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            momentum_lookback: 10,
            momentum_threshold_pct: 1.0,
            momentum_scale_pct: 5.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            sentiment_threshold: 0.2,
            weights: FactorWeights::default(),
            buy_threshold: 60.0,
            sell_threshold: 40.0,
            target_pct: dec!(5),
            stop_pct: dec!(2.5),
            risk_level: RiskLevel::Medium,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::Configuration(msg));

        if self.momentum_lookback < 2 {
            return invalid("momentum lookback must cover at least 2 bars".to_string());
        }
        if !(self.momentum_scale_pct.is_finite() && self.momentum_scale_pct > 0.0) {
            return invalid("momentum scale must be a positive percentage".to_string());
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return invalid(format!(
                "RSI bounds must satisfy 0 <= oversold < overbought <= 100, got {} / {}",
                self.rsi_oversold, self.rsi_overbought
            ));
        }
        if !(50.0..=100.0).contains(&self.buy_threshold)
            || !(0.0..=50.0).contains(&self.sell_threshold)
        {
            return invalid(format!(
                "buy threshold must be in [50, 100] and sell threshold in [0, 50], got {} / {}",
                self.buy_threshold, self.sell_threshold
            ));
        }
        let weights = [
            self.weights.momentum,
            self.weights.indicators,
            self.weights.sentiment,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return invalid("factor weights must be non-negative with a positive sum".to_string());
        }
        if self.target_pct <= Decimal::ZERO || self.stop_pct <= Decimal::ZERO {
            return invalid("target and stop percentages must be positive".to_string());
        }
        Ok(())
    }
}

/// A directional call for one instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub instrument: Instrument,
    pub recommendation: Recommendation,
    /// Bullishness in [0, 100]; 50 is neutral.
    pub confidence: f64,
    pub entry: Option<Decimal>,
    pub target: Option<Decimal>,
    pub stop: Option<Decimal>,
    pub rationale: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub sources: SourceAvailability,
    #[serde(default)]
    pub cached: bool,
}

impl Signal {
    /// Distance from neutral, in [0, 50].
    pub fn conviction(&self) -> f64 {
        (self.confidence - 50.0).abs()
    }
}

/// Scored headlines for one instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    pub instrument: Instrument,
    pub items: Vec<NewsItem>,
    pub mean_sentiment: Option<f64>,
    pub source: DataSource,
}
