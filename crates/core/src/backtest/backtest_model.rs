use chrono::{DateTime, NaiveDate, Utc};
use hermes_market_data::{Instrument, Interval};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::errors::BacktestInputError;
use crate::signals::SignalConfig;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> Decimal {
        match self {
            Side::Long => Decimal::ONE,
            Side::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitReason {
    /// The strategy turned to the opposite direction.
    Signal,
    StopLoss,
    Target,
    /// Still open when the series ended.
    ForcedLiquidation,
}

/// A closed round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub return_pct: Decimal,
    pub exit_reason: ExitReason,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub total_return_pct: f64,
    pub win_rate_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub trade_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub metrics: BacktestMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Simulation settings.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    /// Bar interval; also sets the Sharpe annualization factor.
    pub interval: Interval,
    /// Share of the balance put at risk per trade, in %.
    pub risk_per_trade_pct: Decimal,
    /// Per-unit risk as % of price when the signal carries no usable stop.
    pub fallback_stop_pct: Decimal,
    pub allow_short: bool,
    /// Trailing bars the signal strategy looks at.
    pub lookback_bars: usize,
    pub signal: SignalConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            interval: Interval::OneDay,
            risk_per_trade_pct: dec!(2),
            fallback_stop_pct: dec!(2),
            allow_short: false,
            lookback_bars: 100,
            signal: SignalConfig::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestInputError> {
        let hundred = Decimal::ONE_HUNDRED;
        if self.risk_per_trade_pct <= Decimal::ZERO || self.risk_per_trade_pct > hundred {
            return Err(BacktestInputError::InvalidParameter {
                name: "riskPerTradePct",
                message: format!("must be in (0, 100], got {}", self.risk_per_trade_pct),
            });
        }
        if self.fallback_stop_pct <= Decimal::ZERO || self.fallback_stop_pct >= hundred {
            return Err(BacktestInputError::InvalidParameter {
                name: "fallbackStopPct",
                message: format!("must be in (0, 100), got {}", self.fallback_stop_pct),
            });
        }
        if self.lookback_bars < 2 {
            return Err(BacktestInputError::InvalidParameter {
                name: "lookbackBars",
                message: "must be at least 2".to_string(),
            });
        }
        self.signal
            .validate()
            .map_err(|e| BacktestInputError::InvalidParameter {
                name: "signal",
                message: e.to_string(),
            })
    }
}

fn default_initial_balance() -> Decimal {
    dec!(10000)
}

/// A backtest as requested over the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub end: DateTime<Utc>,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    #[serde(default)]
    pub interval: Option<Interval>,
    #[serde(default)]
    pub allow_short: Option<bool>,
    #[serde(default)]
    pub risk_per_trade_pct: Option<Decimal>,
}

/// A finished backtest with its run id.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRun {
    pub id: Uuid,
    pub instrument: Instrument,
    pub interval: Interval,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub result: BacktestResult,
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("expected an RFC 3339 timestamp or YYYY-MM-DD date, got {:?}", raw))
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(raw.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_accepts_dates_and_defaults_balance() {
        let request: BacktestRequest = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","start":"2024-01-01","end":"2024-03-01T12:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(request.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(request.end, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(request.initial_balance, dec!(10000));
        assert_eq!(request.interval, None);
    }

    #[test]
    fn test_request_rejects_garbage_dates() {
        let result: Result<BacktestRequest, _> =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","start":"yesterday","end":"2024-03-01"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());

        let config = BacktestConfig {
            risk_per_trade_pct: Decimal::ZERO,
            ..BacktestConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BacktestInputError::InvalidParameter { name: "riskPerTradePct", .. })
        ));
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Long.sign(), Decimal::ONE);
        assert_eq!(Side::Short.sign(), Decimal::NEGATIVE_ONE);
    }
}
