//! Binance spot klines provider.
//!
//! Serves OHLCV bars from the public `GET /api/v3/klines` endpoint. No API
//! key is needed; the public weight limit is generous but still enforced by
//! the rate limiter.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::errors::MarketDataError;
use crate::models::{Bar, FetchParams, Instrument};
use crate::provider::http::{self, build_client, build_url, get_text};
use crate::provider::{DataKind, MarketDataProvider, RateLimit};
use crate::registry::BarValidator;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const PROVIDER_ID: &str = "BINANCE";
/// Most klines one request returns. The provider does not page, so longer
/// ranges must be rejected by callers.
pub const MAX_LIMIT: usize = 1000;

pub struct BinanceProvider {
    client: Client,
    base_url: String,
    requests_per_minute: u32,
}

// ============================================================================
// Response structures for Binance API
// ============================================================================

/// Error envelope, e.g. `{"code":-1121,"msg":"Invalid symbol."}`.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

// ============================================================================
// BinanceProvider implementation
// ============================================================================

impl BinanceProvider {
    pub fn new(base_url: impl Into<String>, requests_per_minute: u32) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
            requests_per_minute,
        }
    }

    fn query(instrument: &Instrument, params: &FetchParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbol", instrument.symbol().replace(['-', '_', '.'], "")),
            ("interval", params.interval.as_str().to_string()),
            ("limit", params.limit.clamp(1, MAX_LIMIT).to_string()),
        ];
        if let Some(start) = params.start {
            query.push(("startTime", start.timestamp_millis().to_string()));
        }
        if let Some(end) = params.end {
            query.push(("endTime", end.timestamp_millis().to_string()));
        }
        query
    }

    /// Parse a klines payload: an array of positional arrays.
    fn parse_klines(body: &str) -> Result<Vec<Bar>, MarketDataError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| http::parse_error(PROVIDER_ID, e))?;

        let rows = match value {
            Value::Array(rows) => rows,
            other => {
                if let Ok(err) = serde_json::from_value::<ApiError>(other) {
                    return Err(MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("{} ({})", err.msg, err.code),
                    });
                }
                return Err(http::parse_error(PROVIDER_ID, "expected an array of klines"));
            }
        };

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                Self::parse_row(row).ok_or_else(|| {
                    http::parse_error(PROVIDER_ID, format!("malformed kline at row {}", i))
                })
            })
            .collect()
    }

    fn parse_row(row: &Value) -> Option<Bar> {
        let cols = row.as_array()?;
        if cols.len() < 7 {
            return None;
        }
        Some(Bar {
            open_time: Self::parse_millis(&cols[0])?,
            open: Self::parse_decimal(&cols[1])?,
            high: Self::parse_decimal(&cols[2])?,
            low: Self::parse_decimal(&cols[3])?,
            close: Self::parse_decimal(&cols[4])?,
            volume: Self::parse_decimal(&cols[5])?,
            close_time: Self::parse_millis(&cols[6])?,
        })
    }

    fn parse_millis(value: &Value) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(value.as_i64()?).single()
    }

    /// Binance sends prices as strings to keep precision.
    fn parse_decimal(value: &Value) -> Option<Decimal> {
        match value {
            Value::String(s) => Decimal::from_str(s).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        }
    }
}

// ============================================================================
// MarketDataProvider trait implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    type Data = Vec<Bar>;

    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::Price
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit::per_minute(self.requests_per_minute)
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<Bar>, MarketDataError> {
        let url = build_url(
            PROVIDER_ID,
            &self.base_url,
            "/api/v3/klines",
            &Self::query(instrument, params),
        )?;
        let body = get_text(&self.client, PROVIDER_ID, url, None).await?;
        let bars = BarValidator::new().sanitize(Self::parse_klines(&body)?, PROVIDER_ID);

        if bars.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
            });
        }
        debug!("{}: {} bars for {}", PROVIDER_ID, bars.len(), instrument);
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;
    use rust_decimal_macros::dec;

    const KLINES: &str = r#"[
        [1704067200000, "42283.58", "42554.57", "42261.02", "42475.23", "1271.68", 1704070799999, "53957248.97", 47134, "682.57", "28957416.82", "0"],
        [1704070800000, "42475.23", "42775.00", "42431.65", "42613.56", "1196.37", 1704074399999, "51002091.03", 42897, "603.20", "25712860.53", "0"]
    ]"#;

    #[test]
    fn test_parse_klines() {
        let bars = BinanceProvider::parse_klines(KLINES).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, dec!(42283.58));
        assert_eq!(bars[0].close, dec!(42475.23));
        assert_eq!(bars[1].high, dec!(42775.00));
        assert_eq!(bars[0].open_time.timestamp_millis(), 1704067200000);
        assert!(bars[0].close_time < bars[1].open_time);
    }

    #[test]
    fn test_parse_api_error_body() {
        let err = BinanceProvider::parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .unwrap_err();
        match err {
            MarketDataError::ProviderError { message, .. } => {
                assert_eq!(message, "Invalid symbol. (-1121)")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_row() {
        let err = BinanceProvider::parse_klines(r#"[[1704067200000, "oops"]]"#).unwrap_err();
        assert!(matches!(err, MarketDataError::Parse { .. }));
    }

    #[test]
    fn test_query_params() {
        let instrument = Instrument::parse("btc-usdt").unwrap();
        let params = FetchParams::recent(Interval::FourHours, 5000);
        let query = BinanceProvider::query(&instrument, &params);

        assert_eq!(query[0], ("symbol", "BTCUSDT".to_string()));
        assert_eq!(query[1], ("interval", "4h".to_string()));
        assert_eq!(query[2], ("limit", "1000".to_string()));
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_provider_metadata() {
        let provider = BinanceProvider::new(DEFAULT_BASE_URL, 1200);
        assert_eq!(provider.id(), "BINANCE");
        assert_eq!(provider.kind(), DataKind::Price);
        assert_eq!(provider.rate_limit().requests_per_minute, 1200);
    }
}
