//! Alpha Vantage technical indicator provider.
//!
//! Fetches RSI and MACD from the `RSI` and `MACD` query functions. Each
//! logical fetch costs two API calls, which matters on the free tier
//! (5 calls per minute).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::errors::MarketDataError;
use crate::models::indicator::{MACD, RSI};
use crate::models::{FetchParams, IndicatorReading, Instrument, Interval};
use crate::provider::http::{self, build_client, build_url, get_text};
use crate::provider::{DataKind, MarketDataProvider, RateLimit};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";
const RSI_PERIOD: u32 = 14;
/// Readings kept per indicator.
const MAX_READINGS: usize = 100;

pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: String,
    requests_per_minute: u32,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// Fields Alpha Vantage uses to report problems with HTTP 200.
#[derive(Debug, Default, Deserialize)]
struct ApiNotes {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RsiResponse {
    #[serde(rename = "Technical Analysis: RSI")]
    series: Option<HashMap<String, RsiPoint>>,
    #[serde(flatten)]
    notes: ApiNotes,
}

#[derive(Debug, Deserialize)]
struct RsiPoint {
    #[serde(rename = "RSI")]
    rsi: String,
}

#[derive(Debug, Deserialize)]
struct MacdResponse {
    #[serde(rename = "Technical Analysis: MACD")]
    series: Option<HashMap<String, MacdPoint>>,
    #[serde(flatten)]
    notes: ApiNotes,
}

#[derive(Debug, Deserialize)]
struct MacdPoint {
    #[serde(rename = "MACD")]
    macd: String,
    #[serde(rename = "MACD_Signal")]
    signal: String,
    #[serde(rename = "MACD_Hist")]
    hist: String,
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        requests_per_minute: u32,
    ) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            requests_per_minute,
        }
    }

    /// Alpha Vantage interval name. There is no 4-hour series; hourly is
    /// the closest finer grain.
    fn av_interval(interval: Interval) -> &'static str {
        match interval {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::OneHour | Interval::FourHours => "60min",
            Interval::OneDay => "daily",
        }
    }

    async fn query(
        &self,
        function: &str,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<String, MarketDataError> {
        let mut query = vec![
            ("function", function.to_string()),
            ("symbol", instrument.symbol().to_string()),
            ("interval", Self::av_interval(params.interval).to_string()),
            ("series_type", "close".to_string()),
        ];
        if function == RSI {
            query.push(("time_period", RSI_PERIOD.to_string()));
        }
        query.push(("apikey", self.api_key.clone()));

        let url = build_url(PROVIDER_ID, &self.base_url, "/query", &query)?;
        get_text(&self.client, PROVIDER_ID, url, Some(&self.api_key)).await
    }

    /// Check for API-level errors reported inside a 200 response.
    fn check_api_error(notes: &ApiNotes) -> Result<(), MarketDataError> {
        if let Some(ref msg) = notes.error_message {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        for msg in [&notes.note, &notes.information].into_iter().flatten() {
            let lower = msg.to_ascii_lowercase();
            if lower.contains("call frequency") || lower.contains("rate limit") {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            if lower.contains("premium") || lower.contains("api key") {
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: msg.clone(),
                });
            }
            warn!("Alpha Vantage note: {}", msg);
        }

        Ok(())
    }

    /// Timestamps come as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD HH:MM:SS`.
    fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        Utc.from_local_datetime(&naive).single()
    }

    fn parse_f64(raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Newest `MAX_READINGS` entries, oldest first.
    fn newest<T>(mut points: Vec<(DateTime<Utc>, T)>) -> Vec<(DateTime<Utc>, T)> {
        points.sort_by_key(|(ts, _)| *ts);
        let skip = points.len().saturating_sub(MAX_READINGS);
        points.into_iter().skip(skip).collect()
    }

    fn parse_rsi(
        body: &str,
        instrument: &Instrument,
    ) -> Result<Vec<IndicatorReading>, MarketDataError> {
        let response: RsiResponse =
            serde_json::from_str(body).map_err(|e| http::parse_error(PROVIDER_ID, e))?;
        Self::check_api_error(&response.notes)?;

        let series = response.series.unwrap_or_default();
        let points: Vec<_> = series
            .iter()
            .filter_map(|(ts, p)| Some((Self::parse_timestamp(ts)?, Self::parse_f64(&p.rsi)?)))
            .collect();

        Ok(Self::newest(points)
            .into_iter()
            .map(|(ts, value)| IndicatorReading::scalar(instrument.clone(), RSI, ts, value))
            .collect())
    }

    fn parse_macd(
        body: &str,
        instrument: &Instrument,
    ) -> Result<Vec<IndicatorReading>, MarketDataError> {
        let response: MacdResponse =
            serde_json::from_str(body).map_err(|e| http::parse_error(PROVIDER_ID, e))?;
        Self::check_api_error(&response.notes)?;

        let series = response.series.unwrap_or_default();
        let points: Vec<_> = series
            .iter()
            .filter_map(|(ts, p)| {
                Some((
                    Self::parse_timestamp(ts)?,
                    (
                        Self::parse_f64(&p.macd)?,
                        Self::parse_f64(&p.signal)?,
                        Self::parse_f64(&p.hist)?,
                    ),
                ))
            })
            .collect();

        Ok(Self::newest(points)
            .into_iter()
            .map(|(ts, (line, signal, hist))| {
                IndicatorReading::macd(instrument.clone(), ts, line, signal, hist)
            })
            .collect())
    }
}

// ============================================================================
// MarketDataProvider trait implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    type Data = Vec<IndicatorReading>;

    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::Indicators
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: self.requests_per_minute,
            calls_per_fetch: 2,
        }
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<IndicatorReading>, MarketDataError> {
        let rsi_body = self.query(RSI, instrument, params).await?;
        let mut readings = Self::parse_rsi(&rsi_body, instrument)?;

        let macd_body = self.query(MACD, instrument, params).await?;
        readings.extend(Self::parse_macd(&macd_body, instrument)?);

        if readings.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
            });
        }
        debug!(
            "{}: {} indicator readings for {}",
            PROVIDER_ID,
            readings.len(),
            instrument
        );
        Ok(readings)
    }
}
