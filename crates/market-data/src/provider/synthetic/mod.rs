//! Offline providers that fabricate structurally valid data.
//!
//! Selected by configuration (`synthetic` provider mode), never as a
//! reaction to a live provider failing. Output is a pure function of the
//! symbol and the requested time grid, so repeated and overlapping requests
//! agree bar for bar.

use std::f64::consts::TAU;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::indicators::{compute_readings, default_calculators, IndicatorCalculator};
use crate::models::{Bar, FetchParams, IndicatorReading, Instrument, Interval, NewsItem};
use crate::provider::{DataKind, MarketDataProvider, ProviderMode};
use crate::sentiment::SentimentScorer;

const PRICE_ID: &str = "SYNTHETIC_PRICE";
const INDICATORS_ID: &str = "SYNTHETIC_INDICATORS";
const NEWS_ID: &str = "SYNTHETIC_NEWS";

/// Extra bars generated so indicators are warm at the start of the window.
const WARM_UP_BARS: usize = 60;
const INDICATOR_READINGS: usize = 10;

/// Reference prices for well-known symbols; everything else starts at 100.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "BTCUSDT" | "BTC-USD" => 50_000.0,
        "ETHUSDT" | "ETH-USD" => 3_500.0,
        "SOLUSDT" => 150.0,
        "AAPL" => 175.0,
        "MSFT" => 410.0,
        "TSLA" => 240.0,
        _ => 100.0,
    }
}

/// 64-bit seed derived from the symbol.
fn symbol_seed(symbol: &str) -> u64 {
    let digest = md5::compute(symbol.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_le_bytes(bytes)
}

/// Start of the grid slot containing `t`.
fn floor_to_interval(t: DateTime<Utc>, interval: Interval) -> DateTime<Utc> {
    let step = interval.minutes() * 60;
    let secs = t.timestamp().div_euclid(step) * step;
    Utc.timestamp_opt(secs, 0).single().unwrap_or(t)
}

fn to_decimal(x: f64) -> Decimal {
    let dp = if x >= 1.0 { 2 } else { 6 };
    Decimal::from_f64(x).unwrap_or_default().round_dp(dp)
}

// ============================================================================
// Price path
// ============================================================================

/// Deterministic price path for one symbol: two slow cycles on a log scale
/// plus per-slot noise.
#[derive(Clone, Debug)]
struct PricePath {
    seed: u64,
    base: f64,
    amp_slow: f64,
    period_slow: f64,
    phase_slow: f64,
    amp_fast: f64,
    period_fast: f64,
    phase_fast: f64,
}

impl PricePath {
    fn for_symbol(symbol: &str) -> Self {
        let seed = symbol_seed(symbol);
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            seed,
            base: base_price(symbol),
            amp_slow: rng.gen_range(0.05..0.15),
            period_slow: rng.gen_range(20.0..60.0) * 86_400.0,
            phase_slow: rng.gen_range(0.0..TAU),
            amp_fast: rng.gen_range(0.01..0.04),
            period_fast: rng.gen_range(1.0..4.0) * 86_400.0,
            phase_fast: rng.gen_range(0.0..TAU),
        }
    }

    fn slot_rng(&self, t: DateTime<Utc>) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ (t.timestamp() as u64).rotate_left(17))
    }

    fn mid(&self, t: DateTime<Utc>) -> f64 {
        let secs = t.timestamp() as f64;
        let noise: f64 = self.slot_rng(t).gen_range(-0.002..0.002);
        let log_offset = self.amp_slow * (TAU * secs / self.period_slow + self.phase_slow).sin()
            + self.amp_fast * (TAU * secs / self.period_fast + self.phase_fast).sin()
            + noise;
        self.base * log_offset.exp()
    }

    fn bar(&self, open_time: DateTime<Utc>, interval: Interval) -> Bar {
        let close_time = open_time + interval.duration();
        let open = self.mid(open_time);
        let close = self.mid(close_time);

        let mut rng = self.slot_rng(open_time + Duration::seconds(1));
        let wick_up: f64 = rng.gen_range(0.0..0.004);
        let wick_down: f64 = rng.gen_range(0.0..0.004);
        let volume: f64 = rng.gen_range(50.0..5_000.0) * (interval.minutes() as f64).sqrt();

        let high = open.max(close) * (1.0 + wick_up);
        let low = open.min(close) * (1.0 - wick_down);

        Bar {
            open_time,
            close_time,
            open: to_decimal(open),
            high: to_decimal(high),
            low: to_decimal(low),
            close: to_decimal(close),
            volume: to_decimal(volume),
        }
    }
}

/// Bars on the interval grid whose open time lies in `[start, end]`, at most
/// `limit` of them (the newest are kept).
pub fn bars_between(
    instrument: &Instrument,
    interval: Interval,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: usize,
) -> Vec<Bar> {
    let path = PricePath::for_symbol(instrument.symbol());
    let step = interval.duration();
    let mut t = floor_to_interval(start, interval);
    if t < start {
        t += step;
    }

    let mut bars = Vec::new();
    while t <= end {
        bars.push(path.bar(t, interval));
        t += step;
    }
    let skip = bars.len().saturating_sub(limit);
    bars.split_off(skip)
}

/// The newest `limit` closed bars as of `now`.
pub fn recent_bars(
    instrument: &Instrument,
    interval: Interval,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Bar> {
    let last_open = floor_to_interval(now, interval) - interval.duration();
    let first_open = last_open - interval.duration() * (limit.max(1) as i32 - 1);
    bars_between(instrument, interval, first_open, last_open, limit)
}

fn window(instrument: &Instrument, params: &FetchParams, extra: usize) -> Vec<Bar> {
    match (params.start, params.end) {
        (Some(start), end) => {
            let now = Utc::now();
            let end = end.map_or(now, |e| e.min(now));
            let lead = params.interval.duration() * extra as i32;
            bars_between(
                instrument,
                params.interval,
                start - lead,
                end,
                params.limit + extra,
            )
        }
        (None, Some(end)) => recent_bars(instrument, params.interval, params.limit + extra, end),
        (None, None) => recent_bars(instrument, params.interval, params.limit + extra, Utc::now()),
    }
}

// ============================================================================
// Providers
// ============================================================================

#[derive(Default)]
pub struct SyntheticPriceProvider;

#[async_trait]
impl MarketDataProvider for SyntheticPriceProvider {
    type Data = Vec<Bar>;

    fn id(&self) -> &'static str {
        PRICE_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::Price
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Synthetic
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<Bar>, MarketDataError> {
        let bars = window(instrument, params, 0);
        if bars.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PRICE_ID.to_string(),
            });
        }
        Ok(bars)
    }
}

pub struct SyntheticIndicatorProvider {
    calculators: Vec<Box<dyn IndicatorCalculator>>,
}

impl Default for SyntheticIndicatorProvider {
    fn default() -> Self {
        Self {
            calculators: default_calculators(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticIndicatorProvider {
    type Data = Vec<IndicatorReading>;

    fn id(&self) -> &'static str {
        INDICATORS_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::Indicators
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Synthetic
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<IndicatorReading>, MarketDataError> {
        let bars = window(instrument, params, WARM_UP_BARS);
        let readings = compute_readings(instrument, &bars, &self.calculators, INDICATOR_READINGS);
        if readings.is_empty() {
            return Err(MarketDataError::NoData {
                provider: INDICATORS_ID.to_string(),
            });
        }
        Ok(readings)
    }
}

const HEADLINES: &[&str] = &[
    "{symbol} shows strong momentum in today's trading session",
    "Analysts upgrade {symbol} price target following strong earnings",
    "Market volatility affects {symbol} trading volume",
    "{symbol} slips as traders book profits after recent run",
    "Regulators weigh new rules that could weigh on {symbol}",
    "{symbol} holds steady ahead of macro data release",
    "Institutional inflows lift {symbol} to a weekly gain",
    "{symbol} extends decline amid broader risk-off mood",
];

const SOURCES: &[&str] = &["Market Wire", "Daily Ledger", "Tape Reader"];

pub struct SyntheticNewsProvider {
    scorer: SentimentScorer,
}

impl SyntheticNewsProvider {
    pub fn new(scorer: SentimentScorer) -> Self {
        Self { scorer }
    }

    /// Headlines for `instrument` published before `now`. Stable within an hour.
    pub fn headlines(
        &self,
        instrument: &Instrument,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<NewsItem> {
        let hour = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let mut rng =
            StdRng::seed_from_u64(symbol_seed(instrument.symbol()) ^ hour.timestamp() as u64);
        let count = rng.gen_range(3..=5).min(limit);

        (0..count)
            .map(|i| {
                let template = HEADLINES[rng.gen_range(0..HEADLINES.len())];
                let headline = template.replace("{symbol}", instrument.symbol());
                NewsItem {
                    sentiment: self.scorer.score(&headline),
                    headline,
                    source: SOURCES[i % SOURCES.len()].to_string(),
                    url: None,
                    published_at: hour - Duration::hours(i as i64 * 2 + 1),
                }
            })
            .collect()
    }
}

impl Default for SyntheticNewsProvider {
    fn default() -> Self {
        Self::new(SentimentScorer::default())
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticNewsProvider {
    type Data = Vec<NewsItem>;

    fn id(&self) -> &'static str {
        NEWS_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::News
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Synthetic
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<NewsItem>, MarketDataError> {
        let now = params.end.unwrap_or_else(Utc::now);
        Ok(self.headlines(instrument, params.limit, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BarValidator;
    use rust_decimal::prelude::ToPrimitive;

    fn btc() -> Instrument {
        Instrument::parse("BTCUSDT").unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_bars_are_valid_and_ordered() {
        let bars = bars_between(&btc(), Interval::OneHour, at(2024, 1, 1, 0), at(2024, 1, 5, 0), 500);
        assert_eq!(bars.len(), 97);
        assert!(BarValidator::new().validate_series(&bars).is_ok());
    }

    #[test]
    fn test_price_level_tracks_base_price() {
        let bars = bars_between(&btc(), Interval::OneDay, at(2024, 1, 1, 0), at(2024, 3, 1, 0), 100);
        for bar in &bars {
            let close = bar.close.to_f64().unwrap();
            assert!(close > 50_000.0 * 0.7 && close < 50_000.0 * 1.3);
        }
    }

    #[test]
    fn test_overlapping_windows_agree() {
        let a = bars_between(&btc(), Interval::OneHour, at(2024, 1, 1, 0), at(2024, 1, 2, 0), 100);
        let b = bars_between(&btc(), Interval::OneHour, at(2024, 1, 1, 12), at(2024, 1, 3, 0), 100);
        assert_eq!(a[12], b[0]);
        assert_eq!(a.last(), b.get(12));
    }

    #[test]
    fn test_symbols_differ() {
        let eth = Instrument::parse("ETHUSDT").unwrap();
        let a = bars_between(&btc(), Interval::OneHour, at(2024, 1, 1, 0), at(2024, 1, 1, 5), 10);
        let b = bars_between(&eth, Interval::OneHour, at(2024, 1, 1, 0), at(2024, 1, 1, 5), 10);
        assert_ne!(a[0].close, b[0].close);
    }

    #[test]
    fn test_recent_bars_are_closed() {
        let now = at(2024, 6, 1, 10) + Duration::minutes(25);
        let bars = recent_bars(&btc(), Interval::OneHour, 24, now);
        assert_eq!(bars.len(), 24);
        assert_eq!(bars.last().unwrap().close_time, at(2024, 6, 1, 10));
    }

    #[test]
    fn test_headlines_are_stable_within_the_hour() {
        let provider = SyntheticNewsProvider::default();
        let t = at(2024, 6, 1, 10);
        let a = provider.headlines(&btc(), 10, t + Duration::minutes(5));
        let b = provider.headlines(&btc(), 10, t + Duration::minutes(50));
        assert_eq!(a, b);
        assert!((3..=5).contains(&a.len()));
        assert!(a.iter().all(|n| n.headline.contains("BTCUSDT")));
        assert_eq!(provider.headlines(&btc(), 2, t).len(), 2);
    }

    #[tokio::test]
    async fn test_indicator_provider_returns_both_indicators() {
        let provider = SyntheticIndicatorProvider::default();
        let params = FetchParams::recent(Interval::OneHour, 50);
        let readings = provider.fetch(&btc(), &params).await.unwrap();

        assert!(readings.iter().any(|r| r.name == "RSI"));
        assert!(readings.iter().any(|r| r.name == "MACD"));
        assert_eq!(provider.mode(), ProviderMode::Synthetic);
    }
}
