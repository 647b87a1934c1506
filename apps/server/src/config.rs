use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use hermes_core::signals::{RiskLevel, SignalConfig};
use hermes_market_data::{ConfigError, MarketDataConfig, ProviderMode};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8088";
const DEFAULT_WATCHLIST: &str = "BTCUSDT,ETHUSDT,AAPL,MSFT,TSLA";

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Empty means any origin.
    pub cors_allow_origins: Vec<String>,
    pub request_timeout: Duration,
    pub market_data: MarketDataConfig,
    pub signal: SignalConfig,
    /// Zero disables signal caching.
    pub signal_ttl: Duration,
    /// Symbols ranked by `/recommendations` when the query names none.
    pub watchlist: Vec<String>,
}

impl Config {
    /// Reads `HERMES_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let defaults = MarketDataConfig::default();

        let market_data = MarketDataConfig {
            mode: parse_or(&get, "HERMES_PROVIDER_MODE", ProviderMode::Live)?,
            binance_base_url: get("HERMES_BINANCE_BASE_URL").unwrap_or(defaults.binance_base_url),
            alpha_vantage_base_url: get("HERMES_ALPHA_VANTAGE_BASE_URL")
                .unwrap_or(defaults.alpha_vantage_base_url),
            news_api_base_url: get("HERMES_NEWS_API_BASE_URL")
                .unwrap_or(defaults.news_api_base_url),
            alpha_vantage_api_key: get("HERMES_ALPHA_VANTAGE_API_KEY"),
            news_api_key: get("HERMES_NEWS_API_KEY"),
            binance_quota_per_minute: parse_or(
                &get,
                "HERMES_BINANCE_QUOTA_PER_MINUTE",
                defaults.binance_quota_per_minute,
            )?,
            alpha_vantage_quota_per_minute: parse_or(
                &get,
                "HERMES_ALPHA_VANTAGE_QUOTA_PER_MINUTE",
                defaults.alpha_vantage_quota_per_minute,
            )?,
            news_api_quota_per_minute: parse_or(
                &get,
                "HERMES_NEWS_API_QUOTA_PER_MINUTE",
                defaults.news_api_quota_per_minute,
            )?,
            price_ttl: secs_or(&get, "HERMES_PRICE_CACHE_TTL_SECS", defaults.price_ttl)?,
            indicator_ttl: secs_or(&get, "HERMES_INDICATOR_CACHE_TTL_SECS", defaults.indicator_ttl)?,
            news_ttl: secs_or(&get, "HERMES_NEWS_CACHE_TTL_SECS", defaults.news_ttl)?,
            redis_url: get("HERMES_REDIS_URL"),
            fetch_timeout: millis_or(&get, "HERMES_FETCH_TIMEOUT_MS", defaults.fetch_timeout)?,
            positive_words: defaults.positive_words,
            negative_words: defaults.negative_words,
        };
        market_data.validate()?;

        let base = SignalConfig::default();
        let risk_level: RiskLevel = parse_or(&get, "HERMES_SIGNAL_RISK_LEVEL", base.risk_level)?;
        let signal = SignalConfig {
            buy_threshold: parse_or(&get, "HERMES_SIGNAL_BUY_THRESHOLD", base.buy_threshold)?,
            sell_threshold: parse_or(&get, "HERMES_SIGNAL_SELL_THRESHOLD", base.sell_threshold)?,
            rsi_oversold: parse_or(&get, "HERMES_SIGNAL_RSI_OVERSOLD", base.rsi_oversold)?,
            rsi_overbought: parse_or(&get, "HERMES_SIGNAL_RSI_OVERBOUGHT", base.rsi_overbought)?,
            risk_level,
            ..base
        };
        signal.validate().map_err(|e| ConfigError::Invalid {
            field: "HERMES_SIGNAL_*",
            message: e.to_string(),
        })?;

        let listen_addr = get("HERMES_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().map_err(|e| ConfigError::Invalid {
            field: "HERMES_LISTEN_ADDR",
            message: format!("{}: {}", listen_addr, e),
        })?;

        Ok(Self {
            listen_addr,
            cors_allow_origins: get("HERMES_CORS_ALLOW_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            request_timeout: millis_or(&get, "HERMES_REQUEST_TIMEOUT_MS", Duration::from_secs(30))?,
            market_data,
            signal,
            signal_ttl: secs_or(&get, "HERMES_SIGNAL_CACHE_TTL_SECS", Duration::from_secs(60))?,
            watchlist: split_list(&get("HERMES_WATCHLIST").unwrap_or_else(|| DEFAULT_WATCHLIST.to_string())),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            field: key,
            message: format!("{:?}: {}", raw, e),
        }),
    }
}

fn secs_or<G>(get: &G, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_secs()).map(Duration::from_secs)
}

fn millis_or<G>(get: &G, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_millis() as u64).map(Duration::from_millis)
}
