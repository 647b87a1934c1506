use std::sync::Arc;

use hermes_core::backtest::{BacktestConfig, BacktestService, BacktestServiceTrait};
use hermes_core::signals::{SignalService, SignalServiceTrait};
use hermes_market_data::{Aggregator, Cache, RateLimiter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub signal_service: Arc<dyn SignalServiceTrait + Send + Sync>,
    pub backtest_service: Arc<dyn BacktestServiceTrait + Send + Sync>,
    pub watchlist: Vec<String>,
}

pub fn init_tracing() {
    let log_format = std::env::var("HERMES_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cache = Arc::new(Cache::connect(config.market_data.redis_url.as_deref()).await);
    let limiter = Arc::new(RateLimiter::new());
    let aggregator = Arc::new(Aggregator::from_config(
        &config.market_data,
        cache.clone(),
        limiter,
    )?);

    let signal_service = Arc::new(SignalService::new(
        aggregator.clone(),
        config.signal.clone(),
        config.signal_ttl,
    )?);
    let backtest_service = Arc::new(BacktestService::new(
        aggregator.clone(),
        BacktestConfig {
            signal: config.signal.clone(),
            ..BacktestConfig::default()
        },
    )?);

    tracing::info!(
        mode = config.market_data.mode.as_str(),
        cache = cache.backend(),
        "Application state ready"
    );

    Ok(Arc::new(AppState {
        aggregator,
        signal_service,
        backtest_service,
        watchlist: config.watchlist.clone(),
    }))
}
