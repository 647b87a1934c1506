use std::sync::Arc;

use async_trait::async_trait;
use hermes_market_data::provider::binance;
use hermes_market_data::{Aggregator, FetchParams, Instrument, ProviderResult};
use log::info;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::backtest_engine::run_with_strategy;
use super::backtest_model::{BacktestConfig, BacktestRequest, BacktestRun};
use super::backtest_strategy::SignalStrategy;
use super::backtest_traits::BacktestServiceTrait;
use crate::errors::{BacktestInputError, Error, Result};

/// Longest bar series a single request may replay. Bounded by what one
/// kline request returns, since longer live ranges would come back truncated.
pub const MAX_BACKTEST_BARS: usize = binance::MAX_LIMIT;

pub struct BacktestService {
    aggregator: Arc<Aggregator>,
    defaults: BacktestConfig,
}

impl BacktestService {
    pub fn new(aggregator: Arc<Aggregator>, defaults: BacktestConfig) -> Result<Self> {
        defaults.validate()?;
        Ok(Self {
            aggregator,
            defaults,
        })
    }

    pub fn defaults(&self) -> &BacktestConfig {
        &self.defaults
    }

    fn config_for(&self, request: &BacktestRequest) -> std::result::Result<BacktestConfig, BacktestInputError> {
        let mut config = self.defaults.clone();
        if let Some(interval) = request.interval {
            config.interval = interval;
        }
        if let Some(allow_short) = request.allow_short {
            config.allow_short = allow_short;
        }
        if let Some(risk) = request.risk_per_trade_pct {
            config.risk_per_trade_pct = risk;
        }
        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl BacktestServiceTrait for BacktestService {
    async fn run_backtest(&self, request: BacktestRequest) -> Result<BacktestRun> {
        let instrument = Instrument::parse(&request.symbol)?;
        if request.start >= request.end {
            return Err(BacktestInputError::InvalidRange {
                start: request.start,
                end: request.end,
            }
            .into());
        }
        if request.initial_balance <= Decimal::ZERO {
            return Err(BacktestInputError::InvalidBalance(request.initial_balance).into());
        }
        let config = self.config_for(&request)?;

        let params = FetchParams::range(config.interval, request.start, request.end);
        if params.limit > MAX_BACKTEST_BARS {
            return Err(BacktestInputError::InvalidParameter {
                name: "range",
                message: format!(
                    "spans {} {} bars, at most {} allowed",
                    params.limit, config.interval, MAX_BACKTEST_BARS
                ),
            }
            .into());
        }

        let (mut bars, source) = match self.aggregator.fetch_bars(&instrument, &params).await {
            ProviderResult::Available { data, source, .. } => (data, source),
            ProviderResult::Unavailable(reason) => {
                return Err(Error::MarketDataUnavailable(format!(
                    "price history for {}: {}",
                    instrument, reason
                )));
            }
        };
        bars.retain(|b| b.open_time >= request.start && b.open_time <= request.end);

        let mut strategy =
            SignalStrategy::new(instrument.clone(), config.signal.clone(), config.lookback_bars)
                .with_source(source);
        let result = run_with_strategy(&bars, &config, request.initial_balance, &mut strategy)?;

        info!(
            "Backtest {} {} from {} to {}: {} trades, {:.2}% return",
            instrument,
            config.interval,
            request.start,
            request.end,
            result.metrics.trade_count,
            result.metrics.total_return_pct
        );

        Ok(BacktestRun {
            id: Uuid::new_v4(),
            instrument,
            interval: config.interval,
            start: request.start,
            end: request.end,
            result,
        })
    }
}
