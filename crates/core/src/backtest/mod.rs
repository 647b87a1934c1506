//! Backtest module - replay a strategy over historical bars and score it.

mod backtest_engine;
mod backtest_ledger;
mod backtest_metrics;
mod backtest_model;
mod backtest_service;
mod backtest_strategy;
mod backtest_traits;

pub use backtest_engine::{run, run_with_strategy};
pub use backtest_ledger::{Ledger, OpenPosition};
pub use backtest_metrics::compute_metrics;
pub use backtest_model::{
    parse_instant, BacktestConfig, BacktestMetrics, BacktestRequest, BacktestResult, BacktestRun,
    EquityPoint, ExitReason, Side, Trade,
};
pub use backtest_service::{BacktestService, MAX_BACKTEST_BARS};
pub use backtest_strategy::{Decision, SignalStrategy, Strategy};
pub use backtest_traits::BacktestServiceTrait;
