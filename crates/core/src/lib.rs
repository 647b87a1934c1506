//! Hermes Core - signal generation and backtesting.
//!
//! Sits on top of `hermes-market-data`: the signals module turns aggregated
//! snapshots into BUY/HOLD/SELL calls, and the backtest module replays the
//! same generator over historical bars to score it.

pub mod backtest;
pub mod errors;
pub mod signals;

pub use errors::Error;
pub use errors::Result;
