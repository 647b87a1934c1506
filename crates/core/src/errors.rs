//! Core error types for the Hermes signal backend.
//!
//! Provider failures never reach this layer; the aggregator turns them into
//! unavailable slices. What remains are caller mistakes, configuration
//! problems and the rare case where a backtest cannot get any bars at all.

use chrono::{DateTime, Utc};
use hermes_market_data::{ConfigError, InvalidInstrument};
use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid instrument: {0}")]
    InvalidInstrument(#[from] InvalidInstrument),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration value: {0}")]
    Configuration(String),

    #[error("Backtest input rejected: {0}")]
    BacktestInput(#[from] BacktestInputError),

    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Reasons a backtest is rejected. Input errors stop the run before any bar
/// is simulated; `Overflow` stops it at the bar whose arithmetic left the
/// decimal range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BacktestInputError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("bar {index} is out of order or overlaps the previous bar")]
    NonMonotonic { index: usize },

    #[error("bar {index} is invalid: {message}")]
    InvalidBar { index: usize, message: String },

    #[error("initial balance must be positive, got {0}")]
    InvalidBalance(Decimal),

    #[error("start {start} is not before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("{0} overflows the decimal range")]
    Overflow(&'static str),
}
