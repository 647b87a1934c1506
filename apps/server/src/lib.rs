//! Hermes HTTP server: signals, snapshots, news, recommendations and
//! backtests over the market-data aggregator.

pub mod api;
pub mod config;
pub mod error;
mod main_lib;

pub use main_lib::{build_state, init_tracing, AppState};
