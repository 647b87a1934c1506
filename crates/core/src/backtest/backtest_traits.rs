use async_trait::async_trait;

use super::backtest_model::{BacktestRequest, BacktestRun};
use crate::errors::Result;

/// Trait for backtest service operations
#[async_trait]
pub trait BacktestServiceTrait: Send + Sync {
    async fn run_backtest(&self, request: BacktestRequest) -> Result<BacktestRun>;
}
