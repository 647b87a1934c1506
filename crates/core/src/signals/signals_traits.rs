use async_trait::async_trait;
use hermes_market_data::Snapshot;

use super::signals_model::{NewsFeed, Signal};
use crate::errors::Result;

/// Trait for signal service operations
#[async_trait]
pub trait SignalServiceTrait: Send + Sync {
    async fn get_signal(&self, symbol: &str) -> Result<Signal>;
    async fn get_snapshot(&self, symbol: &str) -> Result<Snapshot>;
    async fn get_news(&self, symbol: &str) -> Result<NewsFeed>;
    async fn recommendations(&self, symbols: &[String]) -> Result<Vec<Signal>>;
}
