//! Signals module - signal model, generator and service.

mod signals_generator;
mod signals_model;
mod signals_service;
mod signals_traits;

pub use signals_generator::generate;
pub use signals_model::{
    FactorWeights, NewsFeed, Recommendation, RiskLevel, Signal, SignalConfig,
};
pub use signals_service::{SignalService, MAX_RECOMMENDATION_SYMBOLS};
pub use signals_traits::SignalServiceTrait;
