use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use hermes_core::signals::{NewsFeed, Signal, SignalServiceTrait};
use hermes_market_data::Snapshot;
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};

async fn get_signal(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Signal>> {
    let signal = state.signal_service.get_signal(&symbol).await?;
    Ok(Json(signal))
}

async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Snapshot>> {
    let snapshot = state.signal_service.get_snapshot(&symbol).await?;
    Ok(Json(snapshot))
}

async fn get_news(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<NewsFeed>> {
    let feed = state.signal_service.get_news(&symbol).await?;
    Ok(Json(feed))
}

#[derive(Deserialize)]
struct RecommendationsQuery {
    /// Comma-separated; the configured watchlist when absent.
    symbols: Option<String>,
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationsQuery>,
) -> ApiResult<Json<Vec<Signal>>> {
    let symbols: Vec<String> = match query.symbols {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => state.watchlist.clone(),
    };
    let signals = state.signal_service.recommendations(&symbols).await?;
    Ok(Json(signals))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signals/{symbol}", get(get_signal))
        .route("/snapshots/{symbol}", get(get_snapshot))
        .route("/news/{symbol}", get(get_news))
        .route("/recommendations", get(get_recommendations))
}
