use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use hermes_core::backtest::{BacktestRequest, BacktestRun, BacktestServiceTrait};

use crate::{error::ApiResult, main_lib::AppState};

async fn run_backtest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BacktestRequest>, JsonRejection>,
) -> ApiResult<Json<BacktestRun>> {
    let Json(request) = payload?;
    let run = state.backtest_service.run_backtest(request).await?;
    Ok(Json(run))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/backtests", post(run_backtest))
}
