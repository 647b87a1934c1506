use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use hermes_market_data::{CacheStatus, ProviderStatus};
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Liveness {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    cache: CacheStatus,
    providers: Vec<ProviderStatus>,
}

async fn healthz() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// Cache backend and the provider behind each data kind. A remote cache
/// that stopped answering degrades the status but the service keeps serving.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let cache = state.aggregator.cache().status().await;
    let status = if cache.remote_reachable == Some(false) {
        "degraded"
    } else {
        "ok"
    };
    Json(HealthReport {
        status,
        cache,
        providers: state.aggregator.providers(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(healthz))
        .route("/health", get(health))
}
