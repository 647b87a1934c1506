use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use hermes_server::{api::app_router, build_state, config::Config};
use tower::ServiceExt;

async fn build_test_router() -> Router {
    let vars: HashMap<&str, &str> = [("HERMES_PROVIDER_MODE", "synthetic")].into_iter().collect();
    let config = Config::from_vars(|key| vars.get(key).map(|v| v.to_string())).unwrap();
    let state = build_state(&config).await.unwrap();
    app_router(state, &config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn liveness_and_health() {
    let app = build_test_router().await;

    let (status, body) = send(&app, get("/api/v1/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["backend"], "memory");
    assert_eq!(body["providers"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn signal_for_valid_symbol() {
    let app = build_test_router().await;

    let (status, body) = send(&app, get("/api/v1/signals/btcusdt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instrument"], "BTCUSDT");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
    assert!(["BUY", "HOLD", "SELL"].contains(&body["recommendation"].as_str().unwrap()));
    assert!(!body["rationale"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_symbol_is_rejected_with_400() {
    let app = build_test_router().await;

    let (status, body) = send(&app, get("/api/v1/signals/!!")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_instrument");
    assert!(body["message"].as_str().unwrap().contains("!!"));
}

#[tokio::test]
async fn snapshot_and_news() {
    let app = build_test_router().await;

    let (status, body) = send(&app, get("/api/v1/snapshots/ETHUSDT")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["bars"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, get("/api/v1/news/AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn recommendations_from_query_and_watchlist() {
    let app = build_test_router().await;

    let (status, body) = send(&app, get("/api/v1/recommendations?symbols=BTCUSDT,AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get("/api/v1/recommendations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn backtest_runs_and_rejects_bad_input() {
    let app = build_test_router().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/backtests",
            serde_json::json!({
                "symbol": "BTCUSDT",
                "start": "2024-01-01",
                "end": "2024-03-01",
                "initialBalance": 10000
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instrument"], "BTCUSDT");
    assert!(body["id"].is_string());
    assert!(!body["equityCurve"].as_array().unwrap().is_empty());
    assert!(body["metrics"]["tradeCount"].is_u64());

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/backtests",
            serde_json::json!({
                "symbol": "BTCUSDT",
                "start": "2024-03-01",
                "end": "2024-01-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_backtest_input");
}

#[tokio::test]
async fn malformed_backtest_body_gets_error_json() {
    let app = build_test_router().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/backtests")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"symbol": "BTCUSDT", "start": "#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/backtests")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}
