//! Integration tests for the read API over a live listener

use std::sync::Arc;

use reqwest::StatusCode;
use sensor_watch::{
    api::{ApiState, CheckResponse, HealthResponse, spawn_api_server},
    config::ApiConfig,
    storage::{ReadingStore, memory::MemoryStore},
    thresholds::ThresholdEvaluator,
};

use crate::helpers::*;

async fn start(store: Arc<MemoryStore>, auth_token: Option<&str>) -> String {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        allow_origin: "http://localhost:3001".to_string(),
        auth_token: auth_token.map(str::to_string),
    };
    let state = ApiState::new(store, ThresholdEvaluator::default());
    let addr = spawn_api_server(config, state).await.unwrap();
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_reports_reading_count() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(&reading("21", "50", "2024-01-01T00:00:00"))
        .await
        .unwrap();
    let base = start(store, None).await;

    let response = reqwest::get(format!("{base}/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.storage.healthy);
    assert_eq!(health.storage.readings, 1);
    assert_eq!(
        health.storage.metadata.get("backend").map(String::as_str),
        Some("memory")
    );
}

#[tokio::test]
async fn test_latest_reading_not_found_when_empty() {
    let base = start(Arc::new(MemoryStore::new()), None).await;

    let response = reqwest::get(format!("{base}/api/v1/readings/latest"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_latest_reading_keeps_decimal_text() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(&reading("21.50", "49.0", "2024-01-01T00:00:00"))
        .await
        .unwrap();
    let base = start(store, None).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/v1/readings/latest"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["temperature"], "21.50");
    assert_eq!(body["humidity"], "49.0");
    assert_eq!(body["timestamp"], "2024-01-01T00:00:00");
}

#[tokio::test]
async fn test_check_lists_alerts_without_sending() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(&reading("42.5", "35", "2024-01-01T00:00:00"))
        .await
        .unwrap();
    let base = start(store, None).await;

    let check: CheckResponse = reqwest::get(format!("{base}/api/v1/check"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(check.high_temperature.len(), 1);
    assert_eq!(check.humidity.len(), 1);
    assert!(check.high_temperature[0].contains("42.5 °C"));
}

#[tokio::test]
async fn test_auth_token_required() {
    let base = start(Arc::new(MemoryStore::new()), Some("secret")).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{base}/api/v1/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .get(format!("{base}/api/v1/health"))
        .bearer_auth("nope")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = client
        .get(format!("{base}/api/v1/health"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_only_configured_origin() {
    let base = start(Arc::new(MemoryStore::new()), None).await;
    let client = reqwest::Client::new();

    let dashboard = client
        .get(format!("{base}/api/v1/health"))
        .header("Origin", "http://localhost:3001")
        .send()
        .await
        .unwrap();
    assert_eq!(
        dashboard
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3001")
    );

    let other = client
        .get(format!("{base}/api/v1/health"))
        .header("Origin", "http://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert!(other.headers().get("access-control-allow-origin").is_none());
}
