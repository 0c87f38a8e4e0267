//! Failure handling: no tick failure may stop ingestion or leak alerts

use std::sync::Arc;
use std::time::Duration;

use sensor_watch::{
    dispatch::CycleOutcome,
    gateway::FonnteGateway,
    scheduler::{IngestionHandle, TickOutcome},
    source::HttpReadingSource,
    storage::{ReadingStore, memory::MemoryStore},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_upstream_failure_then_recovery() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RecordingGateway::with_destination("group-1"));
    let source = Arc::new(ScriptedSource::new(vec![
        Err("connection refused".to_string()),
        Ok(None),
        Ok(Some(reading("45", "50", "2024-01-01T00:00:00"))),
    ]));
    let scheduler = pipeline(source, store.clone(), gateway.clone());

    assert!(matches!(
        scheduler.tick().await,
        TickOutcome::FetchFailed(_)
    ));
    assert_eq!(scheduler.tick().await, TickOutcome::NoReading);
    assert!(matches!(
        scheduler.tick().await,
        TickOutcome::Inserted(CycleOutcome::Dispatched(_))
    ));

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(gateway.sent_texts().len(), 1);
}

#[tokio::test]
async fn test_malformed_upstream_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sensor/all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RecordingGateway::with_destination("group-1"));
    let source = HttpReadingSource::new(&source_config(format!(
        "{}/api/sensor/all",
        mock_server.uri()
    )))
    .unwrap();
    let scheduler = pipeline(Arc::new(source), store.clone(), gateway.clone());

    assert!(matches!(
        scheduler.tick().await,
        TickOutcome::FetchFailed(_)
    ));
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(gateway.resolutions(), 0);
}

#[tokio::test]
async fn test_unreachable_gateway_does_not_fail_the_tick() {
    let store = Arc::new(MemoryStore::new());
    let gateway = FonnteGateway::new(&gateway_config(
        "http://127.0.0.1:9".to_string(),
        Some(sensor_watch::config::Destination::Target("628".to_string())),
    ))
    .unwrap();
    let scheduler = pipeline(
        Arc::new(ScriptedSource::repeating(reading(
            "42.5",
            "35",
            "2024-01-01T00:00:00",
        ))),
        store.clone(),
        Arc::new(gateway),
    );

    let TickOutcome::Inserted(cycle) = scheduler.tick().await else {
        panic!("reading should have been stored");
    };
    assert_eq!(cycle.sent(), 0);
    assert_eq!(store.count().await.unwrap(), 1);

    // stored despite the failed sends, so the next tick is a plain duplicate
    assert_eq!(scheduler.tick().await, TickOutcome::Duplicate);
}

#[tokio::test]
async fn test_actor_survives_failing_ticks() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(RecordingGateway::with_destination("group-1"));
    let source = Arc::new(ScriptedSource::new(vec![
        Err("timeout".to_string()),
        Err("timeout".to_string()),
        Ok(Some(reading("20", "50", "2024-01-01T00:00:00"))),
    ]));
    let (handle, task) = IngestionHandle::spawn(
        pipeline(source.clone(), store.clone(), gateway),
        Duration::from_secs(3600),
    );

    // the immediate timer tick may run before or between these
    let mut last = handle.tick_now().await.unwrap();
    while matches!(last, TickOutcome::FetchFailed(_)) {
        last = handle.tick_now().await.unwrap();
    }

    assert!(matches!(
        last,
        TickOutcome::Inserted(CycleOutcome::NoAlerts) | TickOutcome::Duplicate
    ));
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(source.calls() >= 3);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
