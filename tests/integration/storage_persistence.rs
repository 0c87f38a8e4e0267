//! Integration tests for storage persistence
//!
//! Runs the real pipeline against a SQLite file and checks that
//! deduplication survives a restart.

use std::sync::Arc;

use sensor_watch::{
    config::StorageConfig,
    scheduler::TickOutcome,
    storage::{self, ReadingStore, sqlite::SqliteStore},
};
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_dedup_survives_restart() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("sensor.db");
    let hot = reading("42.5", "35", "2024-01-01T00:00:00");

    {
        let store = Arc::new(SqliteStore::new(&db_path).await.unwrap());
        let gateway = Arc::new(RecordingGateway::with_destination("group-1"));
        let scheduler = pipeline(
            Arc::new(ScriptedSource::repeating(hot.clone())),
            store.clone(),
            gateway.clone(),
        );

        assert!(matches!(scheduler.tick().await, TickOutcome::Inserted(_)));
        assert_eq!(gateway.sent_texts().len(), 2);
        store.close().await.unwrap();
    }

    let store = Arc::new(SqliteStore::new(&db_path).await.unwrap());
    let gateway = Arc::new(RecordingGateway::with_destination("group-1"));
    let scheduler = pipeline(
        Arc::new(ScriptedSource::repeating(hot)),
        store.clone(),
        gateway.clone(),
    );

    assert_eq!(scheduler.tick().await, TickOutcome::Duplicate);
    assert!(gateway.sent_texts().is_empty());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_open_from_config() {
    let temp_dir = tempdir().unwrap();
    let config = StorageConfig::Sqlite {
        path: temp_dir.path().join("from_config.db"),
    };

    let store = storage::open(&config).await.unwrap();
    store
        .insert(&reading("21", "50", "2024-01-01T00:00:00"))
        .await
        .unwrap();

    let health = store.health_check().await.unwrap();
    assert!(health.healthy);
    assert_eq!(store.count().await.unwrap(), 1);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_latest_follows_timestamp_not_insertion_order() {
    let temp_dir = tempdir().unwrap();
    let store = SqliteStore::new(temp_dir.path().join("order.db"))
        .await
        .unwrap();

    store
        .insert(&reading("22", "50", "2024-01-01T00:00:06"))
        .await
        .unwrap();
    store
        .insert(&reading("21", "50", "2024-01-01T00:00:03"))
        .await
        .unwrap();

    let latest = store.latest().await.unwrap().unwrap();
    assert_eq!(latest.reading.temperature, "22");
}

#[tokio::test]
async fn test_concurrent_writers_store_one_row() {
    let temp_dir = tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::new(temp_dir.path().join("race.db"))
            .await
            .unwrap(),
    );
    let hot = reading("45", "50", "2024-01-01T00:00:00");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let hot = hot.clone();
        handles.push(tokio::spawn(async move {
            store.insert_if_absent(&hot).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}
