//! In-memory storage backend (no persistence)
//!
//! Useful for:
//! - Testing without database dependencies
//! - Dry runs (`"backend": "none"` in the config)
//!
//! All data is lost on restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::backend::{HealthStatus, ReadingStore};
use super::error::StorageResult;
use crate::reading::{Reading, StoredReading};

#[derive(Default)]
struct Rows {
    rows: Vec<StoredReading>,
    keys: HashSet<Reading>,
}

impl Rows {
    fn push(&mut self, reading: &Reading) {
        let id = self.rows.len() as i64 + 1;
        self.keys.insert(reading.clone());
        self.rows.push(StoredReading {
            id,
            reading: reading.clone(),
            inserted_at: Utc::now(),
        });
    }
}

/// In-memory reading store
///
/// Check and insert run under one lock, so `insert_if_absent` is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Rows>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn contains(&self, reading: &Reading) -> StorageResult<bool> {
        Ok(self.inner.lock().await.keys.contains(reading))
    }

    async fn insert(&self, reading: &Reading) -> StorageResult<()> {
        self.inner.lock().await.push(reading);
        Ok(())
    }

    async fn insert_if_absent(&self, reading: &Reading) -> StorageResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.keys.contains(reading) {
            debug!("in-memory store: duplicate reading {reading}");
            return Ok(false);
        }
        inner.push(reading);
        Ok(true)
    }

    async fn latest(&self) -> StorageResult<Option<StoredReading>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .iter()
            .max_by(|a, b| {
                a.reading
                    .timestamp
                    .cmp(&b.reading.timestamp)
                    .then(a.id.cmp(&b.id))
            })
            .cloned())
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.inner.lock().await.rows.len() as u64)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let count = self.count().await?;
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_readings".to_string(), count.to_string()),
            ]),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory store (no-op)");
        Ok(())
    }
}
