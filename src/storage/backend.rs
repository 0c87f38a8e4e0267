//! Storage backend trait definition
//!
//! This module defines the core `ReadingStore` trait that all
//! storage implementations must implement.

use async_trait::async_trait;

use super::error::StorageResult;
use crate::reading::{Reading, StoredReading};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Durable, append-only store of sensor readings
///
/// Readings are never updated or deleted through this trait. Lookups are
/// exact matches on the `(temperature, humidity, timestamp)` triple.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they will be used
/// across async tasks.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Is there already a row with exactly this triple?
    async fn contains(&self, reading: &Reading) -> StorageResult<bool>;

    /// Append a row unconditionally
    async fn insert(&self, reading: &Reading) -> StorageResult<()>;

    /// Insert the reading unless its triple is already stored.
    ///
    /// Returns `true` if a row was created. The default implementation is a
    /// separate check and insert, which is only race-free with a single
    /// writer. Backends that can do this atomically should override it.
    async fn insert_if_absent(&self, reading: &Reading) -> StorageResult<bool> {
        if self.contains(reading).await? {
            return Ok(false);
        }
        self.insert(reading).await?;
        Ok(true)
    }

    /// The reading with the most recent timestamp
    async fn latest(&self) -> StorageResult<Option<StoredReading>>;

    /// Number of stored readings
    async fn count(&self) -> StorageResult<u64>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
