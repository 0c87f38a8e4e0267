//! Storage backends for sensor readings
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database, unique index on the value triple
//! - **In-Memory**: No persistence, for tests or dry runs
//!
//! ## Usage
//!
//! ```no_run
//! use sensor_watch::storage::{ReadingStore, sqlite::SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::new("./sensor.db").await?;
//!     println!("{} readings", store.count().await?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

pub use backend::{HealthStatus, ReadingStore};
pub use error::{StorageError, StorageResult};

use crate::config::StorageConfig;

/// Open the store selected by the configuration
pub async fn open(config: &StorageConfig) -> StorageResult<Arc<dyn ReadingStore>> {
    match config {
        StorageConfig::None => {
            info!("using in-memory storage, readings will not survive a restart");
            Ok(Arc::new(memory::MemoryStore::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => Ok(Arc::new(sqlite::SqliteStore::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => Err(StorageError::InvalidConfig(
            "built without the storage-sqlite feature".to_string(),
        )),
    }
}
