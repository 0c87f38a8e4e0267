//! Sensor reading ingestion with deduplicated threshold alerts
//!
//! ```text
//! IngestionScheduler ─fetch→ ReadingSource
//!        │
//!        └─→ PersistenceGate ─(new)→ ThresholdEvaluator → AlertDispatcher → MessagingGateway
//! ```

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod dispatch;
pub mod gate;
pub mod gateway;
pub mod reading;
pub mod scheduler;
pub mod source;
pub mod storage;
pub mod thresholds;
pub mod util;

pub use reading::{Reading, StoredReading};
