use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::reading::Reading;
use crate::storage::{ReadingStore, StorageResult};

/// Exactly-once persistence per distinct reading
#[derive(Clone)]
pub struct PersistenceGate {
    store: Arc<dyn ReadingStore>,
}

impl PersistenceGate {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    /// Store `reading` unless an identical triple is already stored.
    ///
    /// Returns `true` when the reading was newly inserted.
    #[instrument(skip(self), fields(reading = %reading))]
    pub async fn insert_if_new(&self, reading: &Reading) -> StorageResult<bool> {
        let inserted = self.store.insert_if_absent(reading).await?;
        if inserted {
            info!("stored new reading");
        } else {
            debug!("reading already stored");
        }
        Ok(inserted)
    }
}
