//! API shared state

use std::sync::Arc;

use crate::storage::ReadingStore;
use crate::thresholds::ThresholdEvaluator;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ReadingStore>,
    pub evaluator: ThresholdEvaluator,
}

impl ApiState {
    pub fn new(store: Arc<dyn ReadingStore>, evaluator: ThresholdEvaluator) -> Self {
        Self { store, evaluator }
    }
}
