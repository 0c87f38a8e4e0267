//! API response types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::reading::Reading;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: StorageHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHealth {
    pub healthy: bool,
    pub message: String,
    pub readings: u64,
    /// Backend-specific details (backend name, database path, ...)
    pub metadata: HashMap<String, String>,
}

/// Alerts the latest stored reading would raise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub reading: Option<Reading>,
    pub high_temperature: Vec<String>,
    pub humidity: Vec<String>,
}
