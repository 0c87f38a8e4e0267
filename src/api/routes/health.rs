//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{HealthResponse, StorageHealth},
};

/// GET /api/v1/health
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let health = state.store.health_check().await?;
    let readings = if health.healthy {
        state.store.count().await?
    } else {
        0
    };

    Ok(Json(HealthResponse {
        status: if health.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: StorageHealth {
            healthy: health.healthy,
            message: health.message,
            metadata: health.metadata,
            readings,
        },
    }))
}
