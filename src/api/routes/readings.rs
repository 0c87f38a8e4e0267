//! Latest reading endpoints

use axum::{Json, extract::State};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::CheckResponse,
};
use crate::reading::StoredReading;
use crate::thresholds::{describe_humidity_alert, describe_temperature_alert};

/// GET /api/v1/readings/latest
pub async fn latest_reading(State(state): State<ApiState>) -> ApiResult<Json<StoredReading>> {
    state
        .store
        .latest()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no readings stored yet".to_string()))
}

/// GET /api/v1/check
///
/// Evaluates the latest stored reading without dispatching anything.
pub async fn check_latest(State(state): State<ApiState>) -> ApiResult<Json<CheckResponse>> {
    let Some(stored) = state.store.latest().await? else {
        return Ok(Json(CheckResponse {
            reading: None,
            high_temperature: vec![],
            humidity: vec![],
        }));
    };

    let reading = stored.reading;
    let evaluator = &state.evaluator;

    let high_temperature = evaluator
        .is_high_temperature(&reading)
        .then(|| describe_temperature_alert(&reading))
        .into_iter()
        .collect();
    let humidity = evaluator
        .is_high_or_low_humidity(&reading)
        .then(|| describe_humidity_alert(&reading))
        .into_iter()
        .collect();

    Ok(Json(CheckResponse {
        reading: Some(reading),
        high_temperature,
        humidity,
    }))
}
