//! Ingestion and live-data handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use vibewatch_types::{PredictionResult, SamplesPayload, SensorBatch, StatusSnapshot};

/// Score a batch of sensor samples
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<SensorBatch>, JsonRejection>,
) -> ApiResult<Json<PredictionResult>> {
    let Json(batch) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected malformed sensor batch");
        ApiError::Validation(rejection.body_text())
    })?;

    let sensor_id = batch.sensor_id.clone();
    let result = state.service.ingest(batch).await.map_err(|e| {
        tracing::warn!(sensor_id = %sensor_id, error = %e, "Prediction failed");
        ApiError::from(e)
    })?;

    Ok(Json(result))
}

/// Latest status snapshot
pub async fn realtime_state(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.service.latest_status())
}

/// Buffered samples query params
#[derive(Debug, Deserialize)]
pub struct SamplesQuery {
    pub limit: Option<usize>,
}

/// Most recent buffered samples
pub async fn realtime_samples(
    State(state): State<AppState>,
    Query(query): Query<SamplesQuery>,
) -> Json<SamplesPayload> {
    let limit = query
        .limit
        .unwrap_or(state.config.detection.default_samples_limit);

    Json(SamplesPayload {
        samples: state.service.recent_samples(limit),
    })
}
