//! Simulation handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use crate::simulation::{simulate_batch, Profile, SIMULATED_SAMPLES};
use axum::{extract::State, Json};
use serde::Serialize;
use vibewatch_types::PredictionResult;

/// Simulation response
#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    pub message: String,
    pub samples_generated: usize,
    pub prediction: PredictionResult,
}

/// Push a batch of normal vibration through the ingestion path
pub async fn simulate_normal(State(state): State<AppState>) -> ApiResult<Json<SimulationResponse>> {
    simulate(&state, Profile::Normal, "Simulated sensor data sent").await
}

/// Push a batch of strong vibration through the ingestion path
pub async fn simulate_anomaly(
    State(state): State<AppState>,
) -> ApiResult<Json<SimulationResponse>> {
    simulate(&state, Profile::Anomalous, "Simulated anomalous sensor data sent").await
}

async fn simulate(
    state: &AppState,
    profile: Profile,
    message: &str,
) -> ApiResult<Json<SimulationResponse>> {
    let batch = simulate_batch(&mut rand::thread_rng(), profile);
    let prediction = state.service.ingest(batch).await?;

    tracing::info!(profile = ?profile, "Simulated batch ingested");

    Ok(Json(SimulationResponse {
        message: message.to_string(),
        samples_generated: SIMULATED_SAMPLES,
        prediction,
    }))
}
