//! Health and status handlers

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vibewatch_types::{sanitize_f64, SensorStatusReport, StatusSnapshot};

/// Liveness probe; the sensor firmware expects the literal body `1`
pub async fn health_check() -> &'static str {
    "1"
}

/// System status response
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub api_running: bool,
    pub sensor_connected: bool,
    pub sensor_status: SensorStatusReport,
    pub samples_count: usize,
    pub websocket_clients: usize,
    pub latest_status: StatusSnapshot,
    pub threshold: f64,
    pub version: String,
    pub uptime_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

/// Detailed system status
pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatusResponse> {
    let service = &state.service;
    let sensor_status = service.sensor_status();

    Json(SystemStatusResponse {
        api_running: true,
        sensor_connected: sensor_status.connected,
        sensor_status,
        samples_count: service.samples_count(),
        websocket_clients: service.broadcaster().persistent_count(),
        latest_status: service.latest_status(),
        threshold: sanitize_f64(service.threshold()),
        version: state.version.clone(),
        uptime_seconds: sanitize_f64(state.uptime_seconds()),
        timestamp: Utc::now(),
    })
}

/// Sensor connection report
pub async fn sensor_status(State(state): State<AppState>) -> Json<SensorStatusReport> {
    Json(state.service.sensor_status())
}

/// Server address response
#[derive(Debug, Serialize)]
pub struct ServerConfigResponse {
    pub host: String,
    pub port: u16,
    pub url: String,
}

/// Address the server is reachable at
pub async fn server_config(State(state): State<AppState>) -> Json<ServerConfigResponse> {
    let addr = state.config.server.listen_addr;
    let host = addr.ip().to_string();

    Json(ServerConfigResponse {
        url: format!("http://{}", addr),
        host,
        port: addr.port(),
    })
}
