//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Ingestion
        .route("/predict", post(handlers::predict))
        // Live data
        .route("/realtime/state", get(handlers::realtime_state))
        .route("/realtime/samples", get(handlers::realtime_samples))
        .route("/realtime/stream", get(handlers::stream_events))
        .route("/ws", get(handlers::websocket))
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::system_status))
        .route("/sensor/status", get(handlers::sensor_status))
        .route("/config", get(handlers::server_config))
        // Simulation
        .route("/test/simulate", post(handlers::simulate_normal))
        .route("/test/anomaly", post(handlers::simulate_anomaly));

    // Web UI
    if let Some(dir) = &state.config.server.static_dir {
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    let router = router.layer(TraceLayer::new_for_http());

    let router = if state.config.server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
