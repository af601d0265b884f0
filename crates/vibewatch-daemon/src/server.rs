//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::broadcast::Broadcaster;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::scheduler::LivenessTicker;
use crate::service::DetectionService;
use std::sync::Arc;
use tokio::net::TcpListener;
use vibewatch_detect::{AnomalyDetector, ConnectionMonitor, FEATURES_PER_AXIS};
use vibewatch_types::AXIS_COUNT;

/// Feature dimension a model must have to score tri-axial windows.
pub const MODEL_DIMENSION: usize = FEATURES_PER_AXIS * AXIS_COUNT;

/// Vibewatch Daemon Server
pub struct Server {
    config: DaemonConfig,
    service: Arc<DetectionService>,
}

impl Server {
    /// Create a new server, loading the model named by the configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let detector = AnomalyDetector::load(&config.model.path)?;
        Self::with_detector(config, detector)
    }

    /// Create a new server around an already built detector
    pub fn with_detector(config: DaemonConfig, detector: AnomalyDetector) -> DaemonResult<Self> {
        let service = build_service(&config, detector)?;
        Ok(Self { config, service })
    }

    pub fn service(&self) -> &Arc<DetectionService> {
        &self.service
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        // Liveness ticker lives as long as the process
        LivenessTicker::new(self.service.clone(), &self.config.monitor).spawn();

        let app = create_router(AppState::new(self.service.clone(), self.config.clone()));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Vibewatch daemon listening on {}", addr);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Vibewatch daemon shutting down");
        Ok(())
    }
}

/// Wire the detection service from configuration.
pub fn build_service(
    config: &DaemonConfig,
    detector: AnomalyDetector,
) -> DaemonResult<Arc<DetectionService>> {
    let dimension = detector.classifier().dimension();
    if dimension != MODEL_DIMENSION {
        return Err(DaemonError::Config(format!(
            "model has {} features, expected {}",
            dimension, MODEL_DIMENSION
        )));
    }

    let broadcaster = Arc::new(Broadcaster::new(config.broadcast.clone()));
    let monitor = ConnectionMonitor::new(config.monitor.sensor_timeout());

    Ok(Arc::new(DetectionService::new(
        detector,
        config.detection.buffer_capacity,
        monitor,
        broadcaster,
    )))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibewatch_detect::ModelParameters;

    fn identity_model(dim: usize) -> ModelParameters {
        ModelParameters {
            mean: vec![0.0; dim],
            covariance: (0..dim)
                .map(|i| (0..dim).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
            threshold: 3.0,
            model_type: None,
        }
    }

    #[test]
    fn test_rejects_wrong_model_dimension() {
        let detector = AnomalyDetector::from_parameters(identity_model(10)).unwrap();
        let err = Server::with_detector(DaemonConfig::default(), detector)
            .err()
            .expect("dimension mismatch");
        assert!(matches!(err, DaemonError::Config(_)));
    }

    #[test]
    fn test_missing_model_file() {
        let mut config = DaemonConfig::default();
        config.model.path = "/nonexistent/vibewatch/model.json".into();
        assert!(matches!(Server::new(config), Err(DaemonError::Model(_))));
    }

    #[test]
    fn test_loads_model_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            serde_json::to_string(&identity_model(MODEL_DIMENSION)).unwrap(),
        )
        .unwrap();

        let mut config = DaemonConfig::default();
        config.model.path = file.path().to_path_buf();

        let server = Server::new(config).unwrap();
        assert_eq!(server.service().threshold(), 3.0);
    }
}
