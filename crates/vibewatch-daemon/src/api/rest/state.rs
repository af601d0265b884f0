//! Application state for API handlers

use crate::config::DaemonConfig;
use crate::service::DetectionService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Detection service
    pub service: Arc<DetectionService>,

    /// Effective configuration
    pub config: Arc<DaemonConfig>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: Arc<DetectionService>, config: DaemonConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Seconds since the daemon started.
    pub fn uptime_seconds(&self) -> f64 {
        (chrono::Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
