//! Configuration for vibewatch-daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Detection pipeline configuration
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Sensor liveness monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Live-feed configuration
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Directory served as the web UI fallback
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            static_dir: None,
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON model file
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

/// Detection pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Samples retained for the buffered-samples query
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Samples returned when the query has no limit
    #[serde(default = "default_samples_limit")]
    pub default_samples_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            default_samples_limit: default_samples_limit(),
        }
    }
}

/// Sensor liveness monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Silence after which the sensor is considered disconnected
    #[serde(default = "default_sensor_timeout")]
    pub sensor_timeout_secs: u64,

    /// Period of the liveness ticker
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Pause after a failed ticker cycle
    #[serde(default = "default_failure_backoff")]
    pub failure_backoff_secs: u64,
}

impl MonitorConfig {
    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_secs(self.sensor_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_timeout_secs: default_sensor_timeout(),
            check_interval_secs: default_check_interval(),
            failure_backoff_secs: default_failure_backoff(),
        }
    }
}

/// Live-feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Idle time before a persistent feed is pinged
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    /// Capacity of each streaming subscriber queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound on a single persistent send
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
}

impl BroadcastConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive(),
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/mahalanobis_model.json")
}

fn default_buffer_capacity() -> usize {
    1000
}

fn default_samples_limit() -> usize {
    300
}

fn default_sensor_timeout() -> u64 {
    10
}

fn default_check_interval() -> u64 {
    5
}

fn default_failure_backoff() -> u64 {
    10
}

fn default_keepalive() -> u64 {
    30
}

fn default_queue_capacity() -> usize {
    64
}

fn default_send_timeout() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with VIBEWATCH_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("VIBEWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
