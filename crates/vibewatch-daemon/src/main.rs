//! Vibewatch Daemon - live vibration anomaly detection
//!
//! The daemon provides:
//! - Ingestion API for tri-axial sensor batches
//! - Debounced anomaly decisions with adaptive confidence
//! - WebSocket and SSE live feeds
//! - Sensor liveness monitoring with disconnect/reconnect events

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vibewatch_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};

/// Vibewatch Daemon CLI
#[derive(Parser)]
#[command(name = "vibewatchd")]
#[command(about = "Vibewatch Daemon - live vibration anomaly detection", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VIBEWATCH_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "VIBEWATCH_LISTEN_ADDR")]
    listen: Option<String>,

    /// Model file path
    #[arg(short, long, env = "VIBEWATCH_MODEL_PATH")]
    model: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "VIBEWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "VIBEWATCH_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(model) = cli.model {
        config.model.path = model;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
        _ _                       _       _
 __   _(_) |____      ____ _| |_ ___| |__
 \ \ / / | '_ \ \ /\ / / _` | __/ __| '_ \
  \ V /| | |_) \ V  V / (_| | || (__| | | |
   \_/ |_|_.__/ \_/\_/ \__,_|\__\___|_| |_|

  Live vibration anomaly detection
  Version: {}
  Model: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.model.path.display(),
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await
}
