//! Vibewatch Daemon library
//!
//! This module provides the core components for the vibewatch daemon:
//! - REST, WebSocket and SSE handlers
//! - Live-feed broadcaster
//! - Detection service state
//! - Supervised sensor liveness ticker
//! - Server lifecycle management

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod server;
pub mod service;
pub mod simulation;

pub use broadcast::{BroadcastReport, Broadcaster, PersistentSink, Subscription};
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult, TransportError};
pub use scheduler::{LivenessCheck, LivenessTicker};
pub use server::{build_service, Server};
pub use service::DetectionService;
