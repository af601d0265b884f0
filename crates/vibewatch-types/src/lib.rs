//! Vibewatch core types
//!
//! Shared data model for the vibration detection pipeline:
//! - Samples and inbound sensor batches
//! - Prediction results and the latest-status snapshot
//! - Sensor connection state and transition events
//! - Tagged live-feed messages exchanged with observers
//! - Numeric sanitization applied at every trust boundary

pub mod connection;
pub mod messages;
pub mod prediction;
pub mod sample;
pub mod sanitize;

pub use connection::{
    ConnectionEvent, ConnectionPhase, ConnectionState, DisconnectEvent, ReconnectEvent,
    SensorStatusReport,
};
pub use messages::{
    ClientRequest, ConnectedPayload, DisconnectNotice, LiveMessage, PredictionPayload,
    ReconnectNotice, SamplesPayload, StatePayload,
};
pub use prediction::{AxisFeatures, PredictionResult, StatusColor, StatusSnapshot};
pub use sample::{Sample, SensorBatch, AXIS_COUNT};
pub use sanitize::{sanitize_f64, sanitize_f64_or, Sanitize, SAFE_MAGNITUDE};
