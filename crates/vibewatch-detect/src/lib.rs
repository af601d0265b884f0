//! Vibewatch detection core
//!
//! Runtime pipeline that turns a window of tri-axial samples into a
//! debounced anomaly decision:
//!
//! ```text
//! batch -> validate/sanitize -> features -> distance -> debounce -> confidence
//! ```
//!
//! Also hosts the bounded sample buffer and the sensor liveness state machine.

pub mod batch;
pub mod buffer;
pub mod classifier;
pub mod confidence;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod features;
pub mod monitor;

pub use batch::{timestamp_rows, validate_batch};
pub use buffer::{SampleBuffer, DEFAULT_BUFFER_CAPACITY};
pub use classifier::{DistanceClassifier, ModelParameters, Score, REGULARIZATION};
pub use confidence::{band_confidence, ConfidenceEstimator, DISTANCE_HISTORY};
pub use debounce::Debouncer;
pub use detector::AnomalyDetector;
pub use error::{DetectError, DetectResult};
pub use features::{extract_features, FeatureVector, FEATURES_PER_AXIS};
pub use monitor::ConnectionMonitor;
