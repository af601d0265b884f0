//! Prediction results and the latest-status snapshot

use crate::sanitize::Sanitize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistical features of one axis, in extraction order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisFeatures {
    pub std: f64,
    pub kurtosis: f64,
    pub peak_amplitude: f64,
    pub rms: f64,
    pub peak_to_peak: f64,
}

impl AxisFeatures {
    /// Feature names in extraction order.
    pub const NAMES: [&'static str; 5] = ["std", "kurtosis", "peak_amplitude", "rms", "peak_to_peak"];

    /// Build from a slice laid out in [`AxisFeatures::NAMES`] order.
    ///
    /// Missing trailing values default to zero.
    pub fn from_slice(values: &[f64]) -> Self {
        let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Self {
            std: at(0),
            kurtosis: at(1),
            peak_amplitude: at(2),
            rms: at(3),
            peak_to_peak: at(4),
        }
    }
}

impl Sanitize for AxisFeatures {
    fn sanitize(&mut self) {
        self.std.sanitize();
        self.kurtosis.sanitize();
        self.peak_amplitude.sanitize();
        self.rms.sanitize();
        self.peak_to_peak.sanitize();
    }
}

/// Outcome of scoring one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Debounced anomaly decision
    pub is_anomaly: bool,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Distance from the model mean; `+inf` when the model is degenerate
    pub distance: f64,

    /// Model decision threshold
    pub threshold: f64,

    /// Per-axis features keyed `axis_0`, `axis_1`, ...
    pub feature_values: BTreeMap<String, AxisFeatures>,

    pub timestamp: DateTime<Utc>,
}

impl Sanitize for PredictionResult {
    fn sanitize(&mut self) {
        self.confidence.sanitize();
        self.distance.sanitize();
        self.threshold.sanitize();
        self.feature_values.sanitize();
    }
}

/// Traffic-light summary of the latest prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    #[default]
    Green,
    Yellow,
    Red,
}

impl StatusColor {
    /// Red on a debounced anomaly, yellow when the distance is above
    /// (or within 70% of) the threshold, green otherwise.
    pub fn classify(is_anomaly: bool, distance: f64, threshold: f64) -> Self {
        if is_anomaly {
            StatusColor::Red
        } else if distance > threshold || distance > threshold * 0.7 {
            StatusColor::Yellow
        } else {
            StatusColor::Green
        }
    }
}

/// Latest status exposed to observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub is_anomaly: bool,
    pub confidence: f64,
    pub distance: f64,
    pub threshold: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub status_color: StatusColor,
}

impl StatusSnapshot {
    /// Derive the snapshot for a prediction.
    pub fn from_prediction(result: &PredictionResult) -> Self {
        Self {
            is_anomaly: result.is_anomaly,
            confidence: result.confidence,
            distance: result.distance,
            threshold: result.threshold,
            timestamp: Some(result.timestamp),
            status_color: StatusColor::classify(
                result.is_anomaly,
                result.distance,
                result.threshold,
            ),
        }
        .sanitized()
    }
}

impl Sanitize for StatusSnapshot {
    fn sanitize(&mut self) {
        self.confidence.sanitize();
        self.distance.sanitize();
        self.threshold.sanitize();
    }
}
