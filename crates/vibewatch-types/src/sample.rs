//! Motion samples and inbound sensor batches

use crate::sanitize::Sanitize;
use serde::{Deserialize, Serialize};

/// Number of motion axes carried by each sample (x, y, z).
pub const AXIS_COUNT: usize = 3;

/// A single tri-axial motion sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    /// Create a sample from its timestamp and axis readings.
    pub fn new(timestamp: i64, axes: [f64; AXIS_COUNT]) -> Self {
        let [x, y, z] = axes;
        Self { timestamp, x, y, z }
    }

    /// Axis readings in axis order.
    pub fn axes(&self) -> [f64; AXIS_COUNT] {
        [self.x, self.y, self.z]
    }
}

impl Sanitize for Sample {
    fn sanitize(&mut self) {
        self.x.sanitize();
        self.y.sanitize();
        self.z.sanitize();
    }
}

/// Batch of raw readings posted by a sensor.
///
/// Each row is expected to carry at least three values; only the first
/// three (x, y, z) are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorBatch {
    pub data: Vec<Vec<f64>>,

    #[serde(default = "default_sensor_id")]
    pub sensor_id: String,
}

fn default_sensor_id() -> String {
    "default".to_string()
}

impl SensorBatch {
    pub fn new(sensor_id: impl Into<String>, data: Vec<Vec<f64>>) -> Self {
        Self {
            data,
            sensor_id: sensor_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_defaults() {
        let batch: SensorBatch = serde_json::from_str(r#"{"data": [[1.0, 2.0, 3.0]]}"#).unwrap();
        assert_eq!(batch.sensor_id, "default");
        assert_eq!(batch.data.len(), 1);
    }

    #[test]
    fn test_sample_sanitize() {
        let sample = Sample::new(7, [f64::NAN, f64::INFINITY, 1.5]).sanitized();
        assert_eq!(sample.axes(), [0.0, 1e10, 1.5]);
        assert_eq!(sample.timestamp, 7);
    }
}
