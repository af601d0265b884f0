//! Anomaly detector
//!
//! Combines the stateless stages (feature extraction, distance scoring) with
//! the stateful ones (debouncing, confidence history). The stateful stages
//! live behind a single lock so concurrent predictions update them in a
//! consistent order.

use crate::classifier::{DistanceClassifier, ModelParameters};
use crate::confidence::ConfidenceEstimator;
use crate::debounce::Debouncer;
use crate::error::{DetectError, DetectResult};
use crate::features::extract_features;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::Path;
use vibewatch_types::{PredictionResult, AXIS_COUNT};

/// Decision history shared by every prediction.
#[derive(Debug, Default)]
struct DetectionHistory {
    debouncer: Debouncer,
    confidence: ConfidenceEstimator,
}

/// Scores windows of samples against a fitted model.
#[derive(Debug)]
pub struct AnomalyDetector {
    classifier: DistanceClassifier,
    history: Mutex<DetectionHistory>,
}

impl AnomalyDetector {
    pub fn new(classifier: DistanceClassifier) -> Self {
        Self {
            classifier,
            history: Mutex::new(DetectionHistory::default()),
        }
    }

    pub fn from_parameters(params: ModelParameters) -> DetectResult<Self> {
        Ok(Self::new(DistanceClassifier::new(params)?))
    }

    /// Load the model file and build a detector over it.
    pub fn load(path: impl AsRef<Path>) -> DetectResult<Self> {
        let path = path.as_ref();
        let params = ModelParameters::load(path)?;
        tracing::info!(
            path = %path.display(),
            dimension = params.dimension(),
            threshold = params.threshold,
            model_type = params.model_type.as_deref().unwrap_or("unspecified"),
            "Loaded detection model"
        );
        Self::from_parameters(params)
    }

    pub fn threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    pub fn classifier(&self) -> &DistanceClassifier {
        &self.classifier
    }

    /// Score a window and fold the outcome into the decision history.
    pub fn predict(&self, window: &[[f64; AXIS_COUNT]]) -> DetectResult<PredictionResult> {
        if window.is_empty() {
            return Err(DetectError::Validation(
                "cannot score an empty window".into(),
            ));
        }

        let features = extract_features(window);
        let score = self.classifier.score(&features.sanitized_values())?;
        let threshold = self.classifier.threshold();

        let (is_anomaly, confidence) = {
            let mut history = self.history.lock();
            let is_anomaly = history.debouncer.push(score.raw_anomaly);
            let confidence = history.confidence.estimate(score.distance, threshold);
            (is_anomaly, confidence)
        };

        tracing::debug!(
            samples = window.len(),
            distance = score.distance,
            raw_anomaly = score.raw_anomaly,
            "Scored window"
        );
        if is_anomaly {
            tracing::info!(
                distance = score.distance,
                threshold,
                confidence,
                "Anomaly detected"
            );
        }

        Ok(PredictionResult {
            is_anomaly,
            confidence,
            distance: score.distance,
            threshold,
            feature_values: features.per_axis(),
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Identity-covariance model centered on the features of `window`.
    fn model_for(window: &[[f64; 3]], threshold: f64) -> ModelParameters {
        let mean = extract_features(window).sanitized_values();
        let dim = mean.len();
        ModelParameters {
            mean,
            covariance: (0..dim)
                .map(|i| (0..dim).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
            threshold,
            model_type: Some("mahalanobis".into()),
        }
    }

    fn normal_window() -> Vec<[f64; 3]> {
        (0..64)
            .map(|i| {
                let t = i as f64 * 0.1;
                [t.sin() * 0.1, t.cos() * 0.1, 9.81 + (t * 2.0).sin() * 0.05]
            })
            .collect()
    }

    fn violent_window() -> Vec<[f64; 3]> {
        (0..64)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                [sign * 50.0, -sign * 40.0, 9.81 + sign * 30.0]
            })
            .collect()
    }

    #[test]
    fn test_window_at_model_mean() {
        let window = normal_window();
        let detector = AnomalyDetector::from_parameters(model_for(&window, 3.0)).unwrap();

        let result = detector.predict(&window).unwrap();
        assert!(result.distance < 1e-3);
        assert!(!result.is_anomaly);
        assert_eq!(result.confidence, 0.05);
        assert_eq!(result.threshold, 3.0);
        assert_eq!(result.feature_values.len(), 3);
    }

    #[test]
    fn test_debounced_sequence() {
        let detector = AnomalyDetector::from_parameters(model_for(&normal_window(), 3.0)).unwrap();
        let violent = violent_window();
        let normal = normal_window();

        // One raw anomaly is not enough; two within three are.
        assert!(!detector.predict(&violent).unwrap().is_anomaly);
        assert!(detector.predict(&violent).unwrap().is_anomaly);
        assert!(detector.predict(&normal).unwrap().is_anomaly);
        assert!(!detector.predict(&normal).unwrap().is_anomaly);
    }

    #[test]
    fn test_empty_window_rejected() {
        let detector = AnomalyDetector::from_parameters(model_for(&normal_window(), 3.0)).unwrap();
        assert!(matches!(
            detector.predict(&[]),
            Err(DetectError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_model_dimension() {
        let mut params = model_for(&normal_window(), 3.0);
        params.mean.truncate(10);
        params.covariance.truncate(10);
        params.covariance.iter_mut().for_each(|row| row.truncate(10));

        let detector = AnomalyDetector::from_parameters(params).unwrap();
        assert!(matches!(
            detector.predict(&normal_window()),
            Err(DetectError::FeatureDimension {
                expected: 10,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_single_sample_window_is_finite_features() {
        let detector = AnomalyDetector::from_parameters(model_for(&normal_window(), 3.0)).unwrap();
        let result = detector.predict(&[[0.0, 0.0, 9.81]]).unwrap();
        assert!(result.distance.is_finite());
    }

    #[test]
    fn test_concurrent_predictions() {
        let detector = Arc::new(
            AnomalyDetector::from_parameters(model_for(&normal_window(), 3.0)).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let detector = Arc::clone(&detector);
                std::thread::spawn(move || {
                    let window = normal_window();
                    for _ in 0..25 {
                        let result = detector.predict(&window).unwrap();
                        assert!(!result.is_anomaly);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let history = detector.history.lock();
        assert_eq!(history.confidence.recent_distances().count(), 10);
        assert_eq!(history.debouncer.history(), [false, false, false]);
    }
}
