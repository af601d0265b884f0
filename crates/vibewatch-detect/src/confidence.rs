//! Adaptive confidence estimation
//!
//! Confidence starts from a band lookup on `distance / threshold` and is
//! penalized when the last three distances are unstable or when the current
//! distance departs from their mean.

use std::collections::VecDeque;

/// Number of raw distances retained.
pub const DISTANCE_HISTORY: usize = 10;

/// Trailing distances used for the stability adjustment.
pub const STABILITY_WINDOW: usize = 3;

/// `(upper ratio bound, confidence)`, checked in order.
const BANDS: [(f64, f64); 6] = [
    (0.5, 0.05),
    (0.8, 0.15),
    (1.0, 0.25),
    (1.2, 0.45),
    (1.5, 0.65),
    (2.0, 0.80),
];

/// Confidence at or above twice the threshold.
const CEILING: f64 = 0.90;

const UNSTABLE_SPREAD: f64 = 0.3;
const UNSTABLE_PENALTY: f64 = 0.7;
const DEPARTURE_SPREAD: f64 = 0.5;
const DEPARTURE_PENALTY: f64 = 0.8;

/// Base confidence for a distance, before any stability adjustment.
pub fn band_confidence(distance: f64, threshold: f64) -> f64 {
    BANDS
        .iter()
        .find(|(ratio, _)| distance < threshold * ratio)
        .map(|(_, confidence)| *confidence)
        .unwrap_or(CEILING)
}

/// Confidence estimator with a bounded distance history.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceEstimator {
    recent: VecDeque<f64>,
}

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `distance` and return a confidence in `[0, 1]`.
    pub fn estimate(&mut self, distance: f64, threshold: f64) -> f64 {
        if self.recent.len() == DISTANCE_HISTORY {
            self.recent.pop_front();
        }
        self.recent.push_back(distance);

        let mut confidence = band_confidence(distance, threshold);

        if self.recent.len() >= STABILITY_WINDOW {
            let tail: Vec<f64> = self
                .recent
                .iter()
                .skip(self.recent.len() - STABILITY_WINDOW)
                .copied()
                .collect();
            let mean = tail.iter().sum::<f64>() / STABILITY_WINDOW as f64;
            let variance =
                tail.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / STABILITY_WINDOW as f64;

            if variance.sqrt() > mean * UNSTABLE_SPREAD {
                confidence *= UNSTABLE_PENALTY;
            }
            if (distance - mean).abs() > mean * DEPARTURE_SPREAD {
                confidence *= DEPARTURE_PENALTY;
            }
        }

        confidence.clamp(0.0, 1.0)
    }

    /// Retained distances, oldest first.
    pub fn recent_distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_band_table() {
        let threshold = 10.0;
        let cases = [
            (4.0, 0.05),
            (5.0, 0.15),
            (8.0, 0.25),
            (11.0, 0.45),
            (12.0, 0.65),
            (15.0, 0.80),
            (20.0, 0.90),
            (f64::INFINITY, 0.90),
        ];
        for (distance, expected) in cases {
            assert_eq!(band_confidence(distance, threshold), expected, "{}", distance);
        }
    }

    #[test]
    fn test_fresh_estimator_has_no_penalty() {
        let mut estimator = ConfidenceEstimator::new();
        assert!(close(estimator.estimate(4.0, 10.0), 0.05));
        assert!(close(estimator.estimate(11.0, 10.0), 0.45));
    }

    #[test]
    fn test_stable_history_keeps_band() {
        let mut estimator = ConfidenceEstimator::new();
        estimator.estimate(11.0, 10.0);
        estimator.estimate(11.0, 10.0);
        assert!(close(estimator.estimate(11.0, 10.0), 0.45));
    }

    #[test]
    fn test_penalties_compose() {
        let mut estimator = ConfidenceEstimator::new();
        estimator.estimate(1.0, 10.0);
        estimator.estimate(1.0, 10.0);
        // tail [1, 1, 25]: mean 9, std ~11.3 > 2.7, |25 - 9| > 4.5
        let confidence = estimator.estimate(25.0, 10.0);
        assert!(close(confidence, 0.90 * 0.7 * 0.8));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut estimator = ConfidenceEstimator::new();
        for i in 0..25 {
            estimator.estimate(i as f64, 10.0);
        }
        let recent: Vec<f64> = estimator.recent_distances().collect();
        assert_eq!(recent.len(), DISTANCE_HISTORY);
        assert_eq!(recent[0], 15.0);
        assert_eq!(recent[9], 24.0);
    }
}
