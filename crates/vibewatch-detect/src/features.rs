//! Statistical feature extraction
//!
//! Each axis is mean-centered over the window first, which removes constant
//! bias such as gravity and makes the features independent of sensor
//! orientation. Per axis, in order: standard deviation, excess kurtosis, peak
//! absolute amplitude, RMS and peak-to-peak range.
//!
//! Degenerate windows (a single sample, or a constant signal) produce a
//! non-finite kurtosis. The extractor reports it as-is.

use std::collections::BTreeMap;
use vibewatch_types::{sanitize_f64, AxisFeatures};

/// Features computed per axis.
pub const FEATURES_PER_AXIS: usize = 5;

/// Concatenated per-axis features, `FEATURES_PER_AXIS * axes` long.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn axis_count(&self) -> usize {
        self.values.len() / FEATURES_PER_AXIS
    }

    /// Copy with every non-finite value coerced to a finite one.
    pub fn sanitized_values(&self) -> Vec<f64> {
        self.values.iter().copied().map(sanitize_f64).collect()
    }

    /// Features grouped by axis, keyed `axis_0`, `axis_1`, ...
    pub fn per_axis(&self) -> BTreeMap<String, AxisFeatures> {
        self.values
            .chunks(FEATURES_PER_AXIS)
            .enumerate()
            .map(|(i, chunk)| (format!("axis_{}", i), AxisFeatures::from_slice(chunk)))
            .collect()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

/// Extract the feature vector of a window of `N`-axis samples.
pub fn extract_features<const N: usize>(window: &[[f64; N]]) -> FeatureVector {
    let mut values = Vec::with_capacity(N * FEATURES_PER_AXIS);

    for axis in 0..N {
        let column: Vec<f64> = window.iter().map(|row| row[axis]).collect();
        let centered = center(&column);
        values.extend_from_slice(&axis_statistics(&centered));
    }

    FeatureVector { values }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn center(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    values.iter().map(|v| v - m).collect()
}

/// `[std, kurtosis, peak, rms, peak_to_peak]` of one axis.
fn axis_statistics(values: &[f64]) -> [f64; FEATURES_PER_AXIS] {
    if values.is_empty() {
        return [f64::NAN; FEATURES_PER_AXIS];
    }

    let m = mean(values);
    let (m2, m4) = values.iter().fold((0.0, 0.0), |(m2, m4), v| {
        let d = v - m;
        let d2 = d * d;
        (m2 + d2, m4 + d2 * d2)
    });
    let n = values.len() as f64;
    let (m2, m4) = (m2 / n, m4 / n);

    let std = m2.sqrt();
    // Fisher (excess) kurtosis with biased moments; 0/0 on a constant axis.
    let kurtosis = m4 / (m2 * m2) - 3.0;
    let peak = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let rms = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);

    [std, kurtosis, peak, rms, max - min]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_length_is_five_per_axis() {
        let window = [[1.0, 2.0, 3.0], [2.0, 4.0, 1.0], [0.5, 0.0, 9.0]];
        assert_eq!(extract_features(&window).len(), 15);

        let two_axes = [[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(extract_features(&two_axes).len(), 10);
    }

    #[test]
    fn test_constant_offset_removed() {
        let base = [[1.0, -1.0, 0.5], [-1.0, 1.0, -0.5], [1.0, -1.0, 0.5], [-1.0, 1.0, -0.5]];
        let shifted: Vec<[f64; 3]> = base
            .iter()
            .map(|[x, y, z]| [x + 3.0, y - 7.0, z + 9.81])
            .collect();

        let a = extract_features(&base);
        let b = extract_features(&shifted);
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!(close(*x, *y), "{} != {}", x, y);
        }
    }

    #[test]
    fn test_known_statistics() {
        // Symmetric square wave: +-1 around zero
        let window = [[1.0], [-1.0], [1.0], [-1.0]];
        let features = extract_features(&window);
        let [std, kurtosis, peak, rms, p2p] = [
            features.as_slice()[0],
            features.as_slice()[1],
            features.as_slice()[2],
            features.as_slice()[3],
            features.as_slice()[4],
        ];
        assert!(close(std, 1.0));
        assert!(close(kurtosis, -2.0));
        assert!(close(peak, 1.0));
        assert!(close(rms, 1.0));
        assert!(close(p2p, 2.0));
    }

    #[test]
    fn test_single_sample_is_degenerate() {
        let features = extract_features(&[[4.0, 5.0, 6.0]]);
        assert_eq!(features.len(), 15);
        assert_eq!(features.as_slice()[0], 0.0);
        assert!(features.as_slice()[1].is_nan());
        assert!(features.sanitized_values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_per_axis_keys() {
        let features = extract_features(&[[1.0, 2.0, 3.0], [3.0, 2.0, 1.0]]);
        let per_axis = features.per_axis();
        assert_eq!(
            per_axis.keys().cloned().collect::<Vec<_>>(),
            vec!["axis_0", "axis_1", "axis_2"]
        );
        assert!(close(per_axis["axis_0"].peak_to_peak, 2.0));
        assert_eq!(per_axis["axis_1"].std, 0.0);
    }
}
