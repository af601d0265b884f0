//! Covariance-weighted distance classifier
//!
//! Scores a feature vector by its Mahalanobis-style distance from the model
//! mean. The covariance is regularized with `REGULARIZATION * I` and inverted
//! after dividing by the median of its diagonal, which is equivalent to
//! inverting it directly but better conditioned.
//!
//! A covariance that cannot be inverted leaves the classifier degenerate:
//! every score is `+inf`, which compares greater than any finite threshold
//! and therefore registers as anomalous.

use crate::error::{DetectError, DetectResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Diagonal regularization added to the covariance.
pub const REGULARIZATION: f64 = 1e-6;

/// Fitted model parameters, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub mean: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub threshold: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

impl ModelParameters {
    /// Load and validate parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> DetectResult<Self> {
        let file = File::open(path.as_ref())?;
        let params: Self = serde_json::from_reader(BufReader::new(file))?;
        params.validate()?;
        Ok(params)
    }

    /// Parse and validate parameters from a JSON string.
    pub fn from_json_str(json: &str) -> DetectResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Feature dimension of the model.
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Check shapes and finiteness.
    pub fn validate(&self) -> DetectResult<()> {
        let dim = self.dimension();
        if dim == 0 {
            return Err(DetectError::ModelShape("mean is empty".into()));
        }
        if self.covariance.len() != dim {
            return Err(DetectError::ModelShape(format!(
                "covariance has {} rows, expected {}",
                self.covariance.len(),
                dim
            )));
        }
        if let Some((i, row)) = self
            .covariance
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dim)
        {
            return Err(DetectError::ModelShape(format!(
                "covariance row {} has {} columns, expected {}",
                i,
                row.len(),
                dim
            )));
        }
        let all_finite = self.mean.iter().all(|v| v.is_finite())
            && self.covariance.iter().flatten().all(|v| v.is_finite());
        if !all_finite {
            return Err(DetectError::ModelShape(
                "mean and covariance must be finite".into(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(DetectError::ModelShape("threshold must be finite".into()));
        }
        Ok(())
    }
}

/// Distance and undebounced decision for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// `>= 0`, or `+inf` for a degenerate model
    pub distance: f64,
    /// `distance > threshold`
    pub raw_anomaly: bool,
}

/// Distance classifier over immutable model parameters.
#[derive(Debug, Clone)]
pub struct DistanceClassifier {
    params: ModelParameters,
    mean: DVector<f64>,
    precision: Option<DMatrix<f64>>,
}

impl DistanceClassifier {
    /// Build a classifier, inverting the regularized covariance once.
    pub fn new(params: ModelParameters) -> DetectResult<Self> {
        params.validate()?;

        let dim = params.dimension();
        let mean = DVector::from_column_slice(&params.mean);
        let covariance = DMatrix::from_fn(dim, dim, |i, j| params.covariance[i][j]);
        let precision = scaled_inverse(&covariance);

        if precision.is_none() {
            tracing::warn!(
                dimension = dim,
                "Model covariance is not invertible; every score will be +inf"
            );
        }

        Ok(Self {
            params,
            mean,
            precision,
        })
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    pub fn threshold(&self) -> f64 {
        self.params.threshold
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// True when the covariance could not be inverted.
    pub fn is_degenerate(&self) -> bool {
        self.precision.is_none()
    }

    /// Score a feature vector against the model.
    pub fn score(&self, features: &[f64]) -> DetectResult<Score> {
        if features.len() != self.dimension() {
            return Err(DetectError::FeatureDimension {
                expected: self.dimension(),
                actual: features.len(),
            });
        }

        let distance = match &self.precision {
            Some(precision) => {
                let diff = DVector::from_column_slice(features) - &self.mean;
                let quadratic = diff.dot(&(precision * &diff));
                // A non-PSD model can drive the form slightly negative.
                if quadratic < 0.0 {
                    0.0
                } else {
                    quadratic.sqrt()
                }
            }
            None => f64::INFINITY,
        };

        Ok(Score {
            distance,
            raw_anomaly: distance > self.params.threshold,
        })
    }
}

/// `inverse(cov_reg / scale) / scale` with `scale = median(diag(cov_reg))`.
fn scaled_inverse(covariance: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let dim = covariance.nrows();
    let regularized = covariance + DMatrix::<f64>::identity(dim, dim) * REGULARIZATION;

    let scale = median(regularized.diagonal().iter().copied().collect());
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }

    let inverse = (regularized / scale).try_inverse()? / scale;
    inverse.iter().all(|v| v.is_finite()).then_some(inverse)
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
