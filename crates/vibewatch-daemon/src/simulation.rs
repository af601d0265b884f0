//! Synthetic sensor batches for exercising the pipeline without hardware

use rand::Rng;
use vibewatch_types::SensorBatch;

/// Rows per simulated batch (one second at 200 Hz).
pub const SIMULATED_SAMPLES: usize = 200;

/// Vibration profile of a simulated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Small noise around rest with gravity on z
    Normal,
    /// Strong shaking far from the resting signature
    Anomalous,
}

impl Profile {
    pub fn sensor_id(self) -> &'static str {
        match self {
            Profile::Normal => "test_simulator",
            Profile::Anomalous => "test_anomaly",
        }
    }

    /// `(mean, std)` per axis.
    fn axes(self) -> [(f64, f64); 3] {
        match self {
            Profile::Normal => [(0.1, 0.5), (0.2, 0.5), (9.8, 0.3)],
            Profile::Anomalous => [(5.0, 2.0), (5.0, 2.0), (15.0, 3.0)],
        }
    }
}

/// Generate a batch of `SIMULATED_SAMPLES` rows for `profile`.
pub fn simulate_batch<R: Rng + ?Sized>(rng: &mut R, profile: Profile) -> SensorBatch {
    let axes = profile.axes();
    let data = (0..SIMULATED_SAMPLES)
        .map(|_| {
            axes.iter()
                .map(|&(mean, std)| gaussian(rng, mean, std))
                .collect()
        })
        .collect();
    SensorBatch::new(profile.sensor_id(), data)
}

/// Box-Muller draw from `N(mean, std^2)`.
fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    // gen::<f64>() is in [0, 1); shift to (0, 1] so ln never sees zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std * z
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn column_mean(batch: &SensorBatch, axis: usize) -> f64 {
        batch.data.iter().map(|row| row[axis]).sum::<f64>() / batch.data.len() as f64
    }

    #[test]
    fn test_batch_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch = simulate_batch(&mut rng, Profile::Normal);
        assert_eq!(batch.data.len(), SIMULATED_SAMPLES);
        assert!(batch.data.iter().all(|row| row.len() == 3));
        assert!(batch.data.iter().flatten().all(|v| v.is_finite()));
        assert_eq!(batch.sensor_id, "test_simulator");
    }

    #[test]
    fn test_profiles_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let normal = simulate_batch(&mut rng, Profile::Normal);
        let anomalous = simulate_batch(&mut rng, Profile::Anomalous);

        assert!((column_mean(&normal, 2) - 9.8).abs() < 0.2);
        assert!((column_mean(&anomalous, 2) - 15.0).abs() < 1.0);
        assert_eq!(anomalous.sensor_id, "test_anomaly");
    }
}
