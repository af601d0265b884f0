//! Property tests for the distance classifier and feature extraction

use proptest::prelude::*;
use vibewatch_detect::{extract_features, DistanceClassifier, ModelParameters};

fn diagonal_model(variances: &[f64], threshold: f64) -> ModelParameters {
    let dim = variances.len();
    ModelParameters {
        mean: vec![0.0; dim],
        covariance: (0..dim)
            .map(|i| {
                (0..dim)
                    .map(|j| if i == j { variances[i] } else { 0.0 })
                    .collect()
            })
            .collect(),
        threshold,
        model_type: None,
    }
}

/// `A·Aᵀ + I` for a square `A`, which is symmetric positive definite.
fn correlated_model(a: &[Vec<f64>], mean: &[f64]) -> ModelParameters {
    let dim = a.len();
    let covariance = (0..dim)
        .map(|i| {
            (0..dim)
                .map(|j| {
                    let dot: f64 = (0..dim).map(|k| a[i][k] * a[j][k]).sum();
                    dot + if i == j { 1.0 } else { 0.0 }
                })
                .collect()
        })
        .collect();
    ModelParameters {
        mean: mean.to_vec(),
        covariance,
        threshold: 3.0,
        model_type: None,
    }
}

/// Square factor and mean vector of a shared random dimension.
fn correlated_inputs() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
    (1usize..16).prop_flat_map(|dim| {
        (
            prop::collection::vec(prop::collection::vec(-2.0f64..2.0, dim), dim),
            prop::collection::vec(-10.0f64..10.0, dim),
        )
    })
}

fn variances() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.1f64..10.0, 1..16)
}

proptest! {
    #[test]
    fn distance_is_non_negative(
        vars in variances(),
        offset in -100.0f64..100.0,
    ) {
        let classifier = DistanceClassifier::new(diagonal_model(&vars, 3.0)).unwrap();
        let features = vec![offset; vars.len()];
        let score = classifier.score(&features).unwrap();
        prop_assert!(score.distance >= 0.0);
        prop_assert!(score.distance.is_finite());
    }

    #[test]
    fn distance_grows_along_a_ray(
        vars in variances(),
        direction in -1.0f64..1.0,
        small in 0.0f64..10.0,
        extra in 0.001f64..10.0,
    ) {
        prop_assume!(direction.abs() > 1e-3);
        let classifier = DistanceClassifier::new(diagonal_model(&vars, 3.0)).unwrap();

        let near = vec![direction * small; vars.len()];
        let far = vec![direction * (small + extra); vars.len()];
        let d_near = classifier.score(&near).unwrap().distance;
        let d_far = classifier.score(&far).unwrap().distance;
        prop_assert!(d_far >= d_near);
    }

    #[test]
    fn distance_grows_as_one_feature_leaves_the_mean(
        (a, mean) in correlated_inputs(),
        index in any::<prop::sample::Index>(),
        sign in prop::bool::ANY,
        small in 0.0f64..10.0,
        extra in 0.001f64..10.0,
    ) {
        let classifier = DistanceClassifier::new(correlated_model(&a, &mean)).unwrap();
        let i = index.index(mean.len());
        let direction = if sign { 1.0 } else { -1.0 };

        let mut near = mean.clone();
        near[i] += direction * small;
        let mut far = mean.clone();
        far[i] += direction * (small + extra);

        let d_near = classifier.score(&near).unwrap().distance;
        let d_far = classifier.score(&far).unwrap().distance;
        prop_assert!(
            d_far >= d_near * (1.0 - 1e-9),
            "feature {}: {} then {}",
            i,
            d_near,
            d_far
        );
    }

    #[test]
    fn scoring_is_deterministic(
        vars in variances(),
        offset in -50.0f64..50.0,
    ) {
        let classifier = DistanceClassifier::new(diagonal_model(&vars, 3.0)).unwrap();
        let features = vec![offset; vars.len()];
        let a = classifier.score(&features).unwrap();
        let b = classifier.score(&features).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn raw_flag_matches_threshold(
        vars in variances(),
        offset in -50.0f64..50.0,
        threshold in 0.1f64..20.0,
    ) {
        let classifier = DistanceClassifier::new(diagonal_model(&vars, threshold)).unwrap();
        let score = classifier.score(&vec![offset; vars.len()]).unwrap();
        prop_assert_eq!(score.raw_anomaly, score.distance > threshold);
    }

    #[test]
    fn features_ignore_constant_offset(
        rows in prop::collection::vec(prop::array::uniform3(-20.0f64..20.0), 2..64),
        shift in prop::array::uniform3(-100.0f64..100.0),
    ) {
        let shifted: Vec<[f64; 3]> = rows
            .iter()
            .map(|r| [r[0] + shift[0], r[1] + shift[1], r[2] + shift[2]])
            .collect();

        let a = extract_features(&rows).sanitized_values();
        let b = extract_features(&shifted).sanitized_values();
        prop_assert_eq!(a.len(), 15);
        for (x, y) in a.iter().zip(&b) {
            let tolerance = 1e-6 * (1.0 + x.abs().max(y.abs()));
            prop_assert!((x - y).abs() <= tolerance, "{} != {}", x, y);
        }
    }
}
