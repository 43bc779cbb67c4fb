#[allow(dead_code)]
mod common;

use ndarray::Array2;

use lumitrace_core::cluster::{cluster_pixels, CovarianceKind, GaussianMixture, GmmConfig};
use lumitrace_core::error::LumitraceError;
use lumitrace_core::features::{pixel_index, FeatureMatrix};

/// Two well-separated populations of 3-dimensional traces with a small
/// deterministic jitter, 15 samples each.
fn two_populations() -> Array2<f64> {
    Array2::from_shape_fn((30, 3), |(i, j)| {
        let base = if i < 15 { 0.0 } else { 100.0 };
        base + ((i * 3 + j) % 7) as f64 * 0.1
    })
}

fn assert_split_at(labels: &[u32], boundary: usize) {
    let first = labels[0];
    let second = labels[boundary];
    assert_ne!(first, second, "populations collapsed into one component");
    for (i, &label) in labels.iter().enumerate() {
        let expected = if i < boundary { first } else { second };
        assert_eq!(label, expected, "sample {i} crossed populations");
    }
}

#[test]
fn fit_separates_two_populations() {
    let x = two_populations();
    let config = GmmConfig {
        n_clusters: 2,
        ..GmmConfig::default()
    };

    let model = GaussianMixture::fit(&x, &config).unwrap();
    assert_split_at(&model.predict(&x), 15);
    assert!(model.iterations() >= 1);
    assert!(model.log_likelihood().is_finite());
}

#[test]
fn diagonal_covariance_separates_two_populations() {
    let x = two_populations();
    let config = GmmConfig {
        n_clusters: 2,
        covariance: CovarianceKind::Diagonal,
        ..GmmConfig::default()
    };

    let model = GaussianMixture::fit(&x, &config).unwrap();
    assert_split_at(&model.predict(&x), 15);
}

#[test]
fn same_seed_reproduces_labels() {
    let x = two_populations();
    let config = GmmConfig {
        n_clusters: 2,
        seed: 42,
        ..GmmConfig::default()
    };

    let first = GaussianMixture::fit(&x, &config).unwrap().predict(&x);
    let second = GaussianMixture::fit(&x, &config).unwrap().predict(&x);
    assert_eq!(first, second);
}

#[test]
fn exhausted_iteration_budget_is_an_error() {
    // One iteration can never satisfy the tolerance check, since the previous
    // bound starts at negative infinity.
    let x = two_populations();
    let config = GmmConfig {
        n_clusters: 2,
        max_iterations: 1,
        ..GmmConfig::default()
    };

    match GaussianMixture::fit(&x, &config) {
        Err(LumitraceError::Convergence { iterations }) => assert_eq!(iterations, 1),
        other => panic!("expected convergence failure, got {other:?}"),
    }
}

#[test]
fn rejects_more_components_than_samples() {
    let x = Array2::from_shape_fn((3, 2), |(i, j)| (i + j) as f64);
    let config = GmmConfig {
        n_clusters: 5,
        ..GmmConfig::default()
    };
    assert!(matches!(
        GaussianMixture::fit(&x, &config),
        Err(LumitraceError::Config(_))
    ));
}

#[test]
fn rejects_zero_components() {
    let x = two_populations();
    let config = GmmConfig {
        n_clusters: 0,
        ..GmmConfig::default()
    };
    assert!(matches!(
        GaussianMixture::fit(&x, &config),
        Err(LumitraceError::Config(_))
    ));
}

#[test]
fn cluster_pixels_groups_bright_square() {
    // Three 4x4 frames: a 2x2 square at (1, 1) holds 200, the rest 0.
    let stack = common::square_stack(4, 4, 3, 0, 200, 1, 1, 2);
    let features = FeatureMatrix::from_stack(&stack);

    let config = GmmConfig {
        n_clusters: 2,
        ..GmmConfig::default()
    };
    let assignment = cluster_pixels(&features, &config).unwrap();
    assert_eq!(assignment.len(), 16, "one label per pixel");
    assert_eq!(assignment.n_clusters(), 2);
    assert!(assignment
        .labels()
        .iter()
        .all(|&label| (label as usize) < assignment.n_clusters()));

    let bright = assignment.labels()[pixel_index(1, 1, 4)];
    let dark = assignment.labels()[pixel_index(0, 0, 4)];
    assert_ne!(bright, dark);
    for y in 0..4 {
        for x in 0..4 {
            let expected = if (1..3).contains(&y) && (1..3).contains(&x) {
                bright
            } else {
                dark
            };
            assert_eq!(
                assignment.labels()[pixel_index(x, y, 4)],
                expected,
                "pixel ({x}, {y}) landed in the wrong component"
            );
        }
    }
}
