//! End-to-end scenarios (spec §8 S1-S5): each exercises `apply_uamds` as a
//! whole, with the exact distributions and tolerances spec.md names, rather
//! than one component in isolation.

use nalgebra::{DMatrix, DVector};
use uamds::{
    affine_to_uamds, apply_uamds, iterate_quasi_newton, pack, precompute, total_stress, Affine,
    Optimizer, UamdsOptions,
};

type Mat = DMatrix<f64>;

fn euclidean_distance(a: &Mat, b: &Mat) -> f64 {
    (a - b).norm()
}

fn pairwise_distances(points: &[Mat]) -> Vec<f64> {
    let mut out = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            out.push(euclidean_distance(&points[i], &points[j]));
        }
    }
    out
}

/// 1-based ranks of `values`, smallest first. The generated test data never
/// ties, so no tie-averaging is needed.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
    let mut out = vec![0.0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        out[idx] = (rank + 1) as f64;
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Spearman rank correlation between two distance lists (the Shepard-diagram
/// monotonicity check scenario S2 names).
fn spearman(a: &[f64], b: &[f64]) -> f64 {
    pearson(&ranks(a), &ranks(b))
}

/// S1: an isometry already exists (identity covariances, well-separated
/// means in `R^2` projected to `R^2`), so the optimizer should find it: the
/// final stress must be at most `1e-6`, pairwise distances between the
/// optimized means must match the originals (3, 4, 5) to within `1e-3`, and
/// the optimized covariances must stay near `I`.
#[test]
fn s1_identity_pass_through_reaches_near_zero_stress() {
    let means = vec![
        Mat::from_row_slice(1, 2, &[0.0, 0.0]),
        Mat::from_row_slice(1, 2, &[3.0, 0.0]),
        Mat::from_row_slice(1, 2, &[0.0, 4.0]),
    ];
    let covs = vec![Mat::identity(2, 2); 3];

    let mut options = UamdsOptions::default();
    options.seed = Some(11);
    options.max_iterations = 500;

    let result = apply_uamds(&means, &covs, 2, &options).unwrap();
    assert!(result.stress <= 1e-6, "stress too high: {}", result.stress);

    let expected = [3.0, 4.0, 5.0];
    for (d, e) in pairwise_distances(&result.means).iter().zip(expected.iter()) {
        assert!((d - e).abs() < 1e-3, "distance {d} not within 1e-3 of {e}");
    }

    for cov in &result.covs {
        for r in 0..2 {
            for c in 0..2 {
                let target = if r == c { 1.0 } else { 0.0 };
                assert!(
                    (cov[(r, c)] - target).abs() < 1e-2,
                    "covariance entry ({r},{c}) = {} not near {target}",
                    cov[(r, c)]
                );
            }
        }
    }
}

/// S2: four equal-variance Gaussians centered on distinct unit vectors in
/// `R^3`, projected to `R^2`. The optimizer cannot reach zero stress (the
/// points are not coplanar), but the low-dimensional embedding must still
/// preserve the *ordering* of pairwise distances: Spearman rank correlation
/// between the high- and low-dimensional distance lists must be at least
/// 0.95.
#[test]
fn s2_unit_vertices_preserve_shepard_monotonicity() {
    let raw = [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
    ];
    let means: Vec<Mat> = raw
        .iter()
        .map(|v| {
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            Mat::from_row_slice(1, 3, &[v[0] / norm, v[1] / norm, v[2] / norm])
        })
        .collect();
    let covs = vec![Mat::identity(3, 3) * 0.01; 4];

    let mut options = UamdsOptions::default();
    options.seed = Some(5);
    options.max_iterations = 300;

    let result = apply_uamds(&means, &covs, 2, &options).unwrap();
    assert!(result.stress.is_finite());
    assert!(result.stress >= 0.0);

    let hi_distances = pairwise_distances(&means);
    let lo_distances = pairwise_distances(&result.means);
    let rho = spearman(&hi_distances, &lo_distances);
    assert!(rho >= 0.95, "Shepard rank correlation too low: {rho}");
}

/// S3: two Gaussians in `R^2` whose dominant variance sits on different
/// axes, collapsed to `R^1`. Each distribution's own projection should pick
/// up its own dominant direction, so both 1-D variances should land nearer
/// 1 than the minor-axis variance of 0.01, and the 5-unit mean separation
/// should survive the collapse.
#[test]
fn s3_anisotropic_covariances_track_their_own_dominant_axis() {
    let means = vec![
        Mat::from_row_slice(1, 2, &[0.0, 0.0]),
        Mat::from_row_slice(1, 2, &[5.0, 0.0]),
    ];
    let covs = vec![
        Mat::from_diagonal(&DVector::from_vec(vec![1.0, 0.01])),
        Mat::from_diagonal(&DVector::from_vec(vec![0.01, 1.0])),
    ];

    let mut options = UamdsOptions::default();
    options.seed = Some(3);
    options.max_iterations = 400;

    let result = apply_uamds(&means, &covs, 1, &options).unwrap();

    let separation = (result.means[1][(0, 0)] - result.means[0][(0, 0)]).abs();
    assert!((separation - 5.0).abs() < 1.5, "separation {separation} not near 5");

    let midpoint = (1.0 + 0.01) / 2.0;
    for (i, cov) in result.covs.iter().enumerate() {
        assert!(
            cov[(0, 0)] > midpoint,
            "distribution {i} 1-D variance {} not closer to 1 than 0.01",
            cov[(0, 0)]
        );
    }
}

/// S4: the same seed must produce bit-for-bit identical affine outputs
/// across repeated runs.
#[test]
fn s4_same_seed_is_deterministic_across_runs() {
    let means = vec![
        Mat::from_row_slice(1, 3, &[0.0, 0.0, 0.0]),
        Mat::from_row_slice(1, 3, &[2.0, 0.0, 0.0]),
        Mat::from_row_slice(1, 3, &[0.0, 2.0, 0.0]),
        Mat::from_row_slice(1, 3, &[0.0, 0.0, 2.0]),
    ];
    let covs = vec![Mat::identity(3, 3); 4];

    let mut options = UamdsOptions::default();
    options.seed = Some(77);
    options.optimizer = Optimizer::QuasiNewton;
    options.max_iterations = 40;

    let a = apply_uamds(&means, &covs, 2, &options).unwrap();
    let b = apply_uamds(&means, &covs, 2, &options).unwrap();

    for (x, y) in a.translations.iter().zip(b.translations.iter()) {
        assert_eq!(x, y);
    }
    for (x, y) in a.projections.iter().zip(b.projections.iter()) {
        assert_eq!(x, y);
    }
    assert_eq!(a.stress, b.stress);
}

/// S5: feeding a converged run's own output back in as the starting point
/// should leave the optimizer at (almost) exactly the same stress.
#[test]
fn s5_reoptimizing_a_converged_result_is_stable() {
    let means = vec![
        Mat::from_row_slice(1, 3, &[0.0, 0.0, 0.0]),
        Mat::from_row_slice(1, 3, &[2.0, 0.0, 0.0]),
        Mat::from_row_slice(1, 3, &[0.0, 2.0, 0.0]),
        Mat::from_row_slice(1, 3, &[0.0, 0.0, 2.0]),
    ];
    let covs = vec![Mat::identity(3, 3); 4];

    let mut options = UamdsOptions::default();
    options.seed = Some(9);
    options.max_iterations = 300;

    let first = apply_uamds(&means, &covs, 2, &options).unwrap();

    let spec = pack(&means, &covs).unwrap();
    let constants = precompute(&spec).unwrap();
    let affines: Vec<Affine> = first
        .translations
        .iter()
        .zip(first.projections.iter())
        .map(|(t, p)| Affine { p: p.clone(), t: t.clone() })
        .collect();
    let reconstructed = affine_to_uamds(&affines, &constants);

    let reoptimized = iterate_quasi_newton(&reconstructed, &constants, 30).unwrap();
    let stress_after = total_stress(&reoptimized, &constants);

    assert!(
        (stress_after - first.stress).abs() < 1e-6,
        "stress moved from {} to {stress_after}",
        first.stress
    );
}
