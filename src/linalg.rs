//! Dense matrix/vector aliases and small shared linear-algebra helpers.
//!
//! The kernel works entirely in `f64` dense matrices; `nalgebra`'s `DMatrix`
//! and `DVector` back every array in the data model (packed specs, packed
//! parameters, per-pair constants).

use nalgebra::{DMatrix, DVector};

/// A dense real matrix with dynamic dimensions.
pub type Mat = DMatrix<f64>;
/// A dense real vector with dynamic dimension.
pub type Vec64 = DVector<f64>;

/// Returns `false` if any element of `m` is NaN or infinite.
pub fn all_finite(m: &Mat) -> bool {
    m.iter().all(|x| x.is_finite())
}

/// Mean pairwise Euclidean distance between the rows of `points`.
///
/// Used by parameter initialization to rescale the translation block to a
/// geometrically sensible magnitude (spec: `mean_pairwise_distance`).
pub fn mean_pairwise_distance(points: &Mat) -> f64 {
    let n = points.nrows();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = points.row(i) - points.row(j);
            total += diff.norm();
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// Squared Frobenius norm, i.e. sum of squared elements.
pub fn squared_frobenius(m: &Mat) -> f64 {
    m.iter().map(|x| x * x).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_check() {
        let ok = Mat::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(all_finite(&ok));
        let bad = Mat::from_row_slice(1, 2, &[1.0, f64::NAN]);
        assert!(!all_finite(&bad));
    }

    #[test]
    fn mean_pairwise_distance_triangle() {
        // 3-4-5 right triangle in 2D: mean of {3, 4, 5} = 4
        let pts = Mat::from_row_slice(3, 2, &[0.0, 0.0, 3.0, 0.0, 0.0, 4.0]);
        assert!((mean_pairwise_distance(&pts) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn mean_pairwise_distance_single_point() {
        let pts = Mat::from_row_slice(1, 2, &[1.0, 1.0]);
        assert_eq!(mean_pairwise_distance(&pts), 0.0);
    }

    #[test]
    fn squared_frobenius_matches_manual() {
        let m = Mat::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(squared_frobenius(&m), 1.0 + 4.0 + 9.0 + 16.0);
    }
}
