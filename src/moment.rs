//! Capability interface standing in for the original system's duck-typed
//! `distribution` wrapper (spec §12, §9 "Design Notes"): anything that can
//! report its own mean and covariance can be projected, without needing to
//! be a `DMatrix` pair up front. Explicitly out of scope: `sample`, `pdf`,
//! skewness/kurtosis — the wrapper this replaces exposed more than the
//! kernel needs.

use nalgebra::DVector;

use crate::linalg::Mat;

/// A source of one multivariate normal's first two moments.
pub trait MomentProvider {
    /// Mean vector, length `d_hi`.
    fn mean(&self) -> DVector<f64>;
    /// Covariance matrix, `d_hi x d_hi`.
    fn cov(&self) -> Mat;

    /// [`Self::mean`] reshaped into the `1 x d_hi` row layout [`crate::pack`]
    /// expects.
    fn mean_row(&self) -> Mat {
        Mat::from_row_slice(1, self.mean().len(), self.mean().as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        mean: DVector<f64>,
        cov: Mat,
    }

    impl MomentProvider for Fixed {
        fn mean(&self) -> DVector<f64> {
            self.mean.clone()
        }
        fn cov(&self) -> Mat {
            self.cov.clone()
        }
    }

    #[test]
    fn mean_row_matches_mean() {
        let provider = Fixed {
            mean: DVector::from_vec(vec![1.0, 2.0, 3.0]),
            cov: Mat::identity(3, 3),
        };
        let row = provider.mean_row();
        assert_eq!(row.nrows(), 1);
        assert_eq!(row.ncols(), 3);
        assert_eq!(row[(0, 0)], 1.0);
        assert_eq!(row[(0, 2)], 3.0);
    }
}
