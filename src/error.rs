//! Errors produced by the UAMDS kernel.

use thiserror::Error;

/// A `(rows, cols)` shape, used to report the offending dimensions.
pub type Shape = (usize, usize);

/// Errors returned by the UAMDS kernel.
///
/// `InvalidShape` and `NonFinite` are caller contract violations, reported
/// immediately and not recoverable. `NumericBreakdown` reports the last
/// finite stress seen before the failure; callers may retry with a
/// different seed.
#[derive(Debug, Error)]
pub enum UamdsError {
    /// `d_lo` exceeds `d_hi`, `n < 1`, a covariance block is non-square, or
    /// spec rows don't divide evenly into `n * (1 + d_hi)`.
    #[error("invalid shape: {reason} (got {got:?}, expected {expected:?})")]
    InvalidShape {
        reason: &'static str,
        got: Shape,
        expected: Shape,
    },

    /// The list of means and the list of covariances disagree on `n`.
    #[error("invalid shape: {n_means} means but {n_covs} covariances")]
    LengthMismatch { n_means: usize, n_covs: usize },

    /// A mean vector or covariance matrix contains NaN or infinity.
    #[error("non-finite input in distribution {index}")]
    NonFinite { index: usize },

    /// The SVD of a covariance matrix failed to converge.
    #[error("SVD did not converge for distribution {index}")]
    SvdDiverged { index: usize },

    /// The minimizer produced a non-finite objective value.
    #[error(
        "optimizer diverged at iteration {iteration}: last finite stress was {last_finite_stress}"
    )]
    NumericBreakdown {
        iteration: usize,
        last_finite_stress: f64,
    },
}
