//! # uamds
//!
//! Uncertainty-aware multidimensional scaling: project `n` multivariate
//! normal distributions from `R^d_hi` down to `R^d_lo`, optimizing a
//! closed-form Gaussian dissimilarity between every pair instead of just
//! the distance between their means.
//!
//! ## Quick start
//!
//! ```
//! use uamds::{apply_uamds, UamdsOptions};
//! use nalgebra::DMatrix;
//!
//! let means = vec![
//!     DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 0.0]),
//!     DMatrix::from_row_slice(1, 3, &[4.0, 0.0, 0.0]),
//!     DMatrix::from_row_slice(1, 3, &[0.0, 4.0, 0.0]),
//! ];
//! let covs = vec![DMatrix::identity(3, 3); 3];
//!
//! let mut options = UamdsOptions::default();
//! options.seed = Some(42);
//! options.max_iterations = 20;
//!
//! let result = apply_uamds(&means, &covs, 2, &options).unwrap();
//! assert_eq!(result.means.len(), 3);
//! assert_eq!(result.covs[0].nrows(), 2);
//! assert_eq!(result.translations[0].ncols(), 2);
//! assert_eq!(result.projections[0].nrows(), 3);
//! ```
//!
//! ## Reproducibility
//!
//! [`UamdsOptions::seed`] drives the only source of randomness in the
//! kernel (parameter initialization). Leave it `None` to seed from entropy,
//! or set it for bit-for-bit reproducible runs.

mod error;
mod gradient;
pub mod linalg;
mod moment;
mod optimize;
mod pack;
mod precompute;
mod project;
mod stress;

pub use error::UamdsError;
pub use gradient::total_gradient;
pub use linalg::Mat;
pub use moment::MomentProvider;
pub use optimize::{init_params, iterate_gradient_descent, iterate_quasi_newton, Optimizer, UamdsOptions};
pub use pack::{get_means_covs, pack, spec_dims, unpack};
pub use precompute::{precompute, Constants};
pub use project::{affine_to_uamds, reconstruct_means_covs, uamds_to_affine, Affine};
pub use stress::total_stress;

/// Output of [`apply_uamds`]: the low-dimensional projection, its affine
/// form, and the optimizer's final stress.
#[derive(Debug, Clone)]
pub struct UamdsResult {
    /// Projected means, one `1 x d_lo` row per input distribution.
    pub means: Vec<Mat>,
    /// Projected covariances, one `d_lo x d_lo` block per input
    /// distribution.
    pub covs: Vec<Mat>,
    /// Affine translations `t_i`, one `1 x d_lo` row per input distribution
    /// (spec §6: `x_lo = x_hi P_i + t_i`).
    pub translations: Vec<Mat>,
    /// Affine projections `P_i`, one `d_hi x d_lo` block per input
    /// distribution.
    pub projections: Vec<Mat>,
    /// Total stress at the optimized parameters.
    pub stress: f64,
}

/// Project `n` multivariate normal distributions (given as means and
/// covariances) from `R^d_hi` to `R^d_lo` (spec §6 "External Interfaces").
///
/// Fails with [`UamdsError::InvalidShape`] if `d_lo > d_hi`, the input
/// lists disagree in length, or a covariance is non-square;
/// [`UamdsError::NonFinite`] if any mean/covariance entry is NaN/Inf; and
/// [`UamdsError::NumericBreakdown`] if the optimizer's objective stops
/// being finite partway through.
pub fn apply_uamds(
    means: &[Mat],
    covs: &[Mat],
    d_lo: usize,
    options: &UamdsOptions,
) -> Result<UamdsResult, UamdsError> {
    let spec = pack::pack(means, covs)?;
    let constants = precompute::precompute(&spec)?;

    if d_lo > constants.d_hi {
        return Err(UamdsError::InvalidShape {
            reason: "d_lo must not exceed d_hi",
            got: (d_lo, constants.d_hi),
            expected: (0, constants.d_hi),
        });
    }

    let init = optimize::init_params(&constants, d_lo, options.seed);
    let optimized = match options.optimizer {
        Optimizer::GradientDescent { step_size } => {
            optimize::iterate_gradient_descent(&init, &constants, options.max_iterations, step_size)?
        }
        Optimizer::QuasiNewton => {
            optimize::iterate_quasi_newton(&init, &constants, options.max_iterations)?
        }
    };

    let (proj_means, proj_covs) = project::reconstruct_means_covs(&optimized, &constants);
    let stress = stress::total_stress(&optimized, &constants);
    let affines = project::uamds_to_affine(&optimized, &constants);
    let translations = affines.iter().map(|a| a.t.clone()).collect();
    let projections = affines.iter().map(|a| a.p.clone()).collect();

    Ok(UamdsResult {
        means: proj_means,
        covs: proj_covs,
        translations,
        projections,
        stress,
    })
}

/// Project a list of anything that knows its own mean and covariance (spec
/// §12's capability-interface supplement to the duck-typed `distribution`
/// wrapper in the original system).
pub fn apply_uamds_to_providers<P: MomentProvider>(
    providers: &[P],
    d_lo: usize,
    options: &UamdsOptions,
) -> Result<UamdsResult, UamdsError> {
    let means: Vec<Mat> = providers.iter().map(|p| p.mean_row()).collect();
    let covs: Vec<Mat> = providers.iter().map(|p| p.cov()).collect();
    apply_uamds(&means, &covs, d_lo, options)
}
