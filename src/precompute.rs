//! One-time reduction of a packed distribution spec into the per-pair
//! tensors that `stress`/`gradient` consume. These constants are read-only
//! for the lifetime of an optimization run (spec §3 "Lifecycles").

use nalgebra::linalg::SVD;

use crate::error::UamdsError;
use crate::linalg::{all_finite, Mat};
use crate::pack::unpack;

/// Precomputed per-distribution and per-pair constants (spec §3, §4.B).
///
/// All `n x n` fields are indexed `[i][j]`; only `j >= i` is ever read by
/// the stress/gradient kernels, but the full square is stored for simple
/// indexing (n is expected to be small — tens to low hundreds of
/// distributions — so the O(n^2) footprint is not a concern).
pub struct Constants {
    pub n: usize,
    pub d_hi: usize,
    /// Stacked means, one `1 x d_hi` row per distribution.
    pub mu: Vec<Mat>,
    /// Stacked covariances `Sigma_i`.
    pub cov: Vec<Mat>,
    /// Left singular vectors `U_i` (`d_hi x d_hi`, orthogonal).
    pub u: Vec<Mat>,
    /// Singular values of `Sigma_i` as a diagonal matrix `S_i`.
    pub s: Vec<Mat>,
    /// Elementwise square root of `S_i`.
    pub s_sqrt: Vec<Mat>,
    /// `||mu_i - mu_j||^2` for all pairs.
    pub norm2_mu_diff: Vec<Vec<f64>>,
    /// `S_i^(1/2) U_i^T U_j S_j^(1/2)` for all pairs.
    pub s_sqrt_cross: Vec<Vec<Mat>>,
    /// `(mu_i - mu_j)^T U_i` for all pairs (row vector, length d_hi).
    pub mu_diff_u_i: Vec<Vec<Mat>>,
    /// `(mu_i - mu_j)^T U_j` for all pairs.
    pub mu_diff_u_j: Vec<Vec<Mat>>,
    /// `Z_ij = U_i^T U_j` for all pairs.
    pub z: Vec<Vec<Mat>>,
}

/// SVD convergence tolerance and iteration cap handed to `nalgebra`.
const SVD_EPS: f64 = 1e-12;
const SVD_MAX_ITER: usize = 200;

/// Compute [`Constants`] for a packed distribution `spec`.
///
/// Fails with [`UamdsError::NonFinite`] if any mean or covariance contains
/// NaN/Inf (checked before any SVD is attempted), and
/// [`UamdsError::SvdDiverged`] if a covariance's SVD fails to converge.
pub fn precompute(spec: &Mat) -> Result<Constants, UamdsError> {
    let (means, covs) = unpack(spec)?;
    let n = means.len();
    let d_hi = means[0].ncols();

    for (i, (mu, cov)) in means.iter().zip(covs.iter()).enumerate() {
        if !all_finite(mu) || !all_finite(cov) {
            return Err(UamdsError::NonFinite { index: i });
        }
    }

    let mut u = Vec::with_capacity(n);
    let mut s = Vec::with_capacity(n);
    let mut s_sqrt = Vec::with_capacity(n);
    for (i, cov) in covs.iter().enumerate() {
        let svd = SVD::try_new(cov.clone(), true, true, SVD_EPS, SVD_MAX_ITER)
            .ok_or(UamdsError::SvdDiverged { index: i })?;
        let ui = svd.u.ok_or(UamdsError::SvdDiverged { index: i })?;
        let singular_values = svd.singular_values;
        if !singular_values.iter().all(|v| v.is_finite()) {
            return Err(UamdsError::SvdDiverged { index: i });
        }
        let si = Mat::from_diagonal(&singular_values);
        let si_sqrt = Mat::from_diagonal(&singular_values.map(|v| v.max(0.0).sqrt()));
        u.push(ui);
        s.push(si);
        s_sqrt.push(si_sqrt);
    }

    let mut norm2_mu_diff = vec![vec![0.0; n]; n];
    let mut s_sqrt_cross = vec![Vec::with_capacity(n); n];
    let mut mu_diff_u_i = vec![Vec::with_capacity(n); n];
    let mut mu_diff_u_j = vec![Vec::with_capacity(n); n];
    let mut z = vec![Vec::with_capacity(n); n];

    for i in 0..n {
        for j in 0..n {
            let diff = &means[i] - &means[j];
            norm2_mu_diff[i][j] = diff.iter().map(|x| x * x).sum();
            s_sqrt_cross[i].push(&s_sqrt[i] * u[i].transpose() * &u[j] * &s_sqrt[j]);
            mu_diff_u_i[i].push(&diff * &u[i]);
            mu_diff_u_j[i].push(&diff * &u[j]);
            z[i].push(u[i].transpose() * &u[j]);
        }
    }

    Ok(Constants {
        n,
        d_hi,
        mu: means,
        cov: covs,
        u,
        s,
        s_sqrt,
        norm2_mu_diff,
        s_sqrt_cross,
        mu_diff_u_i,
        mu_diff_u_j,
        z,
    })
}
