//! Projection reconstruction (spec §4.G): recovering low-dimensional
//! normals from optimized UAMDS parameters, and converting between the
//! `(c_i, B_i)` UAMDS representation and the ordinary affine map
//! `x_lo = mu_i P_i + t_i` used by callers who think in terms of
//! projections rather than UAMDS's own parameterization.

use crate::linalg::Mat;
use crate::precompute::Constants;
use crate::stress::{b_block, c_row};

/// Reconstruct the `n` low-dimensional means (`c_i`) and covariances
/// (`B_i^T S_i B_i`) implied by an optimized packed parameter matrix (spec
/// §4.G). Each returned covariance is exactly symmetric positive
/// semi-definite: `B_i^T S_i B_i` is a Gram matrix of `S_i^(1/2) B_i`.
pub fn reconstruct_means_covs(params: &Mat, c: &Constants) -> (Vec<Mat>, Vec<Mat>) {
    let mut means = Vec::with_capacity(c.n);
    let mut covs = Vec::with_capacity(c.n);
    for i in 0..c.n {
        means.push(c_row(params, i));
        let bi = b_block(params, c.n, c.d_hi, i);
        covs.push(bi.transpose() * &c.s[i] * &bi);
    }
    (means, covs)
}

/// One distribution's affine low-dimensional embedding: `x_lo = x_hi P + t`.
#[derive(Debug, Clone)]
pub struct Affine {
    /// `d_hi x d_lo` projection.
    pub p: Mat,
    /// `1 x d_lo` translation.
    pub t: Mat,
}

/// Convert optimized UAMDS parameters to the ordinary affine form (spec
/// "Design Notes"): `P_i = U_i B_i`, `t_i = c_i - mu_i P_i`.
pub fn uamds_to_affine(params: &Mat, c: &Constants) -> Vec<Affine> {
    (0..c.n)
        .map(|i| {
            let bi = b_block(params, c.n, c.d_hi, i);
            let ci = c_row(params, i);
            let p = &c.u[i] * &bi;
            let t = &ci - &c.mu[i] * &p;
            Affine { p, t }
        })
        .collect()
}

/// Inverse of [`uamds_to_affine`]: `B_i = U_i^T P_i`, `c_i = t_i + mu_i P_i`,
/// packed back into the `(n + n*d_hi) x d_lo` parameter matrix.
pub fn affine_to_uamds(affines: &[Affine], c: &Constants) -> Mat {
    let d_lo = affines[0].p.ncols();
    let mut params = Mat::zeros(c.n + c.n * c.d_hi, d_lo);
    for (i, affine) in affines.iter().enumerate() {
        let ci = &affine.t + &c.mu[i] * &affine.p;
        params.rows_mut(i, 1).copy_from(&ci);
        let bi = c.u[i].transpose() * &affine.p;
        params
            .view_mut((c.n + i * c.d_hi, 0), (c.d_hi, d_lo))
            .copy_from(&bi);
    }
    params
}
