//! Packed layout: stacking `n` means and `n` covariances (or `n` translations
//! and `n` projection blocks) into one dense matrix, and back.
//!
//! Shape convention (spec §3): rows `0..n` hold one vector per distribution;
//! rows `n..n + n*d_hi` hold `n` stacked `d_hi × d_cols` blocks, one per
//! distribution. This module only knows about the row bookkeeping — it has
//! no opinion on whether the block rows are a covariance, a UAMDS `B_i`, or
//! a projection `P_i`.

use crate::error::UamdsError;
use crate::linalg::Mat;

/// Vertically stack `n` mean row-vectors and `n` `d_hi × d_hi` covariance
/// blocks into the packed `(n + n*d_hi) × d_hi` spec matrix.
///
/// Fails with [`UamdsError::LengthMismatch`] if `means.len() != covs.len()`,
/// and [`UamdsError::InvalidShape`] if any covariance isn't square or isn't
/// `d_hi × d_hi`.
pub fn pack(means: &[Mat], covs: &[Mat]) -> Result<Mat, UamdsError> {
    if means.len() != covs.len() {
        return Err(UamdsError::LengthMismatch {
            n_means: means.len(),
            n_covs: covs.len(),
        });
    }
    let n = means.len();
    if n < 1 {
        return Err(UamdsError::InvalidShape {
            reason: "n must be at least 1",
            got: (0, 0),
            expected: (1, 0),
        });
    }
    let d_hi = means[0].ncols();
    if means[0].nrows() != 1 {
        return Err(UamdsError::InvalidShape {
            reason: "mean must be a single row vector",
            got: (means[0].nrows(), means[0].ncols()),
            expected: (1, d_hi),
        });
    }

    for (i, (mu, cov)) in means.iter().zip(covs.iter()).enumerate() {
        if mu.nrows() != 1 || mu.ncols() != d_hi {
            return Err(UamdsError::InvalidShape {
                reason: "all means must share the same dimension",
                got: (mu.nrows(), mu.ncols()),
                expected: (1, d_hi),
            });
        }
        if cov.nrows() != d_hi || cov.ncols() != d_hi {
            return Err(UamdsError::InvalidShape {
                reason: "covariance must be square d_hi x d_hi",
                got: (cov.nrows(), cov.ncols()),
                expected: (d_hi, d_hi),
            });
        }
        let _ = i;
    }

    let mut spec = Mat::zeros(n + n * d_hi, d_hi);
    for (i, mu) in means.iter().enumerate() {
        spec.row_mut(i).copy_from(&mu.row(0));
    }
    for (i, cov) in covs.iter().enumerate() {
        spec.view_mut((n + i * d_hi, 0), (d_hi, d_hi)).copy_from(cov);
    }
    Ok(spec)
}

/// Inverse of [`pack`]: slice the packed `(n + n*d_hi) × d_hi` matrix back
/// into `n` mean row-vectors and `n` `d_hi × d_hi` covariance blocks.
///
/// Fails with [`UamdsError::InvalidShape`] if the row count doesn't divide
/// evenly as `n * (1 + d_hi)`.
pub fn unpack(spec: &Mat) -> Result<(Vec<Mat>, Vec<Mat>), UamdsError> {
    let d_hi = spec.ncols();
    let rows = spec.nrows();
    if d_hi == 0 || rows == 0 || rows % (d_hi + 1) != 0 {
        return Err(UamdsError::InvalidShape {
            reason: "spec rows must divide evenly into n * (1 + d_hi)",
            got: (rows, d_hi),
            expected: (0, d_hi),
        });
    }
    let n = rows / (d_hi + 1);

    let mut means = Vec::with_capacity(n);
    let mut covs = Vec::with_capacity(n);
    for i in 0..n {
        means.push(spec.rows(i, 1).into_owned());
    }
    for i in 0..n {
        covs.push(spec.view((n + i * d_hi, 0), (d_hi, d_hi)).into_owned());
    }
    Ok((means, covs))
}

/// Same as [`unpack`] but under the public name spec.md gives this secondary
/// entry point.
pub fn get_means_covs(spec: &Mat) -> Result<(Vec<Mat>, Vec<Mat>), UamdsError> {
    unpack(spec)
}

/// Number of distributions and the high-dimensional dimension packed into
/// `spec`, derived from its shape.
pub fn spec_dims(spec: &Mat) -> Result<(usize, usize), UamdsError> {
    let d_hi = spec.ncols();
    let rows = spec.nrows();
    if d_hi == 0 || rows == 0 || rows % (d_hi + 1) != 0 {
        return Err(UamdsError::InvalidShape {
            reason: "spec rows must divide evenly into n * (1 + d_hi)",
            got: (rows, d_hi),
            expected: (0, d_hi),
        });
    }
    Ok((rows / (d_hi + 1), d_hi))
}
