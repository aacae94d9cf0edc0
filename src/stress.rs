//! Pair stress (spec §4.C) and its serial aggregation over all pairs
//! `(i, j)` with `j >= i` (spec §4.E).

use crate::linalg::Mat;
use crate::precompute::Constants;

/// View the translation row `c_i` out of the packed parameter matrix.
pub fn c_row(params: &Mat, i: usize) -> Mat {
    params.rows(i, 1).into_owned()
}

/// View the `B_i` block (`d_hi x d_lo`) out of the packed parameter matrix.
pub fn b_block(params: &Mat, n: usize, d_hi: usize, i: usize) -> Mat {
    params
        .view((n + i * d_hi, 0), (d_hi, params.ncols()))
        .into_owned()
}

/// Stress contribution of a single ordered pair `(i, j)`, `i <= j` (spec
/// §4.C). When `i == j`, Term 1 still penalizes self-reconstruction; Terms
/// 2 and 3's `Delta c`-dependent parts vanish automatically because
/// `c_i - c_j == 0` and `mu_i - mu_j == 0`.
pub fn pair_stress(i: usize, j: usize, params: &Mat, c: &Constants) -> f64 {
    let si = &c.s[i];
    let sj = &c.s[j];
    let bi = b_block(params, c.n, c.d_hi, i);
    let bj = b_block(params, c.n, c.d_hi, j);
    let ci = c_row(params, i);
    let cj = c_row(params, j);
    let delta_c = &ci - &cj;

    // Term 1: covariance alignment.
    let ssqrt_bi = &c.s_sqrt[i] * &bi;
    let resid_i = si - &ssqrt_bi * ssqrt_bi.transpose();
    let part1 = crate::linalg::squared_frobenius(&resid_i);

    let ssqrt_bj = &c.s_sqrt[j] * &bj;
    let resid_j = sj - &ssqrt_bj * ssqrt_bj.transpose();
    let part2 = crate::linalg::squared_frobenius(&resid_j);

    let cross_resid = &c.s_sqrt_cross[i][j] - &ssqrt_bi * ssqrt_bj.transpose();
    let part3 = crate::linalg::squared_frobenius(&cross_resid);

    let term1 = 2.0 * (part1 + part2) + 4.0 * part3;

    // Term 2: mean-direction consistency.
    let r_i = &c.mu_diff_u_i[i][j] - &delta_c * bi.transpose();
    let term2_i: f64 = (0..c.d_hi)
        .map(|k| r_i[(0, k)].powi(2) * si[(k, k)])
        .sum();
    let r_j = &c.mu_diff_u_j[i][j] - &delta_c * bj.transpose();
    let term2_j: f64 = (0..c.d_hi)
        .map(|k| r_j[(0, k)].powi(2) * sj[(k, k)])
        .sum();
    let term2 = term2_i + term2_j;

    // Term 3: scalar distance.
    let a = c.norm2_mu_diff[i][j] - delta_c.iter().map(|x| x * x).sum::<f64>();
    let b_i: f64 = (0..c.d_hi)
        .map(|k| (1.0 - bi.row(k).iter().map(|x| x * x).sum::<f64>()) * si[(k, k)])
        .sum();
    let b_j: f64 = (0..c.d_hi)
        .map(|k| (1.0 - bj.row(k).iter().map(|x| x * x).sum::<f64>()) * sj[(k, k)])
        .sum();
    let term3 = (a + b_i + b_j).powi(2);

    term1 + term2 + term3
}

/// Sum of `pair_stress` over every ordered pair `j >= i` (spec §4.E's
/// "total stress" aggregator). No parallelism — the stress evaluation is
/// cheap relative to the gradient's scatter-add.
pub fn total_stress(params: &Mat, c: &Constants) -> f64 {
    let mut total = 0.0;
    for i in 0..c.n {
        for j in i..c.n {
            total += pair_stress(i, j, params, c);
        }
    }
    total
}
