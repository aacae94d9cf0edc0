//! Pair gradient (spec §4.D) and its aggregation over all pairs `(i, j)`
//! with `j >= i` (spec §4.E). The aggregation is the one embarrassingly
//! parallel hot loop in the kernel (spec §5): each pair produces four
//! independent dense blocks that are scatter-added into overlapping rows of
//! the full gradient matrix.

use crate::linalg::Mat;
use crate::precompute::Constants;
use crate::stress::{b_block, c_row};

/// The four parameter-block contributions a single pair `(i, j)` makes to
/// the gradient of total stress, in the caller's row orientation.
struct PairGrad {
    d_b_i: Mat,
    d_b_j: Mat,
    d_c_i: Mat,
    d_c_j: Mat,
}

/// Gradient contribution of pair `(i, j)`, `i <= j` (spec §4.D).
fn pair_gradient(i: usize, j: usize, params: &Mat, c: &Constants) -> PairGrad {
    let d_lo = params.ncols();
    let si = &c.s[i];
    let sj = &c.s[j];
    let bi = b_block(params, c.n, c.d_hi, i);
    let bj = b_block(params, c.n, c.d_hi, j);
    let bi_t = bi.transpose(); // B~_i, d_lo x d_hi
    let bj_t = bj.transpose();
    let bi_si = &bi_t * si; // d_lo x d_hi
    let bj_si = &bj_t * sj;

    let ci = c_row(params, i);
    let cj = c_row(params, j);
    let delta_c = &ci - &cj; // 1 x d_lo
    let delta_c_col = delta_c.transpose(); // d_lo x 1

    // Term 1.
    let part1_i = (&bi_si * &bi) * &bi_si - &bi_si * si;
    let part2_i = (&bj_si * &bj) * &bi_si - (&bj_si * c.z[i][j].transpose()) * si;
    let mut d_b_i_t = (part1_i + part2_i) * 8.0;

    let part1_j = (&bj_si * &bj) * &bj_si - &bj_si * sj;
    let part2_j = (&bi_si * &bi) * &bj_si - (&bi_si * &c.z[i][j]) * sj;
    let mut d_b_j_t = (part1_j + part2_j) * 8.0;

    let mut d_c_i = Mat::zeros(1, d_lo);
    let mut d_c_j = Mat::zeros(1, d_lo);

    // Term 2 (vanishes when i == j because delta_c and mu_i - mu_j are 0).
    if i != j {
        let cdotb_i = &delta_c * &bi_t; // 1 x d_hi
        let diff_i = &cdotb_i - &c.mu_diff_u_i[i][j];
        d_b_i_t += (&delta_c_col * &diff_i) * si * 2.0;

        let cdotb_j = &delta_c * &bj_t;
        let diff_j = &cdotb_j - &c.mu_diff_u_j[i][j];
        d_b_j_t += (&delta_c_col * &diff_j) * sj * 2.0;

        let part4_i = (&c.mu_diff_u_i[i][j] - &cdotb_i) * bi_si.transpose();
        let part4_j = (&c.mu_diff_u_j[i][j] - &cdotb_j) * bj_si.transpose();
        let part4 = (part4_i + part4_j) * -2.0;
        d_c_i += &part4;
        d_c_j -= &part4;
    }

    // Term 3.
    let a = c.norm2_mu_diff[i][j] - delta_c.iter().map(|x| x * x).sum::<f64>();
    let b_i: f64 = (0..c.d_hi)
        .map(|k| (1.0 - bi.row(k).iter().map(|x| x * x).sum::<f64>()) * si[(k, k)])
        .sum();
    let b_j: f64 = (0..c.d_hi)
        .map(|k| (1.0 - bj.row(k).iter().map(|x| x * x).sum::<f64>()) * sj[(k, k)])
        .sum();
    let t3 = -4.0 * (a + b_i + b_j);
    d_b_i_t += &bi_si * t3;
    d_b_j_t += &bj_si * t3;
    if i != j {
        d_c_i += &delta_c * t3;
        d_c_j -= &delta_c * t3;
    }

    PairGrad {
        d_b_i: d_b_i_t.transpose(),
        d_b_j: d_b_j_t.transpose(),
        d_c_i,
        d_c_j,
    }
}

fn scatter_add(grad: &mut Mat, g: PairGrad, i: usize, j: usize, c: &Constants) {
    let cols = grad.ncols();
    let new_ci = grad.rows(i, 1).into_owned() + &g.d_c_i;
    grad.rows_mut(i, 1).copy_from(&new_ci);
    let new_cj = grad.rows(j, 1).into_owned() + &g.d_c_j;
    grad.rows_mut(j, 1).copy_from(&new_cj);

    let new_bi = grad.view((c.n + i * c.d_hi, 0), (c.d_hi, cols)).into_owned() + &g.d_b_i;
    grad.view_mut((c.n + i * c.d_hi, 0), (c.d_hi, cols)).copy_from(&new_bi);
    let new_bj = grad.view((c.n + j * c.d_hi, 0), (c.d_hi, cols)).into_owned() + &g.d_b_j;
    grad.view_mut((c.n + j * c.d_hi, 0), (c.d_hi, cols)).copy_from(&new_bj);
}

fn pairs(n: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in i..n {
            out.push((i, j));
        }
    }
    out
}

/// Gradient of total stress with respect to the packed parameter matrix
/// (spec §4.E). Scatters every pair's four blocks into the rows they own;
/// distinct pairs can touch overlapping `c`/`B` rows, so with the
/// `parallel` feature this folds into thread-local buffers before a final
/// reduction rather than writing the shared matrix directly from multiple
/// threads.
#[cfg(feature = "parallel")]
pub fn total_gradient(params: &Mat, c: &Constants) -> Mat {
    use rayon::prelude::*;

    let shape = (params.nrows(), params.ncols());
    pairs(c.n)
        .par_iter()
        .fold(
            || Mat::zeros(shape.0, shape.1),
            |mut acc, &(i, j)| {
                let g = pair_gradient(i, j, params, c);
                scatter_add(&mut acc, g, i, j, c);
                acc
            },
        )
        .reduce(|| Mat::zeros(shape.0, shape.1), |a, b| a + b)
}

/// Serial fallback used when the `parallel` feature is disabled (and by
/// [`total_gradient`]'s tests, which check it agrees with the parallel
/// path).
#[cfg(not(feature = "parallel"))]
pub fn total_gradient(params: &Mat, c: &Constants) -> Mat {
    total_gradient_serial(params, c)
}

/// Always-serial reference implementation, used directly by tests that
/// need bit-for-bit determinism (spec §8 scenario S4) regardless of which
/// features are enabled.
pub fn total_gradient_serial(params: &Mat, c: &Constants) -> Mat {
    let mut grad = Mat::zeros(params.nrows(), params.ncols());
    for (i, j) in pairs(c.n) {
        let g = pair_gradient(i, j, params, c);
        scatter_add(&mut grad, g, i, j, c);
    }
    grad
}
