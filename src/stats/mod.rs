//! Second-order split statistics and loss functions.
//!
//! These are pure functions over gradient / hessian arrays. They do not guard
//! against zero denominators: with `lambda == 0` and an empty hessian sum the
//! result is non-finite and propagates to the caller unchanged.

pub mod loss;

pub use loss::{sigmoid, softmax, LossFunction};

use crate::core::types::{RowIndex, Score};
use ndarray::ArrayView2;

/// Second-order gain of splitting a node into the given left / right halves.
///
/// Every slice holds one entry per output dimension. Higher is better; a
/// negative value means the split does not pay for its `gamma` penalty.
pub fn compute_gain(
    left_grad: &[Score],
    right_grad: &[Score],
    left_hess: &[Score],
    right_hess: &[Score],
    gamma: f32,
    lambda: f32,
) -> f32 {
    let mut left_gain = 0.0;
    let mut right_gain = 0.0;
    let mut base_gain = 0.0;

    for c in 0..left_grad.len() {
        let (gl, gr) = (left_grad[c], right_grad[c]);
        let (hl, hr) = (left_hess[c], right_hess[c]);
        left_gain += gl * gl / (hl + lambda);
        right_gain += gr * gr / (hr + lambda);
        base_gain += (gl + gr) * (gl + gr) / (hl + hr + lambda);
    }

    0.5 * (left_gain + right_gain - base_gain) - gamma
}

/// Newton-step leaf weight `-sum(g) / (sum(h) + lambda)` per output dimension,
/// summed over the first `row_count` entries of `idxs`.
pub fn compute_weight(
    row_count: usize,
    gradient: ArrayView2<'_, Score>,
    hessian: ArrayView2<'_, Score>,
    idxs: &[RowIndex],
    lambda: f32,
) -> Vec<Score> {
    let grad_dim = gradient.ncols();
    let mut sum_grad = vec![0.0; grad_dim];
    let mut sum_hess = vec![0.0; grad_dim];

    for &row in idxs.iter().take(row_count) {
        for c in 0..grad_dim {
            sum_grad[c] += gradient[[row, c]];
            sum_hess[c] += hessian[[row, c]];
        }
    }

    sum_grad
        .iter()
        .zip(sum_hess.iter())
        .map(|(g, h)| -(g / (h + lambda)))
        .collect()
}
