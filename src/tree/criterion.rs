//! Split-quality criteria used by the plaintext split search.
//!
//! A criterion accumulates per-side statistics row by row while the search
//! sweeps sorted feature values, and scores a left / right pair. The right
//! side is always obtained as `total - left`.

use crate::core::types::{Label, RowIndex, Score};
use crate::stats::compute_gain;
use ndarray::ArrayView2;

/// Statistic accumulated by a sweep over sorted feature values.
pub trait SplitCriterion: Sync {
    /// Per-side sufficient statistics.
    type Stats: Clone + Send;

    /// Statistics of an empty side.
    fn empty(&self) -> Self::Stats;

    /// Adds `row` to `stats`.
    fn push(&self, stats: &mut Self::Stats, row: RowIndex);

    /// `total - part`.
    fn subtract(&self, total: &Self::Stats, part: &Self::Stats) -> Self::Stats;

    /// Score of the split, or `None` when a side violates the size or weight
    /// constraints. Higher is better.
    fn score(
        &self,
        left: &Self::Stats,
        right: &Self::Stats,
        left_count: usize,
        right_count: usize,
    ) -> Option<f32>;

    /// Statistics over all `idxs`.
    fn collect(&self, idxs: &[RowIndex]) -> Self::Stats {
        let mut stats = self.empty();
        for &row in idxs {
            self.push(&mut stats, row);
        }
        stats
    }
}

/// Gradient / hessian sums, one entry per output dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GradHessStats {
    pub grad: Vec<Score>,
    pub hess: Vec<Score>,
}

/// Second-order gain of gradient boosting.
#[derive(Debug, Clone, Copy)]
pub struct GradientCriterion<'a> {
    gradient: ArrayView2<'a, Score>,
    hessian: ArrayView2<'a, Score>,
    lambda: f32,
    gamma: f32,
    min_child_weight: f32,
    min_leaf: usize,
}

impl<'a> GradientCriterion<'a> {
    pub fn new(
        gradient: ArrayView2<'a, Score>,
        hessian: ArrayView2<'a, Score>,
        lambda: f32,
        gamma: f32,
        min_child_weight: f32,
        min_leaf: usize,
    ) -> Self {
        GradientCriterion {
            gradient,
            hessian,
            lambda,
            gamma,
            min_child_weight,
            min_leaf,
        }
    }
}

impl SplitCriterion for GradientCriterion<'_> {
    type Stats = GradHessStats;

    fn empty(&self) -> GradHessStats {
        let dim = self.gradient.ncols();
        GradHessStats {
            grad: vec![0.0; dim],
            hess: vec![0.0; dim],
        }
    }

    fn push(&self, stats: &mut GradHessStats, row: RowIndex) {
        for c in 0..stats.grad.len() {
            stats.grad[c] += self.gradient[[row, c]];
            stats.hess[c] += self.hessian[[row, c]];
        }
    }

    fn subtract(&self, total: &GradHessStats, part: &GradHessStats) -> GradHessStats {
        GradHessStats {
            grad: total.grad.iter().zip(&part.grad).map(|(t, p)| t - p).collect(),
            hess: total.hess.iter().zip(&part.hess).map(|(t, p)| t - p).collect(),
        }
    }

    fn score(
        &self,
        left: &GradHessStats,
        right: &GradHessStats,
        left_count: usize,
        right_count: usize,
    ) -> Option<f32> {
        if left_count < self.min_leaf || right_count < self.min_leaf {
            return None;
        }
        let left_weight: f32 = left.hess.iter().sum();
        let right_weight: f32 = right.hess.iter().sum();
        if left_weight < self.min_child_weight || right_weight < self.min_child_weight {
            return None;
        }
        Some(compute_gain(
            &left.grad,
            &right.grad,
            &left.hess,
            &right.hess,
            self.gamma,
            self.lambda,
        ))
    }
}

/// Gini impurity decrease, used by the bagging ensembles.
#[derive(Debug, Clone, Copy)]
pub struct GiniCriterion<'a> {
    y: &'a [Label],
    num_classes: usize,
    min_leaf: usize,
}

impl<'a> GiniCriterion<'a> {
    pub fn new(y: &'a [Label], num_classes: usize, min_leaf: usize) -> Self {
        GiniCriterion {
            y,
            num_classes,
            min_leaf,
        }
    }
}

/// Gini impurity of a class-count vector.
pub fn gini_impurity(counts: &[f32]) -> f32 {
    let total: f32 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f32>()
}

impl SplitCriterion for GiniCriterion<'_> {
    type Stats = Vec<f32>;

    fn empty(&self) -> Vec<f32> {
        vec![0.0; self.num_classes]
    }

    fn push(&self, stats: &mut Vec<f32>, row: RowIndex) {
        stats[self.y[row] as usize] += 1.0;
    }

    fn subtract(&self, total: &Vec<f32>, part: &Vec<f32>) -> Vec<f32> {
        total.iter().zip(part).map(|(t, p)| t - p).collect()
    }

    fn score(
        &self,
        left: &Vec<f32>,
        right: &Vec<f32>,
        left_count: usize,
        right_count: usize,
    ) -> Option<f32> {
        if left_count < self.min_leaf || right_count < self.min_leaf {
            return None;
        }
        let n = (left_count + right_count) as f32;
        let parent: Vec<f32> = left.iter().zip(right).map(|(l, r)| l + r).collect();
        let weighted = (left_count as f32 * gini_impurity(left)
            + right_count as f32 * gini_impurity(right))
            / n;
        Some(gini_impurity(&parent) - weighted)
    }
}
