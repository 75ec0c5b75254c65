//! Trait seams between the boosting engine and the split-search collaborator.

use crate::core::error::Result;
use crate::core::types::*;
use crate::tree::{Party, Tree};
use ndarray::ArrayView2;
use std::fmt::Debug;

/// Everything a split-search collaborator needs to grow one boosting tree.
#[derive(Debug, Clone, Copy)]
pub struct FitInput<'a> {
    /// Class labels, one per row.
    pub y: &'a [Label],
    /// Number of classes of the task.
    pub num_classes: usize,
    /// Per-row, per-output gradients of the current running prediction.
    pub gradient: ArrayView2<'a, Score>,
    /// Per-row, per-output hessians of the current running prediction.
    pub hessian: ArrayView2<'a, Score>,
    /// Empirical class frequencies over the whole training set.
    pub prior: &'a [f32],
    /// Restrict the search to the active party for this round.
    pub use_only_active_party: bool,
}

impl<'a> FitInput<'a> {
    /// Number of training rows.
    pub fn num_row(&self) -> usize {
        self.y.len()
    }
}

/// A tree-fitting routine for one training algorithm.
///
/// Implementations own the split-search protocol. The trees they return must
/// satisfy the partition invariant and carry disclosure flags that the
/// extraction engine can trust.
pub trait TreeFitter: Debug {
    /// Algorithm tag stamped on every tree this fitter grows.
    fn algorithm(&self) -> TrainingAlgorithm;

    /// Grow one tree over all rows of `input`.
    fn fit(&self, parties: &mut [Party], input: &FitInput<'_>) -> Result<Tree>;
}
