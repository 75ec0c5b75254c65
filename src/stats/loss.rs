//! Cross-entropy losses used by the boosting engine.
//!
//! The loss is picked once from the number of classes: two classes use binary
//! cross-entropy on a single raw score column, more classes use categorical
//! cross-entropy on one raw score column per class.

use crate::core::types::{Label, Score};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Lower clamp applied to probabilities inside `log` to keep the loss finite.
const PROBABILITY_FLOOR: f32 = 1e-12;

/// Logistic function.
pub fn sigmoid(x: Score) -> Score {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax of one row of raw scores.
pub fn softmax(raw: &[Score]) -> Vec<Score> {
    let max_score = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp_scores: Vec<Score> = raw.iter().map(|&s| (s - max_score).exp()).collect();
    let sum_exp: Score = exp_scores.iter().sum();
    exp_scores.into_iter().map(|e| e / sum_exp).collect()
}

/// Loss function selected at model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossFunction {
    /// Binary cross-entropy over a single raw score.
    BinaryCrossEntropy,
    /// Categorical cross-entropy over `num_classes` raw scores.
    CrossEntropy { num_classes: usize },
}

impl LossFunction {
    /// Pick the loss for a task with `num_classes` classes.
    pub fn for_num_classes(num_classes: usize) -> Self {
        if num_classes == 2 {
            LossFunction::BinaryCrossEntropy
        } else {
            LossFunction::CrossEntropy { num_classes }
        }
    }

    /// Width of the raw score matrix this loss works on.
    pub fn pred_dim(&self) -> usize {
        match self {
            LossFunction::BinaryCrossEntropy => 1,
            LossFunction::CrossEntropy { num_classes } => *num_classes,
        }
    }

    /// Gradient of the loss with respect to the raw scores.
    pub fn grad(&self, y_pred: ArrayView2<'_, Score>, y: &[Label]) -> Array2<Score> {
        let mut grad = Array2::zeros(y_pred.raw_dim());
        match self {
            LossFunction::BinaryCrossEntropy => {
                for (i, &label) in y.iter().enumerate() {
                    grad[[i, 0]] = sigmoid(y_pred[[i, 0]]) - label;
                }
            }
            LossFunction::CrossEntropy { num_classes } => {
                for (i, &label) in y.iter().enumerate() {
                    let row: Vec<Score> = y_pred.row(i).to_vec();
                    let proba = softmax(&row);
                    for c in 0..*num_classes {
                        let target = if label as usize == c { 1.0 } else { 0.0 };
                        grad[[i, c]] = proba[c] - target;
                    }
                }
            }
        }
        grad
    }

    /// Diagonal hessian of the loss with respect to the raw scores.
    ///
    /// Always `p * (1 - p)`, strictly positive while scores stay finite.
    pub fn hess(&self, y_pred: ArrayView2<'_, Score>, y: &[Label]) -> Array2<Score> {
        let mut hess = Array2::zeros(y_pred.raw_dim());
        match self {
            LossFunction::BinaryCrossEntropy => {
                for i in 0..y.len() {
                    let p = sigmoid(y_pred[[i, 0]]);
                    hess[[i, 0]] = p * (1.0 - p);
                }
            }
            LossFunction::CrossEntropy { num_classes } => {
                for i in 0..y.len() {
                    let row: Vec<Score> = y_pred.row(i).to_vec();
                    let proba = softmax(&row);
                    for c in 0..*num_classes {
                        hess[[i, c]] = proba[c] * (1.0 - proba[c]);
                    }
                }
            }
        }
        hess
    }

    /// Mean loss over all rows.
    pub fn loss(&self, y_pred: ArrayView2<'_, Score>, y: &[Label]) -> f32 {
        if y.is_empty() {
            return 0.0;
        }
        let total: f32 = match self {
            LossFunction::BinaryCrossEntropy => y
                .iter()
                .enumerate()
                .map(|(i, &label)| {
                    let p = sigmoid(y_pred[[i, 0]]);
                    -(label * p.max(PROBABILITY_FLOOR).ln()
                        + (1.0 - label) * (1.0 - p).max(PROBABILITY_FLOOR).ln())
                })
                .sum(),
            LossFunction::CrossEntropy { .. } => y
                .iter()
                .enumerate()
                .map(|(i, &label)| {
                    let row: Vec<Score> = y_pred.row(i).to_vec();
                    let proba = softmax(&row);
                    -proba[label as usize].max(PROBABILITY_FLOOR).ln()
                })
                .sum(),
        };
        total / y.len() as f32
    }
}
