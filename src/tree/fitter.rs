//! Plaintext split-search collaborators.
//!
//! Both fitters resample each party's columns, then grow one tree with the
//! breadth-first grower. They differ in the split criterion and in what a
//! leaf stores: Newton-step weights for the boosting algorithms, class
//! frequencies for the bagging algorithms. The secure variants share the
//! plaintext search and only change the algorithm tag.

use crate::config::TreeConfig;
use crate::core::error::{LeakageError, Result};
use crate::core::traits::{FitInput, TreeFitter};
use crate::core::types::{Label, RowIndex, Score, TrainingAlgorithm};
use crate::stats::compute_weight;
use crate::tree::criterion::{GiniCriterion, GradientCriterion};
use crate::tree::grower::{GrowthParams, LabelInfo, TreeGrower};
use crate::tree::party::Party;
use crate::tree::tree::Tree;

fn growth_params(config: &TreeConfig, use_only_active_party: bool) -> GrowthParams {
    GrowthParams {
        depth: config.depth,
        eps: config.eps,
        mi_bound: config.mi_bound,
        active_party_id: config.active_party_id,
        use_only_active_party,
        n_job: config.n_job,
    }
}

/// Checks that every label is a whole class id in `[0, num_classes)`.
/// NaN and fractional labels are rejected.
pub fn validate_labels(y: &[Label], num_classes: usize) -> Result<()> {
    if let Some(label) = y
        .iter()
        .find(|&&l| !l.is_finite() || l < 0.0 || l.fract() != 0.0 || l as usize >= num_classes)
    {
        return Err(LeakageError::invalid_parameter(
            "y",
            label.to_string(),
            format!("labels must be class ids below {}", num_classes),
        ));
    }
    Ok(())
}

fn check_labels(input: &FitInput<'_>) -> Result<()> {
    if input.num_row() == 0 {
        return Err(LeakageError::config("cannot fit a tree on zero rows"));
    }
    if input.prior.len() != input.num_classes {
        return Err(LeakageError::dimension_mismatch(
            format!("{} prior entries", input.num_classes),
            format!("{} prior entries", input.prior.len()),
        ));
    }
    validate_labels(input.y, input.num_classes)
}

/// Greedy second-order tree search for XGBoost and SecureBoost.
#[derive(Debug, Clone)]
pub struct GreedyTreeFitter {
    config: TreeConfig,
    algorithm: TrainingAlgorithm,
}

impl GreedyTreeFitter {
    pub fn new(config: TreeConfig) -> Self {
        GreedyTreeFitter {
            config,
            algorithm: TrainingAlgorithm::XGBoost,
        }
    }

    /// Tag grown trees with a different boosting algorithm.
    pub fn with_algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }
}

impl TreeFitter for GreedyTreeFitter {
    fn algorithm(&self) -> TrainingAlgorithm {
        self.algorithm
    }

    fn fit(&self, parties: &mut [Party], input: &FitInput<'_>) -> Result<Tree> {
        check_labels(input)?;
        let num_row = input.num_row();
        if input.gradient.nrows() != num_row || input.hessian.dim() != input.gradient.dim() {
            return Err(LeakageError::dimension_mismatch(
                format!("{} x {} gradient and hessian", num_row, input.gradient.ncols()),
                format!(
                    "{:?} gradient, {:?} hessian",
                    input.gradient.dim(),
                    input.hessian.dim()
                ),
            ));
        }

        for party in parties.iter_mut() {
            party.subsample_columns_with(self.config.subsample_cols);
        }

        let config = &self.config;
        let criterion = GradientCriterion::new(
            input.gradient,
            input.hessian,
            config.lambda,
            config.gamma,
            config.min_child_weight,
            config.min_leaf,
        );
        let labels = LabelInfo {
            y: input.y,
            num_classes: input.num_classes,
            prior: input.prior,
        };
        let (gradient, hessian, lambda) = (input.gradient, input.hessian, config.lambda);
        TreeGrower::new(
            parties,
            &criterion,
            labels,
            growth_params(config, input.use_only_active_party),
        )
        .grow(
            |idxs: &[RowIndex]| compute_weight(idxs.len(), gradient, hessian, idxs, lambda),
            self.algorithm,
        )
    }
}

/// Gini-impurity tree search for RandomForest and SecureForest.
#[derive(Debug, Clone)]
pub struct ForestTreeFitter {
    config: TreeConfig,
    algorithm: TrainingAlgorithm,
}

impl ForestTreeFitter {
    pub fn new(config: TreeConfig) -> Self {
        ForestTreeFitter {
            config,
            algorithm: TrainingAlgorithm::RandomForest,
        }
    }

    /// Tag grown trees with a different bagging algorithm.
    pub fn with_algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }
}

/// Class frequencies of the rows in `idxs`.
pub fn class_frequencies(y: &[Label], num_classes: usize, idxs: &[RowIndex]) -> Vec<Score> {
    let mut counts = vec![0.0; num_classes];
    for &row in idxs {
        counts[y[row] as usize] += 1.0;
    }
    if idxs.is_empty() {
        return counts;
    }
    let n = idxs.len() as Score;
    counts.into_iter().map(|c| c / n).collect()
}

impl TreeFitter for ForestTreeFitter {
    fn algorithm(&self) -> TrainingAlgorithm {
        self.algorithm
    }

    /// Gradient and hessian in `input` are ignored.
    fn fit(&self, parties: &mut [Party], input: &FitInput<'_>) -> Result<Tree> {
        check_labels(input)?;
        for party in parties.iter_mut() {
            party.subsample_columns_with(self.config.subsample_cols);
        }

        let criterion = GiniCriterion::new(input.y, input.num_classes, self.config.min_leaf);
        let labels = LabelInfo {
            y: input.y,
            num_classes: input.num_classes,
            prior: input.prior,
        };
        let (y, num_classes) = (input.y, input.num_classes);
        TreeGrower::new(
            parties,
            &criterion,
            labels,
            growth_params(&self.config, input.use_only_active_party),
        )
        .grow(
            |idxs: &[RowIndex]| class_frequencies(y, num_classes, idxs),
            self.algorithm,
        )
    }
}
