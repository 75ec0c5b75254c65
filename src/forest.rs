//! Bagging ensemble for RandomForest and SecureForest.
//!
//! Every tree is fitted on all rows with its own column subsample, so each
//! tree still partitions the full training set. Probabilities are the mean of
//! the leaves' class frequencies.

use crate::boosting::Ensemble;
use crate::config::ForestConfig;
use crate::core::error::{LeakageError, Result};
use crate::core::traits::{FitInput, TreeFitter};
use crate::core::types::{Label, Score};
use crate::tree::{class_frequencies, validate_labels, ForestTreeFitter, Party, Tree};
use ndarray::{Array2, ArrayView2};

/// Random-forest classifier over vertically partitioned parties.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier<F: TreeFitter = ForestTreeFitter> {
    config: ForestConfig,
    fitter: F,
    ensemble: Ensemble,
}

impl RandomForestClassifier<ForestTreeFitter> {
    /// Creates a forest using the plaintext Gini split search.
    pub fn new(config: ForestConfig) -> Result<Self> {
        let fitter = ForestTreeFitter::new(config.tree.clone()).with_algorithm(config.algorithm);
        Self::with_fitter(config, fitter)
    }
}

impl<F: TreeFitter> RandomForestClassifier<F> {
    /// Creates a forest delegating tree growth to `fitter`.
    pub fn with_fitter(config: ForestConfig, fitter: F) -> Result<Self> {
        config.validate()?;
        if fitter.algorithm() != config.algorithm {
            return Err(LeakageError::config(format!(
                "fitter grows {} trees but the forest is configured for {}",
                fitter.algorithm(),
                config.algorithm
            )));
        }
        Ok(RandomForestClassifier {
            ensemble: Ensemble::new(config.algorithm, 1.0),
            config,
            fitter,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn estimators(&self) -> &[Tree] {
        self.ensemble.trees()
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn ensemble_mut(&mut self) -> &mut Ensemble {
        &mut self.ensemble
    }

    pub fn into_ensemble(self) -> Ensemble {
        self.ensemble
    }

    /// Fits `num_trees` trees, replacing any previous ones.
    pub fn fit(&mut self, parties: &mut [Party], y: &[Label]) -> Result<()> {
        let num_row = y.len();
        if num_row == 0 {
            return Err(LeakageError::config("cannot train on zero rows"));
        }
        let num_classes = self.config.num_classes;
        let all_rows: Vec<usize> = (0..num_row).collect();
        validate_labels(y, num_classes)?;
        let prior = class_frequencies(y, num_classes, &all_rows);
        let unused = Array2::<Score>::zeros((0, 0));

        log::info!(
            "Starting {} training: {} trees, {} rows, {} parties",
            self.config.algorithm,
            self.config.num_trees,
            num_row,
            parties.len()
        );

        self.ensemble.clear();
        for index in 0..self.config.num_trees {
            let input = FitInput {
                y,
                num_classes,
                gradient: unused.view(),
                hessian: unused.view(),
                prior: &prior,
                use_only_active_party: false,
            };
            let tree = self.fitter.fit(parties, &input)?;
            log::debug!("tree {}: {}", index, tree);
            self.ensemble.push(tree)?;
        }

        log::info!("Training completed with {} trees", self.ensemble.len());
        Ok(())
    }

    /// Mean leaf class frequencies; uniform when no tree is fitted.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>) -> Result<Array2<Score>> {
        let num_classes = self.config.num_classes;
        Ok(match self.ensemble.scaled_sum(x)? {
            Some(sum) => sum / self.ensemble.len() as Score,
            None => Array2::from_elem((x.nrows(), num_classes), 1.0 / num_classes as Score),
        })
    }
}
