//! Gradient boosting over vertically partitioned parties.
//!
//! Training runs `Init → (GrowTree → Accumulate)* → Done`:
//!
//! - **Init**: every row starts at `init_value`; trees already loaded into
//!   the model are replayed on top of it.
//! - **GrowTree**: gradients and hessians of the running prediction are handed
//!   to the [`TreeFitter`] together with the class prior.
//! - **Accumulate**: the tree's training prediction, scaled by the learning
//!   rate, is added to the running prediction and the loss is optionally
//!   recorded.
//!
//! There is no early stopping; non-finite values propagate.

pub mod ensemble;

pub use ensemble::Ensemble;

use crate::config::BoostingConfig;
use crate::core::error::{LeakageError, Result};
use crate::core::traits::{FitInput, TreeFitter};
use crate::core::types::{Label, Score};
use crate::stats::{sigmoid, softmax, LossFunction};
use crate::tree::{class_frequencies, validate_labels, GreedyTreeFitter, Party, Tree};
use ndarray::{Array2, ArrayView2};

/// Boosted classifier for XGBoost and SecureBoost.
#[derive(Debug, Clone)]
pub struct Booster<F: TreeFitter = GreedyTreeFitter> {
    config: BoostingConfig,
    fitter: F,
    loss: LossFunction,
    ensemble: Ensemble,
    logging_loss: Vec<f32>,
}

impl Booster<GreedyTreeFitter> {
    /// Creates a booster using the plaintext greedy split search.
    pub fn new(config: BoostingConfig) -> Result<Self> {
        let fitter = GreedyTreeFitter::new(config.tree.clone()).with_algorithm(config.algorithm);
        Self::with_fitter(config, fitter)
    }
}

impl<F: TreeFitter> Booster<F> {
    /// Creates a booster delegating tree growth to `fitter`.
    pub fn with_fitter(config: BoostingConfig, fitter: F) -> Result<Self> {
        config.validate()?;
        if fitter.algorithm() != config.algorithm {
            return Err(LeakageError::config(format!(
                "fitter grows {} trees but the booster is configured for {}",
                fitter.algorithm(),
                config.algorithm
            )));
        }
        Ok(Booster {
            loss: LossFunction::for_num_classes(config.num_classes),
            ensemble: Ensemble::new(config.algorithm, config.learning_rate),
            logging_loss: Vec::new(),
            config,
            fitter,
        })
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn loss_function(&self) -> LossFunction {
        self.loss
    }

    /// Trees grown or loaded so far.
    pub fn estimators(&self) -> &[Tree] {
        self.ensemble.trees()
    }

    /// Loss after each training round, when `save_loss` is set.
    pub fn logging_loss(&self) -> &[f32] {
        &self.logging_loss
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

    /// Replaces the stored trees with previously fitted ones.
    pub fn load_estimators(&mut self, trees: Vec<Tree>) -> Result<()> {
        self.ensemble = Ensemble::from_trees(self.config.algorithm, self.config.learning_rate, trees)?;
        Ok(())
    }

    /// Drops all trees and recorded losses.
    pub fn clear(&mut self) {
        self.ensemble.clear();
        self.logging_loss.clear();
    }

    /// Runs `boosting_rounds` rounds on top of the trees already stored.
    pub fn fit(&mut self, parties: &mut [Party], y: &[Label]) -> Result<()> {
        let num_row = y.len();
        if num_row == 0 {
            return Err(LeakageError::config("cannot train on zero rows"));
        }
        let num_classes = self.config.num_classes;
        let all_rows: Vec<usize> = (0..num_row).collect();
        validate_labels(y, num_classes)?;
        let prior = class_frequencies(y, num_classes, &all_rows);

        log::info!(
            "Starting {} training: {} rounds, {} rows, {} parties, {} classes",
            self.config.algorithm,
            self.config.boosting_rounds,
            num_row,
            parties.len(),
            num_classes
        );

        let learning_rate = self.config.learning_rate;
        let mut base_pred =
            Array2::from_elem((num_row, self.loss.pred_dim()), self.config.init_value);
        for tree in self.ensemble.trees() {
            if tree.num_row() != num_row {
                return Err(LeakageError::dimension_mismatch(
                    format!("{} training rows", num_row),
                    format!("{} training rows in a stored tree", tree.num_row()),
                ));
            }
            base_pred.scaled_add(learning_rate, &tree.get_train_prediction()?);
        }

        for round in 0..self.config.boosting_rounds {
            let gradient = self.loss.grad(base_pred.view(), y);
            let hessian = self.loss.hess(base_pred.view(), y);
            let input = FitInput {
                y,
                num_classes,
                gradient: gradient.view(),
                hessian: hessian.view(),
                prior: &prior,
                use_only_active_party: self.config.completely_secure_round > round,
            };

            let tree = self.fitter.fit(parties, &input)?;
            base_pred.scaled_add(learning_rate, &tree.get_train_prediction()?);

            if self.config.save_loss {
                let loss = self.loss.loss(base_pred.view(), y);
                log::debug!("round {}: loss = {:.6}, leaves = {}", round, loss, tree.num_leaves());
                self.logging_loss.push(loss);
            } else {
                log::debug!("round {}: leaves = {}", round, tree.num_leaves());
            }
            self.ensemble.push(tree)?;
        }

        log::info!("Training completed with {} trees", self.ensemble.len());
        Ok(())
    }

    /// `init_value + learning_rate * Σ tree(x)`; one column for binary tasks.
    pub fn predict_raw(&self, x: ArrayView2<'_, f32>) -> Result<Array2<Score>> {
        let mut raw = Array2::from_elem((x.nrows(), self.loss.pred_dim()), self.config.init_value);
        if let Some(sum) = self.ensemble.scaled_sum(x)? {
            raw += &sum;
        }
        Ok(raw)
    }

    /// Class probabilities, one column per class.
    ///
    /// An untrained model predicts the uniform distribution.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>) -> Result<Array2<Score>> {
        let num_classes = self.config.num_classes;
        if self.ensemble.is_empty() {
            return Ok(Array2::from_elem((x.nrows(), num_classes), 1.0 / num_classes as Score));
        }

        let raw = self.predict_raw(x)?;
        let mut proba = Array2::zeros((x.nrows(), num_classes));
        match self.loss {
            LossFunction::BinaryCrossEntropy => {
                for i in 0..x.nrows() {
                    let p1 = sigmoid(raw[[i, 0]]);
                    proba[[i, 0]] = 1.0 - p1;
                    proba[[i, 1]] = p1;
                }
            }
            LossFunction::CrossEntropy { .. } => {
                for (i, row) in raw.outer_iter().enumerate() {
                    for (c, p) in softmax(&row.to_vec()).into_iter().enumerate() {
                        proba[[i, c]] = p;
                    }
                }
            }
        }
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoostingConfigBuilder;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn data() -> (Array2<f32>, Vec<Label>) {
        let x = array![
            [0.0_f32, 1.0],
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.0],
            [4.0, 1.0],
            [5.0, 0.0],
            [6.0, 1.0],
            [7.0, 0.0]
        ];
        let y = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    fn config(rounds: usize) -> BoostingConfig {
        BoostingConfigBuilder::new()
            .boosting_rounds(rounds)
            .min_leaf(1)
            .depth(2)
            .gamma(0.0)
            .subsample_cols(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_untrained_predicts_uniform() {
        let (x, _) = data();
        let booster = Booster::new(config(1)).unwrap();
        let proba = booster.predict_proba(x.view()).unwrap();
        assert_eq!(proba.dim(), (8, 2));
        assert!(proba.iter().all(|&p| p == 0.5));
    }

    #[test]
    fn test_fit_reduces_loss() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut booster = Booster::new(config(4)).unwrap();
        booster.fit(&mut parties, &y).unwrap();

        assert_eq!(booster.estimators().len(), 4);
        let losses = booster.logging_loss();
        assert_eq!(losses.len(), 4);
        assert!(losses[3] < losses[0]);
        for tree in booster.estimators() {
            assert!(tree.validate_partition().is_ok());
        }

        let proba = booster.predict_proba(x.view()).unwrap();
        assert!(proba[[0, 0]] > proba[[0, 1]]);
        assert!(proba[[7, 1]] > proba[[7, 0]]);
        assert_abs_diff_eq!(proba[[3, 0]] + proba[[3, 1]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_predict_raw_matches_training_replay() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut booster = Booster::new(config(3)).unwrap();
        booster.fit(&mut parties, &y).unwrap();

        let raw = booster.predict_raw(x.view()).unwrap();
        let mut replay = Array2::from_elem((8, 1), 1.0_f32);
        for tree in booster.estimators() {
            replay.scaled_add(0.4, &tree.get_train_prediction().unwrap());
        }
        for (a, b) in raw.iter().zip(replay.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_completely_secure_rounds_use_active_party() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![1], vec![0]], 1.0, 0).unwrap();
        let config = BoostingConfigBuilder::new()
            .boosting_rounds(2)
            .completely_secure_round(1)
            .min_leaf(1)
            .gamma(0.0)
            .build()
            .unwrap();
        let mut booster = Booster::new(config).unwrap();
        booster.fit(&mut parties, &y).unwrap();

        let first = &booster.estimators()[0];
        for node in first.nodes().iter().filter(|n| !n.is_leaf()) {
            assert_eq!(node.split().map(|s| s.party_id), Some(0));
        }
        let second = &booster.estimators()[1];
        assert_eq!(second.root().split().map(|s| s.party_id), Some(1));
    }

    #[test]
    fn test_zero_rows_is_error() {
        let x = Array2::<f32>::zeros((0, 1));
        let mut parties = Party::vertical_split(x.view(), &[vec![0]], 1.0, 0).unwrap();
        let mut booster = Booster::new(config(1)).unwrap();
        assert!(booster.fit(&mut parties, &[]).is_err());
    }

    #[test]
    fn test_multiclass_softmax() {
        let x = array![[0.0_f32], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut parties = Party::vertical_split(x.view(), &[vec![0]], 1.0, 0).unwrap();
        let config = BoostingConfigBuilder::new()
            .num_classes(3)
            .boosting_rounds(3)
            .min_leaf(1)
            .gamma(0.0)
            .build()
            .unwrap();
        let mut booster = Booster::new(config).unwrap();
        booster.fit(&mut parties, &y).unwrap();

        let proba = booster.predict_proba(x.view()).unwrap();
        assert_eq!(proba.dim(), (6, 3));
        for row in proba.outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
        assert!(proba[[0, 0]] > proba[[0, 2]]);
        assert!(proba[[5, 2]] > proba[[5, 0]]);
    }

    #[test]
    fn test_load_estimators_and_clear() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut trained = Booster::new(config(2)).unwrap();
        trained.fit(&mut parties, &y).unwrap();

        let mut restored = Booster::new(config(2)).unwrap();
        restored.load_estimators(trained.estimators().to_vec()).unwrap();
        assert_eq!(
            restored.predict_raw(x.view()).unwrap(),
            trained.predict_raw(x.view()).unwrap()
        );

        restored.clear();
        assert!(restored.estimators().is_empty());
        assert!(restored.logging_loss().is_empty());
    }

    #[test]
    fn test_predict_rejects_narrow_input() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut booster = Booster::new(config(1)).unwrap();
        booster.fit(&mut parties, &y).unwrap();

        let narrow = Array2::<f32>::zeros((1, 0));
        let err = booster.predict_raw(narrow.view()).unwrap_err();
        assert_eq!(err.category(), "dimension_mismatch");
        assert!(booster.predict_proba(narrow.view()).is_err());
    }

    #[test]
    fn test_fit_rejects_nan_and_fractional_labels() {
        let (x, mut y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut booster = Booster::new(config(1)).unwrap();

        y[2] = f32::NAN;
        let err = booster.fit(&mut parties, &y).unwrap_err();
        assert_eq!(err.category(), "invalid_parameter");
        y[2] = 0.5;
        assert!(booster.fit(&mut parties, &y).is_err());
        assert!(booster.estimators().is_empty());
    }

    #[test]
    fn test_fit_on_released_trees_is_error() {
        let (x, y) = data();
        let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 0).unwrap();
        let mut trained = Booster::new(config(2)).unwrap();
        trained.fit(&mut parties, &y).unwrap();

        let mut trees = trained.estimators().to_vec();
        for tree in &mut trees {
            for index in 0..tree.num_nodes() {
                tree.node_mut(index).unwrap().release();
            }
        }
        let mut resumed = Booster::new(config(1)).unwrap();
        resumed.load_estimators(trees).unwrap();
        let err = resumed.fit(&mut parties, &y).unwrap_err();
        assert_eq!(err.category(), "structure");
        assert!(resumed.predict_raw(x.view()).is_err());
    }
}
