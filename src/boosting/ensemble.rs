//! Ordered collection of fitted trees.
//!
//! Boosting ensembles scale every tree by the learning rate; bagging
//! ensembles are stored with a learning rate of `1.0` and averaged by the
//! forest classifier.

use crate::core::error::{LeakageError, Result};
use crate::core::types::{Score, TrainingAlgorithm};
use crate::tree::Tree;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trees in training order plus the shrinkage and the algorithm tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ensemble {
    trees: Vec<Tree>,
    learning_rate: f32,
    algorithm: TrainingAlgorithm,
}

impl Ensemble {
    /// Creates an empty ensemble.
    pub fn new(algorithm: TrainingAlgorithm, learning_rate: f32) -> Self {
        Ensemble {
            trees: Vec::new(),
            learning_rate,
            algorithm,
        }
    }

    /// Builds an ensemble from already fitted trees.
    pub fn from_trees(
        algorithm: TrainingAlgorithm,
        learning_rate: f32,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        let mut ensemble = Ensemble::new(algorithm, learning_rate);
        for tree in trees {
            ensemble.push(tree)?;
        }
        Ok(ensemble)
    }

    /// Appends a tree. Its tag and training-set size must match the ensemble.
    pub fn push(&mut self, tree: Tree) -> Result<()> {
        if tree.algorithm() != self.algorithm {
            return Err(crate::training_error!(
                "cannot add a {} tree to a {} ensemble",
                tree.algorithm(),
                self.algorithm
            ));
        }
        if let Some(num_row) = self.num_row() {
            if tree.num_row() != num_row {
                return Err(LeakageError::dimension_mismatch(
                    format!("{} training rows", num_row),
                    format!("{} training rows", tree.num_row()),
                ));
            }
        }
        self.trees.push(tree);
        Ok(())
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Mutable access, used by the consuming free-rider extraction.
    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn algorithm(&self) -> TrainingAlgorithm {
        self.algorithm
    }

    /// Training-set size of the first tree.
    pub fn num_row(&self) -> Option<usize> {
        self.trees.first().map(Tree::num_row)
    }

    /// Removes every tree.
    pub fn clear(&mut self) {
        self.trees.clear();
    }

    /// `learning_rate * Σ tree(x)`, or `None` for an empty ensemble.
    pub fn scaled_sum(&self, x: ArrayView2<'_, f32>) -> Result<Option<Array2<Score>>> {
        let (first, rest) = match self.trees.split_first() {
            Some(split) => split,
            None => return Ok(None),
        };
        let mut sum = first.predict(x)?;
        for tree in rest {
            sum += &tree.predict(x)?;
        }
        sum *= self.learning_rate;
        Ok(Some(sum))
    }

    /// Serializes the ensemble to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores an ensemble from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the ensemble as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reads an ensemble written by [`Ensemble::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
