//! Bagging-ensemble configuration.

use crate::config::core::{tree_builder_methods, BuilderErrors, TreeConfig};
use crate::config::{override_from, process_env};
use crate::core::constants::DEFAULT_NUM_TREES;
use crate::core::error::{LeakageError, Result};
use crate::core::types::TrainingAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of a RandomForest / SecureForest training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Bagging algorithm tag stamped on every tree
    pub algorithm: TrainingAlgorithm,
    /// Number of classes of the task
    pub num_classes: usize,
    /// Number of trees in the ensemble
    pub num_trees: usize,
    /// Tree growth parameters; `lambda`, `gamma` and `min_child_weight` are unused
    pub tree: TreeConfig,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            algorithm: TrainingAlgorithm::RandomForest,
            num_classes: 2,
            num_trees: DEFAULT_NUM_TREES,
            tree: TreeConfig::default(),
        }
    }
}

impl ForestConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.algorithm.is_bagging() {
            return Err(LeakageError::invalid_parameter(
                "algorithm",
                self.algorithm.to_string(),
                "must be a bagging algorithm",
            ));
        }
        if self.num_classes < 2 {
            return Err(LeakageError::invalid_parameter(
                "num_classes",
                self.num_classes.to_string(),
                "must be at least 2",
            ));
        }
        if self.num_trees == 0 {
            return Err(LeakageError::invalid_parameter(
                "num_trees",
                "0",
                "must be at least 1",
            ));
        }
        self.tree.validate()
    }

    /// Load and validate a configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = crate::config::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::config::save_to_file(self, path)
    }

    /// Apply `VFL_LEAKAGE_*` environment variables on top of this configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        override_from(&process_env, "VFL_LEAKAGE_NUM_TREES", &mut self.num_trees)?;
        override_from(&process_env, "VFL_LEAKAGE_NUM_CLASSES", &mut self.num_classes)?;
        self.tree.apply_overrides_from(&process_env)?;
        self.validate()
    }
}

/// Fluent builder for [`ForestConfig`]
#[derive(Debug, Clone, Default)]
pub struct ForestConfigBuilder {
    config: ForestConfig,
    errors: BuilderErrors,
}

impl ForestConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bagging algorithm tag
    pub fn algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.errors.check(
            algorithm.is_bagging(),
            "algorithm must be randomforest or secureforest",
        );
        self.config.algorithm = algorithm;
        self
    }

    /// Set the number of classes
    pub fn num_classes(mut self, num_classes: usize) -> Self {
        self.config.num_classes = num_classes;
        self
    }

    /// Set the number of trees
    pub fn num_trees(mut self, num_trees: usize) -> Self {
        self.errors.check(num_trees >= 1, "num_trees must be at least 1");
        self.config.num_trees = num_trees;
        self
    }

    tree_builder_methods!();

    /// Build the configuration
    pub fn build(self) -> Result<ForestConfig> {
        self.errors.into_result()?;
        self.config.validate()?;
        Ok(self.config)
    }
}
