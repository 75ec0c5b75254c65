//! Boosting-engine configuration.

use crate::config::core::{tree_builder_methods, BuilderErrors, TreeConfig};
use crate::config::{override_from, process_env};
use crate::core::constants::*;
use crate::core::error::{LeakageError, Result};
use crate::core::types::TrainingAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of an XGBoost / SecureBoost training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Boosting algorithm tag stamped on every tree
    pub algorithm: TrainingAlgorithm,
    /// Number of classes of the task
    pub num_classes: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f32,
    /// Number of trees to grow
    pub boosting_rounds: usize,
    /// Rounds with index below this value use only the active party
    pub completely_secure_round: usize,
    /// Constant baseline raw score
    pub init_value: f32,
    /// Record the training loss after each round
    pub save_loss: bool,
    /// Tree growth parameters
    pub tree: TreeConfig,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        BoostingConfig {
            algorithm: TrainingAlgorithm::XGBoost,
            num_classes: 2,
            learning_rate: DEFAULT_LEARNING_RATE,
            boosting_rounds: DEFAULT_BOOSTING_ROUNDS,
            completely_secure_round: 0,
            init_value: DEFAULT_INIT_VALUE,
            save_loss: true,
            tree: TreeConfig::default(),
        }
    }
}

impl BoostingConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.algorithm.is_boosting() {
            return Err(LeakageError::invalid_parameter(
                "algorithm",
                self.algorithm.to_string(),
                "must be a boosting algorithm",
            ));
        }

        if self.num_classes < 2 {
            return Err(LeakageError::invalid_parameter(
                "num_classes",
                self.num_classes.to_string(),
                "must be at least 2",
            ));
        }

        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(LeakageError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be positive and finite",
            ));
        }

        if self.completely_secure_round > self.boosting_rounds {
            log::warn!(
                "completely_secure_round = {} exceeds boosting_rounds = {}; every round uses only the active party",
                self.completely_secure_round,
                self.boosting_rounds
            );
        }

        self.tree.validate()
    }

    /// Raw score width: one column for binary tasks, one per class otherwise.
    pub fn pred_dim(&self) -> usize {
        if self.num_classes == 2 {
            1
        } else {
            self.num_classes
        }
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

    /// Build a configuration from defaults plus environment variables
    pub fn load_from_environment() -> Result<Self> {
        let mut config = Self::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Apply `VFL_LEAKAGE_*` environment variables on top of this configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(&process_env)
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(lookup, "VFL_LEAKAGE_LEARNING_RATE", &mut self.learning_rate)?;
        override_from(lookup, "VFL_LEAKAGE_BOOSTING_ROUNDS", &mut self.boosting_rounds)?;
        override_from(
            lookup,
            "VFL_LEAKAGE_COMPLETELY_SECURE_ROUND",
            &mut self.completely_secure_round,
        )?;
        override_from(lookup, "VFL_LEAKAGE_NUM_CLASSES", &mut self.num_classes)?;
        override_from(lookup, "VFL_LEAKAGE_SAVE_LOSS", &mut self.save_loss)?;
        self.tree.apply_overrides_from(lookup)?;
        self.validate()
    }
}

/// Fluent builder for [`BoostingConfig`]
#[derive(Debug, Clone, Default)]
pub struct BoostingConfigBuilder {
    config: BoostingConfig,
    errors: BuilderErrors,
}

impl BoostingConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the boosting algorithm tag
    pub fn algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.errors.check(
            algorithm.is_boosting(),
            "algorithm must be xgboost or secureboost",
        );
        self.config.algorithm = algorithm;
        self
    }

    /// Set the number of classes
    pub fn num_classes(mut self, num_classes: usize) -> Self {
        self.errors
            .check(num_classes >= 2, "num_classes must be at least 2");
        self.config.num_classes = num_classes;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f32) -> Self {
        self.errors.check(rate > 0.0, "learning_rate must be positive");
        self.config.learning_rate = rate;
        self
    }

    /// Set the number of boosting rounds
    pub fn boosting_rounds(mut self, rounds: usize) -> Self {
        self.config.boosting_rounds = rounds;
        self
    }

    /// Set how many leading rounds use only the active party
    pub fn completely_secure_round(mut self, rounds: usize) -> Self {
        self.config.completely_secure_round = rounds;
        self
    }

    /// Set the constant baseline
    pub fn init_value(mut self, value: f32) -> Self {
        self.config.init_value = value;
        self
    }

    /// Enable or disable loss recording
    pub fn save_loss(mut self, save: bool) -> Self {
        self.config.save_loss = save;
        self
    }

    tree_builder_methods!();

    /// Build the configuration
    pub fn build(self) -> Result<BoostingConfig> {
        self.errors.into_result()?;
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boosting_config_default() {
        let config = BoostingConfig::default();
        assert_eq!(config.learning_rate, 0.4);
        assert_eq!(config.boosting_rounds, 5);
        assert_eq!(config.init_value, 1.0);
        assert!(config.save_loss);
        assert_eq!(config.pred_dim(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_boosting_config_builder() {
        let config = BoostingConfigBuilder::new()
            .algorithm(TrainingAlgorithm::SecureBoost)
            .num_classes(3)
            .learning_rate(0.1)
            .boosting_rounds(10)
            .depth(3)
            .min_leaf(2)
            .build()
            .unwrap();
        assert_eq!(config.algorithm, TrainingAlgorithm::SecureBoost);
        assert_eq!(config.pred_dim(), 3);
        assert_eq!(config.tree.depth, 3);
        assert_eq!(config.tree.min_leaf, 2);
    }

    #[test]
    fn test_boosting_config_builder_validation() {
        assert!(BoostingConfigBuilder::new().learning_rate(-1.0).build().is_err());
        assert!(BoostingConfigBuilder::new()
            .algorithm(TrainingAlgorithm::RandomForest)
            .build()
            .is_err());
        assert!(BoostingConfigBuilder::new().num_classes(1).build().is_err());
        assert!(BoostingConfigBuilder::new().subsample_cols(0.0).build().is_err());
    }

    #[test]
    fn test_boosting_config_overrides() {
        let lookup = |key: &str| match key {
            "VFL_LEAKAGE_BOOSTING_ROUNDS" => Some("12".to_string()),
            "VFL_LEAKAGE_MIN_LEAF" => Some("1".to_string()),
            _ => None,
        };
        let mut config = BoostingConfig::default();
        config.apply_overrides_from(&lookup).unwrap();
        assert_eq!(config.boosting_rounds, 12);
        assert_eq!(config.tree.min_leaf, 1);
    }
}
