//! Tree-growth parameters shared by the boosting and bagging configurations.

use crate::config::override_from;
use crate::core::constants::*;
use crate::core::error::{LeakageError, Result};
use crate::core::types::PartyId;
use serde::{Deserialize, Serialize};

/// Parameters consumed by the split-search collaborator for every tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Fraction of each party's columns sampled per tree
    pub subsample_cols: f32,
    /// Minimum hessian sum in each child (gradient trees only)
    #[serde(with = "unbounded_float")]
    pub min_child_weight: f32,
    /// Maximum depth; the root sits at depth 0
    pub depth: usize,
    /// Minimum number of samples in each child
    pub min_leaf: usize,
    /// L2 regularisation on leaf weights
    pub lambda: f32,
    /// Gain penalty per split
    pub gamma: f32,
    /// Quantile step for candidate thresholds, in (0, 1]
    pub eps: f32,
    /// Mutual-information budget before a split must move to the active party
    #[serde(with = "unbounded_float")]
    pub mi_bound: f32,
    /// Party holding the labels
    pub active_party_id: PartyId,
    /// Number of split-search workers
    pub n_job: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            subsample_cols: DEFAULT_SUBSAMPLE_COLS,
            min_child_weight: DEFAULT_MIN_CHILD_WEIGHT,
            depth: DEFAULT_DEPTH,
            min_leaf: DEFAULT_MIN_LEAF,
            lambda: DEFAULT_LAMBDA,
            gamma: DEFAULT_GAMMA,
            eps: DEFAULT_EPS,
            mi_bound: DEFAULT_MI_BOUND,
            active_party_id: DEFAULT_ACTIVE_PARTY_ID,
            n_job: DEFAULT_N_JOB,
        }
    }
}

impl TreeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the tree parameters.
    ///
    /// `lambda == 0` is accepted with a warning: leaf weights and gains become
    /// non-finite as soon as a node's hessian sum reaches zero.
    pub fn validate(&self) -> Result<()> {
        if !(self.subsample_cols > 0.0 && self.subsample_cols <= 1.0) {
            return Err(LeakageError::invalid_parameter(
                "subsample_cols",
                self.subsample_cols.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if self.min_leaf == 0 {
            return Err(LeakageError::invalid_parameter(
                "min_leaf",
                self.min_leaf.to_string(),
                "must be at least 1",
            ));
        }

        if self.lambda.is_nan() || self.lambda < 0.0 {
            return Err(LeakageError::invalid_parameter(
                "lambda",
                self.lambda.to_string(),
                "must be non-negative",
            ));
        }
        if self.lambda == 0.0 {
            log::warn!("lambda is 0; empty hessian sums will produce non-finite leaf weights");
        }

        if self.gamma.is_nan() {
            return Err(LeakageError::invalid_parameter(
                "gamma",
                self.gamma.to_string(),
                "must be a number",
            ));
        }

        if !(self.eps > 0.0 && self.eps <= 1.0) {
            return Err(LeakageError::invalid_parameter(
                "eps",
                self.eps.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }

        if self.mi_bound.is_nan() || self.mi_bound < 0.0 {
            return Err(LeakageError::invalid_parameter(
                "mi_bound",
                self.mi_bound.to_string(),
                "must be non-negative",
            ));
        }

        if self.active_party_id < 0 {
            return Err(LeakageError::invalid_parameter(
                "active_party_id",
                self.active_party_id.to_string(),
                "must name a party",
            ));
        }

        if self.n_job == 0 {
            return Err(LeakageError::invalid_parameter(
                "n_job",
                self.n_job.to_string(),
                "must be at least 1",
            ));
        }
        let cores = num_cpus::get();
        if self.n_job > cores {
            log::warn!(
                "n_job = {} exceeds the {} available cores",
                self.n_job,
                cores
            );
        }

        Ok(())
    }

    /// Apply `VFL_LEAKAGE_*` overrides found through `lookup`.
    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(lookup, "VFL_LEAKAGE_SUBSAMPLE_COLS", &mut self.subsample_cols)?;
        override_from(lookup, "VFL_LEAKAGE_DEPTH", &mut self.depth)?;
        override_from(lookup, "VFL_LEAKAGE_MIN_LEAF", &mut self.min_leaf)?;
        override_from(lookup, "VFL_LEAKAGE_LAMBDA", &mut self.lambda)?;
        override_from(lookup, "VFL_LEAKAGE_GAMMA", &mut self.gamma)?;
        override_from(lookup, "VFL_LEAKAGE_MI_BOUND", &mut self.mi_bound)?;
        override_from(lookup, "VFL_LEAKAGE_ACTIVE_PARTY_ID", &mut self.active_party_id)?;
        override_from(lookup, "VFL_LEAKAGE_N_JOB", &mut self.n_job)?;
        Ok(())
    }
}

/// Serde adapter for floats whose defaults are infinite.
///
/// JSON has no infinity literal, so non-finite values travel as the strings
/// `"inf"`, `"-inf"` and `"nan"`.
mod unbounded_float {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f32),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => text
                .trim()
                .parse::<f32>()
                .map_err(|_| serde::de::Error::custom(format!("invalid float {:?}", text))),
        }
    }
}

/// Validation messages gathered by the fluent builders.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuilderErrors(Vec<String>);

impl BuilderErrors {
    pub(crate) fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    pub(crate) fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(LeakageError::config(format!(
                "Configuration validation failed: {}",
                self.0.join(", ")
            )))
        }
    }
}

/// Builder methods shared by every config that embeds a [`TreeConfig`].
macro_rules! tree_builder_methods {
    () => {
        /// Set the column subsampling fraction
        pub fn subsample_cols(mut self, fraction: f32) -> Self {
            self.errors.check(
                fraction > 0.0 && fraction <= 1.0,
                "subsample_cols must be in range (0.0, 1.0]",
            );
            self.config.tree.subsample_cols = fraction;
            self
        }

        /// Set the minimum child hessian sum
        pub fn min_child_weight(mut self, weight: f32) -> Self {
            self.config.tree.min_child_weight = weight;
            self
        }

        /// Set the maximum depth
        pub fn depth(mut self, depth: usize) -> Self {
            self.config.tree.depth = depth;
            self
        }

        /// Set the minimum leaf size
        pub fn min_leaf(mut self, min_leaf: usize) -> Self {
            self.errors.check(min_leaf >= 1, "min_leaf must be at least 1");
            self.config.tree.min_leaf = min_leaf;
            self
        }

        /// Set the L2 regularisation
        pub fn lambda(mut self, lambda: f32) -> Self {
            self.errors.check(lambda >= 0.0, "lambda must be non-negative");
            self.config.tree.lambda = lambda;
            self
        }

        /// Set the gain penalty
        pub fn gamma(mut self, gamma: f32) -> Self {
            self.config.tree.gamma = gamma;
            self
        }

        /// Set the threshold quantile step
        pub fn eps(mut self, eps: f32) -> Self {
            self.errors
                .check(eps > 0.0 && eps <= 1.0, "eps must be in range (0.0, 1.0]");
            self.config.tree.eps = eps;
            self
        }

        /// Set the mutual-information disclosure budget
        pub fn mi_bound(mut self, bound: f32) -> Self {
            self.errors.check(bound >= 0.0, "mi_bound must be non-negative");
            self.config.tree.mi_bound = bound;
            self
        }

        /// Set the active party
        pub fn active_party_id(mut self, party_id: $crate::core::types::PartyId) -> Self {
            self.config.tree.active_party_id = party_id;
            self
        }

        /// Set the number of split-search workers
        pub fn n_job(mut self, n_job: usize) -> Self {
            self.errors.check(n_job >= 1, "n_job must be at least 1");
            self.config.tree.n_job = n_job;
            self
        }
    };
}

pub(crate) use tree_builder_methods;
