//! Leakage-graph extraction parameters.

use crate::config::core::BuilderErrors;
use crate::config::{override_from, process_env};
use crate::core::constants::*;
use crate::core::error::{LeakageError, Result};
use crate::core::types::{AdversaryPolicy, PartyId, OMNISCIENT_PARTY_ID};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of one extraction run over a fitted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Analyse from the point of view of a passive free-rider
    pub is_freerider: bool,
    /// Restricted party, or `-1` for the omniscient model owner
    pub target_party_id: PartyId,
    /// Trees before this index are ignored
    pub skip_round: usize,
    /// Per-round decay for boosting ensembles
    pub eta: f32,
    /// Groups at least this large are emitted chunk by chunk
    pub max_num_samples_in_a_chunk: usize,
    /// Weight of the edge linking consecutive chunks
    pub edge_weight_between_chunks: f32,
    /// Free up node storage once the free-rider pass has consumed it
    pub release_consumed_nodes: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            is_freerider: false,
            target_party_id: OMNISCIENT_PARTY_ID,
            skip_round: 0,
            eta: DEFAULT_ETA,
            max_num_samples_in_a_chunk: DEFAULT_MAX_NUM_SAMPLES_IN_A_CHUNK,
            edge_weight_between_chunks: DEFAULT_EDGE_WEIGHT_BETWEEN_CHUNKS,
            release_consumed_nodes: true,
        }
    }
}

impl ExtractionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Adversary policy selected by `is_freerider` and `target_party_id`.
    pub fn policy(&self) -> AdversaryPolicy {
        AdversaryPolicy::from_parameters(self.is_freerider, self.target_party_id)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_num_samples_in_a_chunk < 2 {
            return Err(LeakageError::invalid_parameter(
                "max_num_samples_in_a_chunk",
                self.max_num_samples_in_a_chunk.to_string(),
                "must be at least 2",
            ));
        }
        if self.eta.is_nan() {
            return Err(LeakageError::invalid_parameter("eta", "NaN", "must be a number"));
        }
        if self.edge_weight_between_chunks.is_nan() {
            return Err(LeakageError::invalid_parameter(
                "edge_weight_between_chunks",
                "NaN",
                "must be a number",
            ));
        }
        if self.target_party_id < OMNISCIENT_PARTY_ID {
            return Err(LeakageError::invalid_parameter(
                "target_party_id",
                self.target_party_id.to_string(),
                "must be -1 or a party id",
            ));
        }
        Ok(())
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
        self.apply_overrides_from(&process_env)
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(lookup, "VFL_LEAKAGE_IS_FREERIDER", &mut self.is_freerider)?;
        override_from(lookup, "VFL_LEAKAGE_TARGET_PARTY_ID", &mut self.target_party_id)?;
        override_from(lookup, "VFL_LEAKAGE_SKIP_ROUND", &mut self.skip_round)?;
        override_from(lookup, "VFL_LEAKAGE_ETA", &mut self.eta)?;
        override_from(
            lookup,
            "VFL_LEAKAGE_MAX_NUM_SAMPLES_IN_A_CHUNK",
            &mut self.max_num_samples_in_a_chunk,
        )?;
        override_from(
            lookup,
            "VFL_LEAKAGE_EDGE_WEIGHT_BETWEEN_CHUNKS",
            &mut self.edge_weight_between_chunks,
        )?;
        self.validate()
    }
}

/// Fluent builder for [`ExtractionConfig`]
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
    errors: BuilderErrors,
}

impl ExtractionConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyse as a free-rider
    pub fn freerider(mut self, is_freerider: bool) -> Self {
        self.config.is_freerider = is_freerider;
        self
    }

    /// Analyse as the given party, or `-1` for the model owner
    pub fn target_party_id(mut self, party_id: PartyId) -> Self {
        self.errors.check(
            party_id >= OMNISCIENT_PARTY_ID,
            "target_party_id must be -1 or a party id",
        );
        self.config.target_party_id = party_id;
        self
    }

    /// Skip the first `rounds` trees
    pub fn skip_round(mut self, rounds: usize) -> Self {
        self.config.skip_round = rounds;
        self
    }

    /// Set the per-round decay
    pub fn eta(mut self, eta: f32) -> Self {
        self.config.eta = eta;
        self
    }

    /// Set the chunk size
    pub fn max_num_samples_in_a_chunk(mut self, size: usize) -> Self {
        self.errors
            .check(size >= 2, "max_num_samples_in_a_chunk must be at least 2");
        self.config.max_num_samples_in_a_chunk = size;
        self
    }

    /// Set the weight linking consecutive chunks
    pub fn edge_weight_between_chunks(mut self, weight: f32) -> Self {
        self.config.edge_weight_between_chunks = weight;
        self
    }

    /// Keep or release node storage during free-rider extraction
    pub fn release_consumed_nodes(mut self, release: bool) -> Self {
        self.config.release_consumed_nodes = release;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ExtractionConfig> {
        self.errors.into_result()?;
        self.config.validate()?;
        Ok(self.config)
    }
}
