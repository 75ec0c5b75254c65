//! Default values for training and extraction parameters.

use crate::core::types::PartyId;

/// Version string of the crate.
pub const VFL_LEAKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default fraction of a party's columns sampled for each tree.
pub const DEFAULT_SUBSAMPLE_COLS: f32 = 0.8;

/// Default minimum hessian sum per child. Negative infinity disables the check.
pub const DEFAULT_MIN_CHILD_WEIGHT: f32 = f32::NEG_INFINITY;

/// Default maximum tree depth.
pub const DEFAULT_DEPTH: usize = 5;

/// Default minimum number of samples in a leaf.
pub const DEFAULT_MIN_LEAF: usize = 5;

/// Default boosting learning rate.
pub const DEFAULT_LEARNING_RATE: f32 = 0.4;

/// Default number of boosting rounds.
pub const DEFAULT_BOOSTING_ROUNDS: usize = 5;

/// Default number of trees in a bagging ensemble.
pub const DEFAULT_NUM_TREES: usize = 5;

/// Default L2 regularisation on leaf weights.
pub const DEFAULT_LAMBDA: f32 = 1.5;

/// Default minimum split gain penalty.
pub const DEFAULT_GAMMA: f32 = 1.0;

/// Default quantile step used to build candidate thresholds.
pub const DEFAULT_EPS: f32 = 0.1;

/// Default mutual-information disclosure budget (unbounded).
pub const DEFAULT_MI_BOUND: f32 = f32::INFINITY;

/// Default active party id.
pub const DEFAULT_ACTIVE_PARTY_ID: PartyId = 0;

/// Default constant baseline prediction.
pub const DEFAULT_INIT_VALUE: f32 = 1.0;

/// Default number of split-search workers.
pub const DEFAULT_N_JOB: usize = 1;

/// Default per-round decay used when weighting boosting rounds.
pub const DEFAULT_ETA: f32 = 0.3;

/// Default maximum number of samples per chunk during edge emission.
pub const DEFAULT_MAX_NUM_SAMPLES_IN_A_CHUNK: usize = 1_000_000;

/// Default weight of the single edge linking consecutive chunks.
pub const DEFAULT_EDGE_WEIGHT_BETWEEN_CHUNKS: f32 = 0.01;
