//! Leakage-graph extraction from fitted trees.
//!
//! Two training samples are joined by an edge when an adversary cannot tell
//! them apart from the tree structure it observes. Edge weights add up across
//! trees; in boosting ensembles later rounds are decayed by `eta`.

pub mod emission;
pub mod traversal;

pub use emission::{emit_group, emit_pairs, ChunkPolicy};
pub use traversal::{extract_freerider, extract_omniscient, extract_restricted};

use crate::boosting::Ensemble;
use crate::config::ExtractionConfig;
use crate::core::error::{LeakageError, Result};
use crate::core::types::{AdversaryPolicy, TrainingAlgorithm};
use crate::graph::SparseMatrixDok;
use crate::tree::Tree;

impl From<&ExtractionConfig> for ChunkPolicy {
    fn from(config: &ExtractionConfig) -> Self {
        ChunkPolicy {
            max_num_samples_in_a_chunk: config.max_num_samples_in_a_chunk,
            edge_weight_between_chunks: config.edge_weight_between_chunks,
        }
    }
}

/// Weight of tree `index`: `eta^(index - skip_round)` for boosting, `1` for
/// bagging.
pub fn round_weight(
    algorithm: TrainingAlgorithm,
    eta: f32,
    index: usize,
    skip_round: usize,
) -> f32 {
    if algorithm.is_boosting() {
        let exponent = index.saturating_sub(skip_round);
        eta.powi(exponent.min(i32::MAX as usize) as i32)
    } else {
        1.0
    }
}

/// Adds the edges one tree leaks to the policy's adversary.
///
/// Only the free-rider policy mutates the tree, and only when
/// `release_consumed_nodes` is set.
pub fn extract_adjacency_matrix_from_tree(
    tree: &mut Tree,
    weight: f32,
    config: &ExtractionConfig,
    matrix: &mut SparseMatrixDok<f32>,
) -> Result<()> {
    let chunks = ChunkPolicy::from(config);
    match config.policy() {
        AdversaryPolicy::Omniscient => extract_omniscient(tree, weight, &chunks, matrix),
        AdversaryPolicy::RestrictedParty(_) => extract_restricted(tree, weight, &chunks, matrix),
        AdversaryPolicy::FreeRider => {
            extract_freerider(tree, weight, config.release_consumed_nodes, matrix)
        }
    }
}

/// Builds the leakage graph of a whole ensemble.
///
/// Trees before `skip_round` are ignored. The matrix is `num_row x num_row`
/// where `num_row` comes from the first tree.
pub fn extract_adjacency_matrix_from_forest(
    model: &mut Ensemble,
    config: &ExtractionConfig,
) -> Result<SparseMatrixDok<f32>> {
    config.validate()?;
    let num_row = model.num_row().ok_or(LeakageError::EmptyEnsemble)?;
    if num_row == 0 {
        return Err(crate::config_error!("the ensemble was fitted on zero rows"));
    }

    let algorithm = model.algorithm();
    log::info!(
        "Extracting {} leakage graph from {} {} trees ({} rows, skip_round = {})",
        config.policy(),
        model.len(),
        algorithm,
        num_row,
        config.skip_round
    );

    let mut matrix = SparseMatrixDok::symmetric(num_row);
    for (index, tree) in model
        .trees_mut()
        .iter_mut()
        .enumerate()
        .skip(config.skip_round)
    {
        let weight = round_weight(algorithm, config.eta, index, config.skip_round);
        extract_adjacency_matrix_from_tree(tree, weight, config, &mut matrix)?;
        log::debug!(
            "tree {}: weight = {:.6}, edges so far = {}",
            index,
            weight,
            matrix.nnz()
        );
    }

    log::info!(
        "Leakage graph has {} edges over {} groups ({} singletons)",
        matrix.nnz(),
        matrix.node_counter(),
        matrix.zero_node_counter()
    );
    Ok(matrix)
}
