//! Breadth-first walks that decide which sample groups an adversary can see.

use crate::core::error::{LeakageError, Result};
use crate::core::types::NodeIndex;
use crate::graph::SparseMatrixDok;
use crate::leakage::emission::{emit_group, emit_pairs, ChunkPolicy};
use crate::tree::{Node, Tree};
use std::collections::VecDeque;

fn node_at(tree: &Tree, index: NodeIndex) -> Result<&Node> {
    tree.node(index)
        .ok_or_else(|| LeakageError::index_out_of_bounds(index, tree.num_nodes()))
}

/// Model owner's view: every leaf is one group.
pub fn extract_omniscient(
    tree: &Tree,
    weight: f32,
    chunks: &ChunkPolicy,
    matrix: &mut SparseMatrixDok<f32>,
) -> Result<()> {
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let node = node_at(tree, index)?;
        match node.children() {
            None => emit_group(matrix, node.idxs(), weight, chunks)?,
            Some((left, right)) => {
                queue.push_back(left);
                queue.push_back(right);
            }
        }
    }
    Ok(())
}

/// View of one collaborating party.
///
/// A leaf is a group unless its split is invisible (`not_splitted`). An
/// internal node whose children are both invisible, or both hidden by the
/// disclosure budget, is seen as a single blob. Blob and leaf emissions may
/// overlap and simply add up.
pub fn extract_restricted(
    tree: &Tree,
    weight: f32,
    chunks: &ChunkPolicy,
    matrix: &mut SparseMatrixDok<f32>,
) -> Result<()> {
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let node = node_at(tree, index)?;
        let Some((left, right)) = node.children() else {
            if !node.not_splitted() {
                emit_group(matrix, node.idxs(), weight, chunks)?;
            }
            continue;
        };

        let (l, r) = (node_at(tree, left)?, node_at(tree, right)?);
        let invisible = l.not_splitted() && r.not_splitted();
        let hidden = l.lmir_excluded() && r.lmir_excluded();
        if invisible || hidden {
            emit_group(matrix, node.idxs(), weight, chunks)?;
        }
        if !l.lmir_excluded() || !r.lmir_excluded() {
            queue.push_back(left);
            queue.push_back(right);
        }
    }
    Ok(())
}

/// Free-rider's view: only where splitting stops is observable.
///
/// Leaves are emitted as soon as their parent is visited, without chunking.
/// With `release` set, every visited node and every emitted leaf gives up its
/// index and value storage, so the tree can no longer predict afterwards.
pub fn extract_freerider(
    tree: &mut Tree,
    weight: f32,
    release: bool,
    matrix: &mut SparseMatrixDok<f32>,
) -> Result<()> {
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let children = node_at(tree, index)?.children();
        match children {
            None => {
                // only reachable for a root that never split
                emit_leaf(tree, index, weight, release, matrix)?;
            }
            Some((left, right)) => {
                let left_leaf = node_at(tree, left)?.is_leaf();
                let right_leaf = node_at(tree, right)?.is_leaf();
                match (left_leaf, right_leaf) {
                    (false, false) => {
                        queue.push_back(left);
                        queue.push_back(right);
                    }
                    (true, false) => {
                        emit_leaf(tree, left, weight, release, matrix)?;
                        queue.push_back(right);
                    }
                    (false, true) => {
                        emit_leaf(tree, right, weight, release, matrix)?;
                        queue.push_back(left);
                    }
                    (true, true) => {
                        emit_leaf(tree, left, weight, release, matrix)?;
                        emit_leaf(tree, right, weight, release, matrix)?;
                    }
                }
                if release {
                    if let Some(node) = tree.node_mut(index) {
                        node.release();
                    }
                }
            }
        }
    }
    Ok(())
}

fn emit_leaf(
    tree: &mut Tree,
    index: NodeIndex,
    weight: f32,
    release: bool,
    matrix: &mut SparseMatrixDok<f32>,
) -> Result<()> {
    let node = node_at(tree, index)?;
    matrix.count_group(node.idxs().len());
    emit_pairs(matrix, node.idxs(), weight)?;
    if release {
        if let Some(node) = tree.node_mut(index) {
            node.release();
        }
    }
    Ok(())
}
