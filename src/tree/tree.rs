//! Decision tree stored as an arena of [`Node`]s.
//!
//! Index 0 is always the root. Children are appended when a leaf is split, so
//! a node's index is always smaller than its children's.

use crate::core::error::{LeakageError, Result};
use crate::core::types::{NodeIndex, RowIndex, Score, TrainingAlgorithm};
use crate::tree::node::{Node, SplitRecord};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Decision tree fitted by one of the training algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    num_row: usize,
    max_depth: usize,
    algorithm: TrainingAlgorithm,
}

impl Tree {
    /// Creates a tree made of a single root leaf.
    pub fn new(
        root_idxs: Vec<RowIndex>,
        root_val: Vec<Score>,
        num_row: usize,
        max_depth: usize,
        algorithm: TrainingAlgorithm,
    ) -> Self {
        Tree {
            nodes: vec![Node::new_leaf(root_idxs, root_val, 0)],
            num_row,
            max_depth,
            algorithm,
        }
    }

    /// Number of training rows the tree was fitted on.
    pub fn num_row(&self) -> usize {
        self.num_row
    }

    /// Depth bound the tree was grown with.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Deepest node actually present.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Algorithm that produced the tree.
    pub fn algorithm(&self) -> TrainingAlgorithm {
        self.algorithm
    }

    /// Returns the number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the root node.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Returns a reference to the node at the given index.
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Returns a mutable reference to the node at the given index.
    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Splits a leaf into an internal node with two new leaf children.
    ///
    /// The parent keeps its own `idxs`; the caller guarantees that
    /// `left_idxs` and `right_idxs` partition them.
    pub fn split_node(
        &mut self,
        index: NodeIndex,
        split: SplitRecord,
        left_idxs: Vec<RowIndex>,
        left_val: Vec<Score>,
        right_idxs: Vec<RowIndex>,
        right_val: Vec<Score>,
    ) -> Result<(NodeIndex, NodeIndex)> {
        let length = self.nodes.len();
        let parent = self
            .nodes
            .get(index)
            .ok_or_else(|| LeakageError::index_out_of_bounds(index, length))?;
        if !parent.is_leaf() {
            return Err(LeakageError::tree_construction(format!(
                "node {} is already split",
                index
            )));
        }

        let child_depth = parent.depth() + 1;
        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(Node::new_leaf(left_idxs, left_val, child_depth));
        self.nodes.push(Node::new_leaf(right_idxs, right_val, child_depth));
        self.nodes[index].set_split(left, right, split);

        Ok((left, right))
    }

    /// Returns all leaf node indices.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| if node.is_leaf() { Some(i) } else { None })
            .collect()
    }

    /// True once a consuming extraction released the tree's storage.
    pub fn is_released(&self) -> bool {
        self.root().is_released()
    }

    /// Smallest column count an input must have to be routed through every
    /// split of the tree.
    pub fn num_features_required(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| n.split().map(|s| s.feature_id + 1))
            .max()
            .unwrap_or(0)
    }

    fn check_usable(&self) -> Result<()> {
        if self.is_released() {
            return Err(LeakageError::structure(
                "tree storage was released by a consuming extraction",
            ));
        }
        Ok(())
    }

    /// Routes one row of the full feature matrix to its leaf.
    pub fn predict_leaf_index(&self, row: &ArrayView1<'_, f32>) -> Result<NodeIndex> {
        let mut index = 0;
        loop {
            let node = &self.nodes[index];
            match (node.children(), node.split()) {
                (Some((left, right)), Some(split)) => {
                    let value = row.get(split.feature_id).ok_or_else(|| {
                        LeakageError::dimension_mismatch(
                            format!("at least {} features", split.feature_id + 1),
                            format!("{} features", row.len()),
                        )
                    })?;
                    index = if *value <= split.threshold { left } else { right };
                }
                _ => return Ok(index),
            }
        }
    }

    /// Leaf value for one row of the full feature matrix.
    pub fn predict_row(&self, row: &ArrayView1<'_, f32>) -> Result<&[Score]> {
        let leaf = self.predict_leaf_index(row)?;
        Ok(self.nodes[leaf].val())
    }

    /// Leaf values for every row of `x` (global column layout).
    pub fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Array2<Score>> {
        self.check_usable()?;
        let required = self.num_features_required();
        if x.ncols() < required {
            return Err(LeakageError::dimension_mismatch(
                format!("at least {} features", required),
                format!("{} features", x.ncols()),
            ));
        }

        let dim = self.root().val().len();
        let mut out = Array2::zeros((x.nrows(), dim));
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            for (c, v) in self.predict_row(&row)?.iter().enumerate() {
                out[[i, c]] = *v;
            }
        }
        Ok(out)
    }

    /// Leaf values for every training row, read from the leaves' partitions.
    pub fn get_train_prediction(&self) -> Result<Array2<Score>> {
        self.check_usable()?;
        let dim = self.root().val().len();
        let mut out = Array2::zeros((self.num_row, dim));
        for node in self.nodes.iter().filter(|n| n.is_leaf()) {
            for &row in node.idxs() {
                for (c, v) in node.val().iter().enumerate() {
                    out[[row, c]] = *v;
                }
            }
        }
        Ok(out)
    }

    /// Checks the partition invariant: every internal node's indices are the
    /// disjoint union of its children's, and the leaves cover `[0, num_row)`
    /// exactly once.
    pub fn validate_partition(&self) -> Result<()> {
        let mut seen = vec![false; self.num_row];
        let mut queue = VecDeque::from([0usize]);

        while let Some(index) = queue.pop_front() {
            let node = &self.nodes[index];
            match node.children() {
                Some((left, right)) => {
                    let mut parent: Vec<RowIndex> = node.idxs().to_vec();
                    let mut union: Vec<RowIndex> = self.nodes[left]
                        .idxs()
                        .iter()
                        .chain(self.nodes[right].idxs())
                        .copied()
                        .collect();
                    parent.sort_unstable();
                    union.sort_unstable();
                    if parent != union {
                        return Err(LeakageError::structure(format!(
                            "node {} is not the union of its children",
                            index
                        )));
                    }
                    queue.push_back(left);
                    queue.push_back(right);
                }
                None => {
                    for &row in node.idxs() {
                        if row >= self.num_row {
                            return Err(LeakageError::index_out_of_bounds(row, self.num_row));
                        }
                        if seen[row] {
                            return Err(LeakageError::structure(format!(
                                "row {} appears in more than one leaf",
                                row
                            )));
                        }
                        seen[row] = true;
                    }
                }
            }
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(LeakageError::structure(format!(
                "row {} is not covered by any leaf",
                missing
            )));
        }
        Ok(())
    }

    /// Returns a textual representation of the tree structure.
    pub fn to_string_representation(&self) -> String {
        let mut result = String::new();
        self.tree_to_string_recursive(0, "", true, &mut result);
        result
    }

    fn tree_to_string_recursive(
        &self,
        index: NodeIndex,
        prefix: &str,
        is_last: bool,
        result: &mut String,
    ) {
        let node = &self.nodes[index];
        let current_prefix = if is_last { "└── " } else { "├── " };
        result.push_str(&format!("{}{}{}\n", prefix, current_prefix, node));

        if let Some((left, right)) = node.children() {
            let new_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            self.tree_to_string_recursive(left, &new_prefix, false, result);
            self.tree_to_string_recursive(right, &new_prefix, true, result);
        }
    }

    /// Converts the tree to a JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Creates a tree from a JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tree(algorithm={}, nodes={}, leaves={}, depth={}, rows={})",
            self.algorithm,
            self.num_nodes(),
            self.num_leaves(),
            self.depth(),
            self.num_row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump() -> Tree {
        let mut tree = Tree::new(vec![0, 1, 2, 3], vec![0.0], 4, 3, TrainingAlgorithm::XGBoost);
        let split = SplitRecord {
            party_id: 0,
            feature_id: 1,
            threshold: 0.5,
            gain: 1.0,
        };
        tree.split_node(0, split, vec![0, 2], vec![-1.0], vec![1, 3], vec![1.0])
            .unwrap();
        tree
    }

    #[test]
    fn test_new_tree() {
        let tree = Tree::new(vec![0, 1], vec![0.3], 2, 4, TrainingAlgorithm::RandomForest);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.max_depth(), 4);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_split_node() {
        let tree = stump();
        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.root().children(), Some((1, 2)));
        assert_eq!(tree.node(1).map(Node::depth), Some(1));
        assert_eq!(tree.leaf_indices(), vec![1, 2]);
    }

    #[test]
    fn test_split_non_leaf_fails() {
        let mut tree = stump();
        let split = *tree.root().split().unwrap();
        let result = tree.split_node(0, split, vec![], vec![], vec![], vec![]);
        assert!(result.is_err());
        assert!(tree.split_node(9, split, vec![], vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn test_predict() {
        let tree = stump();
        let x = array![[9.0_f32, 0.2], [9.0, 0.8]];
        let pred = tree.predict(x.view()).unwrap();
        assert_eq!(pred[[0, 0]], -1.0);
        assert_eq!(pred[[1, 0]], 1.0);
    }

    #[test]
    fn test_predict_rejects_narrow_input() {
        let tree = stump();
        assert_eq!(tree.num_features_required(), 2);
        let narrow = Array2::<f32>::zeros((3, 1));
        let err = tree.predict(narrow.view()).unwrap_err();
        assert!(matches!(err, LeakageError::DimensionMismatch { .. }));

        let row = array![0.2_f32];
        assert!(tree.predict_leaf_index(&row.view()).is_err());
    }

    #[test]
    fn test_released_tree_cannot_predict() {
        let mut tree = stump();
        for index in 0..tree.num_nodes() {
            tree.node_mut(index).unwrap().release();
        }
        assert!(tree.is_released());
        let x = array![[0.0_f32, 0.2]];
        assert!(tree.predict(x.view()).is_err());
        assert!(tree.get_train_prediction().is_err());
    }

    #[test]
    fn test_train_prediction() {
        let pred = stump().get_train_prediction().unwrap();
        assert_eq!(pred.column(0).to_vec(), vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_validate_partition() {
        assert!(stump().validate_partition().is_ok());

        let mut broken = Tree::new(vec![0, 1, 2], vec![0.0], 3, 2, TrainingAlgorithm::XGBoost);
        let split = SplitRecord {
            party_id: 0,
            feature_id: 0,
            threshold: 0.0,
            gain: 0.0,
        };
        broken
            .split_node(0, split, vec![0, 1], vec![0.0], vec![1, 2], vec![0.0])
            .unwrap();
        assert!(broken.validate_partition().is_err());
    }

    #[test]
    fn test_serialization() {
        let tree = stump();
        let json = tree.to_json().unwrap();
        let restored = Tree::from_json(&json).unwrap();
        assert_eq!(restored.num_nodes(), tree.num_nodes());
        assert_eq!(restored.algorithm(), TrainingAlgorithm::XGBoost);
        assert!(tree.to_string_representation().contains("Internal"));
    }
}
