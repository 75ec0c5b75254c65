//! Tree node shared by every training algorithm.
//!
//! A node owns the sample indices of the partition it represents. Internal
//! nodes reference their two children by arena index; there are no parent
//! pointers, so a node's storage can be released once it has been consumed.

use crate::core::types::{NodeIndex, PartyId, RowIndex, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Split chosen for an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Party that owns the split feature
    pub party_id: PartyId,
    /// Global column of the split feature
    pub feature_id: usize,
    /// Rows with `x[feature_id] <= threshold` go left
    pub threshold: f32,
    /// Gain reported by the split search
    pub gain: f32,
}

/// Tree node representation supporting both internal and leaf nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    idxs: Vec<RowIndex>,
    val: Vec<Score>,
    depth: usize,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
    split: Option<SplitRecord>,
    is_leaf_flag: bool,
    not_splitted_flag: bool,
    lmir_flag_exclude_passive_parties: bool,
}

impl Node {
    /// Creates a leaf holding `idxs` with prediction `val`.
    pub fn new_leaf(idxs: Vec<RowIndex>, val: Vec<Score>, depth: usize) -> Self {
        Node {
            idxs,
            val,
            depth,
            left: None,
            right: None,
            split: None,
            is_leaf_flag: true,
            not_splitted_flag: false,
            lmir_flag_exclude_passive_parties: false,
        }
    }

    /// Sample indices of this node's partition.
    pub fn idxs(&self) -> &[RowIndex] {
        &self.idxs
    }

    /// Leaf value, one entry per output dimension.
    pub fn val(&self) -> &[Score] {
        &self.val
    }

    /// Depth of the node; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf_flag
    }

    /// Left child index (internal nodes only).
    pub fn left(&self) -> Option<NodeIndex> {
        self.left
    }

    /// Right child index (internal nodes only).
    pub fn right(&self) -> Option<NodeIndex> {
        self.right
    }

    /// Both children, if the node is internal.
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        match (self.left, self.right) {
            (Some(l), Some(r)) if !self.is_leaf_flag => Some((l, r)),
            _ => None,
        }
    }

    /// Split record (internal nodes only).
    pub fn split(&self) -> Option<&SplitRecord> {
        self.split.as_ref()
    }

    /// True when this node's apparent split carries no information for a
    /// restricted observer.
    pub fn not_splitted(&self) -> bool {
        self.not_splitted_flag
    }

    /// True when the disclosure budget forbids revealing this node's split
    /// to passive parties.
    pub fn lmir_excluded(&self) -> bool {
        self.lmir_flag_exclude_passive_parties
    }

    /// Sets the not-splitted flag.
    pub fn set_not_splitted(&mut self, flag: bool) {
        self.not_splitted_flag = flag;
    }

    /// Sets the passive-party exclusion flag.
    pub fn set_lmir_excluded(&mut self, flag: bool) {
        self.lmir_flag_exclude_passive_parties = flag;
    }

    /// Overwrites the leaf value.
    pub fn set_val(&mut self, val: Vec<Score>) {
        self.val = val;
    }

    /// Turns this leaf into an internal node pointing at two children.
    pub(crate) fn set_split(&mut self, left: NodeIndex, right: NodeIndex, split: SplitRecord) {
        self.left = Some(left);
        self.right = Some(right);
        self.split = Some(split);
        self.is_leaf_flag = false;
    }

    /// Drops index and value storage. Structure and flags are kept.
    pub fn release(&mut self) {
        self.idxs.clear();
        self.idxs.shrink_to_fit();
        self.val.clear();
        self.val.shrink_to_fit();
    }

    /// True once [`Node::release`] ran (or the node never held samples).
    pub fn is_released(&self) -> bool {
        self.idxs.is_empty() && self.val.is_empty()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.split, self.is_leaf_flag) {
            (Some(split), false) => write!(
                f,
                "Internal(party={}, feature={}, threshold={:.4}, gain={:.4}, n={})",
                split.party_id,
                split.feature_id,
                split.threshold,
                split.gain,
                self.idxs.len()
            ),
            _ => write!(
                f,
                "Leaf(val={:?}, n={}, not_splitted={}, lmir={})",
                self.val,
                self.idxs.len(),
                self.not_splitted_flag,
                self.lmir_flag_exclude_passive_parties
            ),
        }
    }
}
