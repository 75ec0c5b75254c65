//! Breadth-first tree growth over vertically partitioned parties.
//!
//! Every node is offered to all eligible parties; the best proposal wins and
//! the owning party partitions the rows. Two disclosure rules are applied
//! while growing:
//!
//! - a split whose mutual information with the labels exceeds the budget is
//!   re-searched on the active party only, and the resulting subtree is
//!   marked as hidden from passive parties;
//! - a split made by the active party whose children both end up as leaves is
//!   indistinguishable from "no split" to a passive party, so both children
//!   are marked as not splitted.

use crate::core::error::{LeakageError, Result};
use crate::core::types::{Label, NodeIndex, PartyId, RowIndex, Score, TrainingAlgorithm};
use crate::tree::criterion::SplitCriterion;
use crate::tree::node::SplitRecord;
use crate::tree::party::{Party, SplitCandidate};
use crate::tree::tree::Tree;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::VecDeque;

/// Limits and disclosure parameters for one tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowthParams {
    pub depth: usize,
    pub eps: f32,
    pub mi_bound: f32,
    pub active_party_id: PartyId,
    pub use_only_active_party: bool,
    pub n_job: usize,
}

/// Label information needed for the disclosure budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LabelInfo<'a> {
    pub y: &'a [Label],
    pub num_classes: usize,
    pub prior: &'a [f32],
}

/// Grows one tree with a given split criterion.
pub(crate) struct TreeGrower<'a, C: SplitCriterion> {
    parties: &'a [Party],
    criterion: &'a C,
    labels: LabelInfo<'a>,
    params: GrowthParams,
}

impl<'a, C: SplitCriterion> TreeGrower<'a, C> {
    pub fn new(
        parties: &'a [Party],
        criterion: &'a C,
        labels: LabelInfo<'a>,
        params: GrowthParams,
    ) -> Self {
        TreeGrower {
            parties,
            criterion,
            labels,
            params,
        }
    }

    /// Grows a tree over all rows; `leaf_value` gives the value of every node.
    pub fn grow<V>(&self, leaf_value: V, algorithm: TrainingAlgorithm) -> Result<Tree>
    where
        V: Fn(&[RowIndex]) -> Vec<Score>,
    {
        let num_row = self.labels.y.len();
        self.check_parties(num_row)?;

        let pool = if self.params.n_job > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(self.params.n_job)
                    .build()
                    .map_err(|e| {
                        LeakageError::threading(format!("Failed to build split-search pool: {}", e))
                    })?,
            )
        } else {
            None
        };

        let root_idxs: Vec<RowIndex> = (0..num_row).collect();
        let root_val = leaf_value(&root_idxs);
        let mut tree = Tree::new(root_idxs, root_val, num_row, self.params.depth, algorithm);

        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            let (idxs, depth, inherited_lmir) = match tree.node(index) {
                Some(node) => (node.idxs().to_vec(), node.depth(), node.lmir_excluded()),
                None => return Err(LeakageError::index_out_of_bounds(index, tree.num_nodes())),
            };
            if depth >= self.params.depth {
                continue;
            }

            let Some((candidate, left, right, lmir)) =
                self.choose_split(pool.as_ref(), &idxs, inherited_lmir)
            else {
                continue;
            };

            let split = SplitRecord {
                party_id: candidate.party_id,
                feature_id: candidate.feature_id,
                threshold: candidate.threshold,
                gain: candidate.gain,
            };
            let left_val = leaf_value(&left);
            let right_val = leaf_value(&right);
            let (l, r) = tree.split_node(index, split, left, left_val, right, right_val)?;
            if lmir {
                for child in [l, r] {
                    if let Some(node) = tree.node_mut(child) {
                        node.set_lmir_excluded(true);
                    }
                }
            }
            queue.push_back(l);
            queue.push_back(r);
        }

        self.mark_not_splitted(&mut tree);
        log::debug!("grown {}", tree);
        Ok(tree)
    }

    fn check_parties(&self, num_row: usize) -> Result<()> {
        if self.parties.is_empty() {
            return Err(LeakageError::config("at least one party is required"));
        }
        if let Some(party) = self.parties.iter().find(|p| p.num_row() != num_row) {
            return Err(LeakageError::dimension_mismatch(
                format!("{} rows", num_row),
                format!("{} rows in party {}", party.num_row(), party.party_id()),
            ));
        }
        if !self
            .parties
            .iter()
            .any(|p| p.party_id() == self.params.active_party_id)
        {
            return Err(crate::config_error!(
                "active party {} is not among the parties",
                self.params.active_party_id
            ));
        }
        Ok(())
    }

    /// Picks the split for a node, applying the disclosure budget.
    ///
    /// Returns the winning candidate, its partition and whether the children
    /// must be hidden from passive parties.
    fn choose_split(
        &self,
        pool: Option<&ThreadPool>,
        idxs: &[RowIndex],
        inherited_lmir: bool,
    ) -> Option<(SplitCandidate, Vec<RowIndex>, Vec<RowIndex>, bool)> {
        let active_only = self.params.use_only_active_party || inherited_lmir;
        let candidate = self.search(pool, idxs, active_only)?;
        let (left, right) = self.partition(&candidate, idxs)?;

        if inherited_lmir {
            return Some((candidate, left, right, true));
        }

        let mi = split_mutual_information(&self.labels, &left, &right);
        if mi <= self.params.mi_bound {
            return Some((candidate, left, right, false));
        }

        log::debug!(
            "split on party {} exceeds the mutual information bound ({:.4} > {:.4})",
            candidate.party_id,
            mi,
            self.params.mi_bound
        );
        if candidate.party_id == self.params.active_party_id {
            return Some((candidate, left, right, true));
        }
        let candidate = self.search(pool, idxs, true)?;
        let (left, right) = self.partition(&candidate, idxs)?;
        Some((candidate, left, right, true))
    }

    fn search(
        &self,
        pool: Option<&ThreadPool>,
        idxs: &[RowIndex],
        active_only: bool,
    ) -> Option<SplitCandidate> {
        let active = self.params.active_party_id;
        let eligible: Vec<&Party> = self
            .parties
            .iter()
            .filter(|p| !active_only || p.party_id() == active)
            .collect();

        let criterion = self.criterion;
        let eps = self.params.eps;
        let proposals: Vec<Option<SplitCandidate>> = match pool {
            Some(pool) => pool.install(|| {
                eligible
                    .par_iter()
                    .map(|party| party.best_split(criterion, idxs, eps))
                    .collect()
            }),
            None => eligible
                .iter()
                .map(|party| party.best_split(criterion, idxs, eps))
                .collect(),
        };

        // Party order breaks ties, whatever order the workers finished in.
        proposals
            .into_iter()
            .flatten()
            .filter(|c| c.gain > 0.0)
            .fold(None, |best: Option<SplitCandidate>, c| match best {
                Some(b) if b.gain >= c.gain => Some(b),
                _ => Some(c),
            })
    }

    fn partition(
        &self,
        candidate: &SplitCandidate,
        idxs: &[RowIndex],
    ) -> Option<(Vec<RowIndex>, Vec<RowIndex>)> {
        let party = self
            .parties
            .iter()
            .find(|p| p.party_id() == candidate.party_id)?;
        Some(party.split_rows(candidate, idxs))
    }

    fn mark_not_splitted(&self, tree: &mut Tree) {
        let mut hidden: Vec<NodeIndex> = Vec::new();
        for node in tree.nodes() {
            let (Some((l, r)), Some(split)) = (node.children(), node.split()) else {
                continue;
            };
            let both_leaves = tree.node(l).is_some_and(|n| n.is_leaf())
                && tree.node(r).is_some_and(|n| n.is_leaf());
            if both_leaves && split.party_id == self.params.active_party_id {
                hidden.push(l);
                hidden.push(r);
            }
        }
        for index in hidden {
            if let Some(node) = tree.node_mut(index) {
                node.set_not_splitted(true);
            }
        }
    }
}

/// `Σ_side p(side) · KL(p(y | side) ‖ prior)` for a left / right partition.
pub(crate) fn split_mutual_information(
    labels: &LabelInfo<'_>,
    left: &[RowIndex],
    right: &[RowIndex],
) -> f32 {
    let total = (left.len() + right.len()) as f32;
    if total == 0.0 {
        return 0.0;
    }

    let mut mi = 0.0;
    for side in [left, right] {
        if side.is_empty() {
            continue;
        }
        let mut counts = vec![0.0_f32; labels.num_classes];
        for &row in side {
            counts[labels.y[row] as usize] += 1.0;
        }
        let n = side.len() as f32;
        let kl: f32 = counts
            .iter()
            .zip(labels.prior)
            .filter(|(c, _)| **c > 0.0)
            .map(|(c, prior)| {
                let p = c / n;
                p * (p / prior).ln()
            })
            .sum();
        mi += (n / total) * kl;
    }
    mi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::criterion::GiniCriterion;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn params(depth: usize) -> GrowthParams {
        GrowthParams {
            depth,
            eps: 0.1,
            mi_bound: f32::INFINITY,
            active_party_id: 0,
            use_only_active_party: false,
            n_job: 1,
        }
    }

    fn frequencies(y: &[Label]) -> impl Fn(&[RowIndex]) -> Vec<Score> + '_ {
        move |idxs: &[RowIndex]| {
            let mut counts = vec![0.0; 2];
            for &i in idxs {
                counts[y[i] as usize] += 1.0;
            }
            let n = idxs.len().max(1) as f32;
            counts.into_iter().map(|c| c / n).collect()
        }
    }

    /// Party 1 holds a perfectly separating feature, party 0 a weaker one.
    fn two_parties() -> Vec<Party> {
        let x0 = array![[0.0_f32], [0.0], [0.0], [1.0], [0.0], [1.0], [1.0], [1.0]];
        let x1 = array![[0.0_f32], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        vec![
            Party::new(0, x0, vec![0], 1.0, 0).unwrap(),
            Party::new(1, x1, vec![1], 1.0, 0).unwrap(),
        ]
    }

    const Y: [Label; 8] = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
    const PRIOR: [f32; 2] = [0.5, 0.5];

    fn labels() -> LabelInfo<'static> {
        LabelInfo {
            y: &Y,
            num_classes: 2,
            prior: &PRIOR,
        }
    }

    #[test]
    fn test_grow_picks_informative_party() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let tree = TreeGrower::new(&parties, &criterion, labels(), params(1))
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();

        assert_eq!(tree.num_nodes(), 3);
        let split = tree.root().split().unwrap();
        assert_eq!(split.party_id, 1);
        assert_eq!(split.threshold, 3.0);
        assert!(tree.validate_partition().is_ok());
        // passive split: no disclosure flags
        assert!(!tree.node(1).unwrap().not_splitted());
        assert!(!tree.node(1).unwrap().lmir_excluded());
    }

    #[test]
    fn test_active_party_leaf_pair_is_not_splitted() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let mut p = params(1);
        p.active_party_id = 1;
        let tree = TreeGrower::new(&parties, &criterion, labels(), p)
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();
        assert!(tree.node(1).unwrap().not_splitted());
        assert!(tree.node(2).unwrap().not_splitted());
    }

    #[test]
    fn test_mi_bound_moves_split_to_active_party() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let mut p = params(2);
        p.mi_bound = 0.1;
        let tree = TreeGrower::new(&parties, &criterion, labels(), p)
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();

        assert_eq!(tree.root().split().map(|s| s.party_id), Some(0));
        for index in 1..tree.num_nodes() {
            assert!(tree.node(index).unwrap().lmir_excluded());
        }
        for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
            assert_eq!(node.split().map(|s| s.party_id), Some(0));
        }
    }

    #[test]
    fn test_use_only_active_party() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let mut p = params(3);
        p.use_only_active_party = true;
        let tree = TreeGrower::new(&parties, &criterion, labels(), p)
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();
        for node in tree.nodes().iter().filter(|n| !n.is_leaf()) {
            assert_eq!(node.split().map(|s| s.party_id), Some(0));
        }
    }

    #[test]
    fn test_parallel_search_matches_serial() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let serial = TreeGrower::new(&parties, &criterion, labels(), params(3))
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();
        let mut p = params(3);
        p.n_job = 2;
        let parallel = TreeGrower::new(&parties, &criterion, labels(), p)
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest)
            .unwrap();
        assert_eq!(serial.nodes(), parallel.nodes());
    }

    #[test]
    fn test_missing_active_party() {
        let parties = two_parties();
        let criterion = GiniCriterion::new(&Y, 2, 1);
        let mut p = params(1);
        p.active_party_id = 5;
        let result = TreeGrower::new(&parties, &criterion, labels(), p)
            .grow(frequencies(&Y), TrainingAlgorithm::RandomForest);
        assert!(result.is_err());
    }

    #[test]
    fn test_split_mutual_information() {
        let info = labels();
        // perfect split: each side has KL = ln 2
        let perfect = split_mutual_information(&info, &[0, 1, 2, 3], &[4, 5, 6, 7]);
        assert_abs_diff_eq!(perfect, std::f32::consts::LN_2, epsilon = 1e-6);
        // balanced sides carry no information
        let none = split_mutual_information(&info, &[0, 4], &[1, 5]);
        assert_abs_diff_eq!(none, 0.0, epsilon = 1e-6);
    }
}
