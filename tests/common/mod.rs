//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use ndarray::Array2;
use rand::prelude::*;
use vfl_leakage::*;

/// Always-valid split record for hand-built trees.
pub const SPLIT: SplitRecord = SplitRecord {
    party_id: 0,
    feature_id: 0,
    threshold: 0.0,
    gain: 1.0,
};

/// Binary classification data with `num_features` uniform columns in
/// `[-3, 3)`; the label is 1 when the alternating-sign sum is positive.
pub fn create_binary_data(num_samples: usize, num_features: usize, seed: u64) -> (Array2<f32>, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Array2::zeros((num_samples, num_features));
    for i in 0..num_samples {
        for j in 0..num_features {
            features[[i, j]] = rng.gen_range(-3.0..3.0);
        }
    }

    let labels = (0..num_samples)
        .map(|i| {
            let score: f32 = (0..num_features)
                .map(|j| features[[i, j]] * if j % 2 == 0 { 1.0 } else { -1.0 })
                .sum();
            if score > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    (features, labels)
}

/// Three-class data: the label is the bucket of the first column.
pub fn create_multiclass_data(num_samples: usize, num_features: usize, seed: u64) -> (Array2<f32>, Vec<f32>) {
    let (features, _) = create_binary_data(num_samples, num_features, seed);
    let labels = features
        .column(0)
        .iter()
        .map(|&v| if v < -1.0 { 0.0 } else if v < 1.0 { 1.0 } else { 2.0 })
        .collect();
    (features, labels)
}

/// Deals columns round-robin to `num_parties` parties.
pub fn round_robin_partition(num_features: usize, num_parties: usize) -> Vec<Vec<usize>> {
    let mut partition = vec![Vec::new(); num_parties];
    for column in 0..num_features {
        partition[column % num_parties].push(column);
    }
    partition
}

pub fn make_parties(x: &Array2<f32>, num_parties: usize) -> Vec<Party> {
    let partition = round_robin_partition(x.ncols(), num_parties);
    Party::vertical_split(x.view(), &partition, 1.0, 7).unwrap()
}

/// root{0,1,2,3} -> A{0,1}, B{2,3}
pub fn depth_one_tree(algorithm: TrainingAlgorithm) -> Tree {
    let mut tree = Tree::new(vec![0, 1, 2, 3], vec![0.0], 4, 1, algorithm);
    tree.split_node(0, SPLIT, vec![0, 1], vec![0.0], vec![2, 3], vec![0.0])
        .unwrap();
    tree
}

/// root{0..5} -> A{0,1,2}, B{3,4}
pub fn five_row_tree(algorithm: TrainingAlgorithm) -> Tree {
    let mut tree = Tree::new((0..5).collect(), vec![0.0], 5, 1, algorithm);
    tree.split_node(0, SPLIT, vec![0, 1, 2], vec![0.0], vec![3, 4], vec![0.0])
        .unwrap();
    tree
}

/// root{0,1,2,3} -> A{0,2}, B{1,3}; crosses the pairs of [`depth_one_tree`].
pub fn crossed_depth_one_tree(algorithm: TrainingAlgorithm) -> Tree {
    let mut tree = Tree::new(vec![0, 1, 2, 3], vec![0.0], 4, 1, algorithm);
    tree.split_node(0, SPLIT, vec![0, 2], vec![0.0], vec![1, 3], vec![0.0])
        .unwrap();
    tree
}

/// root{0..6} -> A{0,1,2} leaf, B{3,4,5} -> B1{3,4}, B2{5}
pub fn partial_tree(algorithm: TrainingAlgorithm) -> Tree {
    let mut tree = Tree::new((0..6).collect(), vec![0.0], 6, 2, algorithm);
    let (_, b) = tree
        .split_node(0, SPLIT, vec![0, 1, 2], vec![0.0], vec![3, 4, 5], vec![0.0])
        .unwrap();
    tree.split_node(b, SPLIT, vec![3, 4], vec![0.0], vec![5], vec![0.0])
        .unwrap();
    tree
}

/// Sum of `C(|leaf|, 2)` over the leaves of `tree`.
pub fn leaf_pair_count(tree: &Tree) -> usize {
    tree.leaf_indices()
        .into_iter()
        .map(|i| {
            let n = tree.nodes()[i].idxs().len();
            n * n.saturating_sub(1) / 2
        })
        .sum()
}

pub fn small_boosting_config(rounds: usize) -> BoostingConfig {
    BoostingConfigBuilder::new()
        .boosting_rounds(rounds)
        .learning_rate(0.3)
        .depth(3)
        .min_leaf(2)
        .gamma(0.0)
        .subsample_cols(1.0)
        .build()
        .unwrap()
}
