//! # VFL Leakage
//!
//! Tree ensembles trained over vertically partitioned data, and the
//! extraction of *leakage graphs* from the fitted trees.
//!
//! In vertical federated learning every party holds a disjoint set of feature
//! columns for the same rows, while one active party also holds the labels.
//! A fitted tree partitions the training rows into leaves; samples that end
//! up in the same leaf are indistinguishable to whoever observes the tree.
//! Recording that as a weighted edge between the two samples yields a sample
//! graph whose structure an adversary can mine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ndarray::array;
//! use vfl_leakage::{
//!     extract_adjacency_matrix_from_forest, Booster, BoostingConfigBuilder,
//!     ExtractionConfigBuilder, Party,
//! };
//!
//! # fn main() -> vfl_leakage::Result<()> {
//! vfl_leakage::init();
//!
//! let x = array![[0.0, 3.0], [1.0, 2.0], [2.0, 1.0], [3.0, 0.0]];
//! let y = [0.0, 0.0, 1.0, 1.0];
//! let mut parties = Party::vertical_split(x.view(), &[vec![0], vec![1]], 1.0, 42)?;
//!
//! let config = BoostingConfigBuilder::new()
//!     .boosting_rounds(3)
//!     .depth(2)
//!     .min_leaf(1)
//!     .build()?;
//! let mut booster = Booster::new(config)?;
//! booster.fit(&mut parties, &y)?;
//!
//! let extraction = ExtractionConfigBuilder::new().eta(0.5).build()?;
//! let mut model = booster.into_ensemble();
//! let graph = extract_adjacency_matrix_from_forest(&mut model, &extraction)?;
//! println!("{} edges", graph.nnz());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: shared types, constants, errors and the fitting seam
//! - [`config`]: serde-backed configuration with builders and env overrides
//! - [`stats`]: gain, leaf weight and loss functions
//! - [`tree`]: the node arena, parties and the greedy split search
//! - [`boosting`]: the gradient boosting engine and tree ensembles
//! - [`forest`]: the bagged random-forest classifier
//! - [`graph`]: the dictionary-of-keys edge accumulator
//! - [`leakage`]: adversary policies turning trees into graphs

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod boosting;
pub mod config;
pub mod core;
pub mod forest;
pub mod graph;
pub mod leakage;
pub mod stats;
pub mod tree;

pub use crate::core::{
    constants::*,
    error::{LeakageError, Result},
    traits::*,
    types::*,
};

pub use boosting::{Booster, Ensemble};
pub use config::{
    BoostingConfig, BoostingConfigBuilder, ExtractionConfig, ExtractionConfigBuilder,
    ForestConfig, ForestConfigBuilder, TreeConfig,
};
pub use forest::RandomForestClassifier;
pub use graph::{Edge, SparseMatrixDok};
pub use leakage::{
    extract_adjacency_matrix_from_forest, extract_adjacency_matrix_from_tree, round_weight,
};
pub use tree::{ForestTreeFitter, GreedyTreeFitter, Node, Party, SplitRecord, Tree};

pub use crate::core::constants::VFL_LEAKAGE_VERSION as VERSION;

/// Initialise the library's logging backend.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    crate::core::initialize_logging();
}

/// Check whether [`init`] has already run.
pub fn is_initialized() -> bool {
    crate::core::is_logging_initialized()
}
