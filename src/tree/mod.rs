//! Decision trees and the plaintext split search that grows them.
//!
//! - [`node`] / [`tree`]: the arena tree shared by all four training algorithms
//! - [`party`]: vertical feature slices and local threshold search
//! - [`criterion`]: gradient gain and Gini impurity
//! - [`fitter`]: [`TreeFitter`](crate::core::traits::TreeFitter) implementations

pub mod criterion;
pub mod fitter;
pub(crate) mod grower;
pub mod node;
pub mod party;
pub mod tree;

pub use criterion::{gini_impurity, GiniCriterion, GradHessStats, GradientCriterion, SplitCriterion};
pub use fitter::{class_frequencies, validate_labels, ForestTreeFitter, GreedyTreeFitter};
pub use node::{Node, SplitRecord};
pub use party::{Party, SplitCandidate};
pub use tree::Tree;
