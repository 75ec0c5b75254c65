//! Weighted graphs over training-sample indices.

pub mod dok;

pub use dok::{Edge, SparseMatrixDok};
