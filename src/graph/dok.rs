//! Dictionary-of-keys sparse matrix used as a symmetric edge accumulator.
//!
//! Entries are only ever incremented. Adding to the diagonal is a no-op, so
//! the matrix never holds a self-loop. With `symmetric = true` the pair
//! `(i, j)` and `(j, i)` share one entry.

use crate::core::error::{LeakageError, Result};
use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stored entry, `i < j` for symmetric matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub i: usize,
    pub j: usize,
    pub weight: T,
}

#[derive(Debug, Clone)]
enum Storage<T> {
    Dictionary(HashMap<(usize, usize), T>),
    Dense(Array2<T>),
}

/// Sparse accumulator over sample-index pairs.
#[derive(Debug, Clone)]
pub struct SparseMatrixDok<T: Float> {
    num_row: usize,
    num_col: usize,
    default_value: T,
    symmetric: bool,
    storage: Storage<T>,
    node_counter: usize,
    zero_node_counter: usize,
}

impl<T: Float> SparseMatrixDok<T> {
    /// Creates an empty matrix.
    ///
    /// `dictionary_mode = false` backs the matrix with a dense array of
    /// `num_row * num_col` entries; it behaves identically except that an
    /// entry whose accumulated weight equals `default_value` is not counted
    /// as stored.
    pub fn new(
        num_row: usize,
        num_col: usize,
        default_value: T,
        symmetric: bool,
        dictionary_mode: bool,
    ) -> Self {
        let storage = if dictionary_mode {
            Storage::Dictionary(HashMap::new())
        } else {
            Storage::Dense(Array2::from_elem((num_row, num_col), default_value))
        };
        SparseMatrixDok {
            num_row,
            num_col,
            default_value,
            symmetric,
            storage,
            node_counter: 0,
            zero_node_counter: 0,
        }
    }

    /// Symmetric, dictionary-backed `n x n` matrix with zero default.
    pub fn symmetric(n: usize) -> Self {
        Self::new(n, n, T::zero(), true, true)
    }

    fn key(&self, i: usize, j: usize) -> (usize, usize) {
        if self.symmetric && j < i {
            (j, i)
        } else {
            (i, j)
        }
    }

    /// Adds `weight` to entry `(i, j)`, creating it if needed.
    pub fn add(&mut self, i: usize, j: usize, weight: T) -> Result<()> {
        if i >= self.num_row {
            return Err(LeakageError::index_out_of_bounds(i, self.num_row));
        }
        if j >= self.num_col {
            return Err(LeakageError::index_out_of_bounds(j, self.num_col));
        }
        if i == j {
            return Ok(());
        }

        let key = self.key(i, j);
        let default_value = self.default_value;
        match &mut self.storage {
            Storage::Dictionary(map) => {
                let entry = map.entry(key).or_insert(default_value);
                *entry = *entry + weight;
            }
            Storage::Dense(array) => {
                let entry = &mut array[[key.0, key.1]];
                *entry = *entry + weight;
            }
        }
        Ok(())
    }

    /// Accumulated weight of `(i, j)`, or the default when absent.
    pub fn get(&self, i: usize, j: usize) -> T {
        if i >= self.num_row || j >= self.num_col {
            return self.default_value;
        }
        let key = self.key(i, j);
        match &self.storage {
            Storage::Dictionary(map) => map.get(&key).copied().unwrap_or(self.default_value),
            Storage::Dense(array) => array[[key.0, key.1]],
        }
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        match &self.storage {
            Storage::Dictionary(map) => map.len(),
            Storage::Dense(array) => array
                .indexed_iter()
                .filter(|((i, j), v)| **v != self.default_value && i != j && (!self.symmetric || i < j))
                .count(),
        }
    }

    /// Stored entries sorted by `(i, j)`.
    pub fn edges(&self) -> Vec<Edge<T>> {
        let mut edges: Vec<Edge<T>> = match &self.storage {
            Storage::Dictionary(map) => map
                .iter()
                .map(|(&(i, j), &weight)| Edge { i, j, weight })
                .collect(),
            Storage::Dense(array) => array
                .indexed_iter()
                .filter(|((i, j), v)| **v != self.default_value && i != j && (!self.symmetric || i < j))
                .map(|((i, j), &weight)| Edge { i, j, weight })
                .collect(),
        };
        edges.sort_by_key(|e| (e.i, e.j));
        edges
    }

    /// Dense copy; symmetric matrices are mirrored across the diagonal.
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_row, self.num_col), self.default_value);
        for edge in self.edges() {
            dense[[edge.i, edge.j]] = edge.weight;
            if self.symmetric && edge.j < self.num_row && edge.i < self.num_col {
                dense[[edge.j, edge.i]] = edge.weight;
            }
        }
        dense
    }

    /// Records one processed group of `group_size` indices.
    pub fn count_group(&mut self, group_size: usize) {
        self.node_counter += 1;
        if group_size == 1 {
            self.zero_node_counter += 1;
        }
    }

    /// Number of groups processed.
    pub fn node_counter(&self) -> usize {
        self.node_counter
    }

    /// Number of processed groups holding a single index.
    pub fn zero_node_counter(&self) -> usize {
        self.zero_node_counter
    }

    pub fn num_row(&self) -> usize {
        self.num_row
    }

    pub fn num_col(&self) -> usize {
        self.num_col
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn is_dictionary_mode(&self) -> bool {
        matches!(self.storage, Storage::Dictionary(_))
    }
}
