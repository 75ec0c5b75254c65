//! Turning a group of indistinguishable samples into edges.

use crate::core::error::Result;
use crate::core::types::RowIndex;
use crate::graph::SparseMatrixDok;

/// Chunking parameters for [`emit_group`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPolicy {
    /// Groups at least this large are cut into chunks of this size
    pub max_num_samples_in_a_chunk: usize,
    /// Weight of the single edge between consecutive chunks
    pub edge_weight_between_chunks: f32,
}

/// Adds `weight` between every pair of `idxs`.
pub fn emit_pairs(
    matrix: &mut SparseMatrixDok<f32>,
    idxs: &[RowIndex],
    weight: f32,
) -> Result<()> {
    for (a, &i) in idxs.iter().enumerate() {
        for &j in &idxs[a + 1..] {
            matrix.add(i, j, weight)?;
        }
    }
    Ok(())
}

/// Emits one group: full pairwise edges when it is smaller than the chunk
/// size, otherwise pairwise edges inside each chunk plus one link from the
/// first index of every chunk to the last index of the previous one.
///
/// The group is counted in the matrix diagnostics either way.
pub fn emit_group(
    matrix: &mut SparseMatrixDok<f32>,
    idxs: &[RowIndex],
    weight: f32,
    chunks: &ChunkPolicy,
) -> Result<()> {
    matrix.count_group(idxs.len());

    let size = chunks.max_num_samples_in_a_chunk.max(1);
    if idxs.len() < size {
        return emit_pairs(matrix, idxs, weight);
    }

    for start in (0..idxs.len()).step_by(size) {
        let end = (start + size).min(idxs.len());
        emit_pairs(matrix, &idxs[start..end], weight)?;
        if start > 0 {
            matrix.add(idxs[start], idxs[start - 1], chunks.edge_weight_between_chunks)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(size: usize) -> ChunkPolicy {
        ChunkPolicy {
            max_num_samples_in_a_chunk: size,
            edge_weight_between_chunks: 0.01,
        }
    }

    #[test]
    fn test_small_group_is_a_clique() {
        let mut m = SparseMatrixDok::symmetric(5);
        emit_group(&mut m, &[0, 2, 4], 1.0, &policy(10)).unwrap();
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get(0, 4), 1.0);
        assert_eq!(m.node_counter(), 1);
        assert_eq!(m.zero_node_counter(), 0);
    }

    #[test]
    fn test_singleton_group_is_counted() {
        let mut m = SparseMatrixDok::symmetric(3);
        emit_group(&mut m, &[1], 1.0, &policy(10)).unwrap();
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.node_counter(), 1);
        assert_eq!(m.zero_node_counter(), 1);
    }

    #[test]
    fn test_chunked_group() {
        let mut m = SparseMatrixDok::symmetric(5);
        emit_group(&mut m, &[0, 1, 2, 3, 4], 1.0, &policy(2)).unwrap();
        // chunks [0,1] [2,3] [4]
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(2, 3), 1.0);
        assert_eq!(m.get(1, 2), 0.01);
        assert_eq!(m.get(3, 4), 0.01);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.node_counter(), 1);
    }

    #[test]
    fn test_group_at_chunk_size_is_chunked() {
        let mut m = SparseMatrixDok::symmetric(4);
        emit_group(&mut m, &[0, 1, 2, 3], 1.0, &policy(4)).unwrap();
        // exactly one chunk: same edges as a clique, no link
        assert_eq!(m.nnz(), 6);
        assert!(m.edges().iter().all(|e| e.weight == 1.0));
    }
}
