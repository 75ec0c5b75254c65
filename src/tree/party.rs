//! A collaborating party owning a vertical slice of the feature matrix.
//!
//! Parties never exchange raw features. Each one proposes its best local
//! threshold for a node and, once a proposal wins, partitions the node's rows
//! with it.

use crate::core::error::{LeakageError, Result};
use crate::core::types::{PartyId, RowIndex};
use crate::tree::criterion::SplitCriterion;
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

/// Best local split proposed by one party.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub party_id: PartyId,
    /// Column inside the party's slice
    pub local_feature: usize,
    /// Column in the full feature matrix
    pub feature_id: usize,
    pub threshold: f32,
    pub gain: f32,
}

/// One data holder of a vertically partitioned dataset.
#[derive(Debug, Clone)]
pub struct Party {
    party_id: PartyId,
    x: Array2<f32>,
    feature_ids: Vec<usize>,
    subsample_cols: f32,
    rng: StdRng,
    temp_column_subsample: Vec<usize>,
}

impl Party {
    /// Creates a party from its feature slice and the global ids of its columns.
    pub fn new(
        party_id: PartyId,
        x: Array2<f32>,
        feature_ids: Vec<usize>,
        subsample_cols: f32,
        seed: u64,
    ) -> Result<Self> {
        if feature_ids.len() != x.ncols() {
            return Err(LeakageError::dimension_mismatch(
                format!("{} feature ids", x.ncols()),
                format!("{} feature ids", feature_ids.len()),
            ));
        }
        let temp_column_subsample = (0..x.ncols()).collect();
        Ok(Party {
            party_id,
            x,
            feature_ids,
            subsample_cols,
            rng: StdRng::seed_from_u64(seed),
            temp_column_subsample,
        })
    }

    /// Splits `x` column-wise: party `p` receives the global columns listed in
    /// `partition[p]` and the id `p`.
    pub fn vertical_split(
        x: ArrayView2<'_, f32>,
        partition: &[Vec<usize>],
        subsample_cols: f32,
        seed: u64,
    ) -> Result<Vec<Party>> {
        partition
            .iter()
            .enumerate()
            .map(|(p, columns)| {
                if let Some(&bad) = columns.iter().find(|&&c| c >= x.ncols()) {
                    return Err(LeakageError::index_out_of_bounds(bad, x.ncols()));
                }
                let slice = x.select(Axis(1), columns);
                Party::new(
                    p as PartyId,
                    slice,
                    columns.clone(),
                    subsample_cols,
                    seed.wrapping_add(p as u64),
                )
            })
            .collect()
    }

    pub fn party_id(&self) -> PartyId {
        self.party_id
    }

    pub fn num_row(&self) -> usize {
        self.x.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.x.ncols()
    }

    /// Global column ids of this party's features.
    pub fn feature_ids(&self) -> &[usize] {
        &self.feature_ids
    }

    /// Local feature slice.
    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    /// Local columns drawn by the last [`Party::subsample_columns`] call.
    pub fn sampled_columns(&self) -> &[usize] {
        &self.temp_column_subsample
    }

    /// Draws the columns this party will search for the next tree, using the
    /// fraction given at construction.
    pub fn subsample_columns(&mut self) {
        self.subsample_columns_with(self.subsample_cols);
    }

    /// Draws `ceil(fraction * num_features)` columns for the next tree.
    ///
    /// At least one column is kept whenever the party has any.
    pub fn subsample_columns_with(&mut self, fraction: f32) {
        let num_features = self.x.ncols();
        let num_to_sample = ((fraction * num_features as f32).ceil() as usize)
            .clamp(num_features.min(1), num_features);

        let mut columns: Vec<usize> = (0..num_features).collect();
        columns.shuffle(&mut self.rng);
        columns.truncate(num_to_sample);
        columns.sort_unstable();
        self.temp_column_subsample = columns;
    }

    /// Best split of `idxs` over the sampled columns.
    ///
    /// Candidate thresholds are taken every `eps` quantile of the distinct
    /// values, never including the largest one. Ties keep the first candidate
    /// in column order.
    pub fn best_split<C: SplitCriterion>(
        &self,
        criterion: &C,
        idxs: &[RowIndex],
        eps: f32,
    ) -> Option<SplitCandidate> {
        if idxs.len() < 2 {
            return None;
        }
        let total = criterion.collect(idxs);
        let mut best: Option<SplitCandidate> = None;

        for &local in &self.temp_column_subsample {
            let column = self.x.column(local);
            let mut sorted: Vec<(f32, RowIndex)> = idxs.iter().map(|&r| (column[r], r)).collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut distinct: Vec<f32> = sorted.iter().map(|(v, _)| *v).collect();
            distinct.dedup();
            if distinct.len() < 2 {
                continue;
            }
            let step = ((eps * distinct.len() as f32).ceil() as usize).max(1);

            let mut left = criterion.empty();
            let mut cursor = 0;
            for &threshold in distinct[..distinct.len() - 1].iter().step_by(step) {
                while cursor < sorted.len() && sorted[cursor].0 <= threshold {
                    criterion.push(&mut left, sorted[cursor].1);
                    cursor += 1;
                }
                let right = criterion.subtract(&total, &left);
                let score = match criterion.score(&left, &right, cursor, sorted.len() - cursor) {
                    Some(score) => score,
                    None => continue,
                };
                if best.map_or(true, |b| score > b.gain) {
                    best = Some(SplitCandidate {
                        party_id: self.party_id,
                        local_feature: local,
                        feature_id: self.feature_ids[local],
                        threshold,
                        gain: score,
                    });
                }
            }
        }

        best
    }

    /// Partitions `idxs` with one of this party's candidates, preserving order.
    pub fn split_rows(
        &self,
        candidate: &SplitCandidate,
        idxs: &[RowIndex],
    ) -> (Vec<RowIndex>, Vec<RowIndex>) {
        let column = self.x.column(candidate.local_feature);
        idxs.iter()
            .copied()
            .partition(|&row| column[row] <= candidate.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::criterion::GiniCriterion;
    use ndarray::array;

    fn full_matrix() -> Array2<f32> {
        array![
            [0.0, 5.0, 1.0],
            [1.0, 5.0, 2.0],
            [2.0, 5.0, 3.0],
            [3.0, 5.0, 4.0]
        ]
    }

    #[test]
    fn test_vertical_split() {
        let x = full_matrix();
        let parties = Party::vertical_split(x.view(), &[vec![0], vec![1, 2]], 1.0, 7).unwrap();
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[1].party_id(), 1);
        assert_eq!(parties[1].feature_ids(), &[1, 2]);
        assert_eq!(parties[1].x()[[3, 1]], 4.0);

        assert!(Party::vertical_split(x.view(), &[vec![3]], 1.0, 7).is_err());
    }

    #[test]
    fn test_party_dimension_check() {
        let result = Party::new(0, full_matrix(), vec![0, 1], 1.0, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_subsample_columns() {
        let mut party = Party::new(0, full_matrix(), vec![0, 1, 2], 0.5, 3).unwrap();
        party.subsample_columns();
        assert_eq!(party.sampled_columns().len(), 2);
        assert!(party.sampled_columns().windows(2).all(|w| w[0] < w[1]));

        let mut tiny = Party::new(0, full_matrix(), vec![0, 1, 2], 0.01, 3).unwrap();
        tiny.subsample_columns();
        assert_eq!(tiny.sampled_columns().len(), 1);
    }

    #[test]
    fn test_best_split_separates_classes() {
        let y = [0.0, 0.0, 1.0, 1.0];
        let criterion = GiniCriterion::new(&y, 2, 1);
        let party = Party::new(1, full_matrix(), vec![4, 5, 6], 1.0, 0).unwrap();

        let best = party.best_split(&criterion, &[0, 1, 2, 3], 0.1).unwrap();
        assert_eq!(best.local_feature, 0);
        assert_eq!(best.feature_id, 4);
        assert_eq!(best.threshold, 1.0);
        assert_eq!(best.party_id, 1);

        let (left, right) = party.split_rows(&best, &[3, 0, 2, 1]);
        assert_eq!(left, vec![0, 1]);
        assert_eq!(right, vec![3, 2]);
    }

    #[test]
    fn test_best_split_constant_column() {
        let y = [0.0, 1.0, 0.0, 1.0];
        let criterion = GiniCriterion::new(&y, 2, 1);
        let x = array![[5.0_f32], [5.0], [5.0], [5.0]];
        let party = Party::new(0, x, vec![0], 1.0, 0).unwrap();
        assert!(party.best_split(&criterion, &[0, 1, 2, 3], 0.1).is_none());
        assert!(party.best_split(&criterion, &[0], 0.1).is_none());
    }
}
