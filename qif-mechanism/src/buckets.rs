//! Distinct-distance table shared by the bucketed formulations.
//!
//! Bucket indices depend on the globally sorted distance list, so the table
//! must be built over the whole secret × output grid before any variable
//! index is derived from it.

use std::{cmp::Ordering, collections::HashMap};

use qif_core::Scalar;

#[derive(Clone, Debug, PartialEq)]
pub struct DistanceTable<T> {
    distances: Vec<T>,
    cells: Vec<usize>,
    cols: usize,
}

impl<T: Scalar> DistanceTable<T> {
    /// Builds the table from a row-major grid of already-evaluated distances.
    /// Values are matched exactly; no two distinct values are ever merged.
    pub fn build(grid: &[T], cols: usize) -> Self {
        assert!(cols > 0, "distance grid needs at least one column");
        let mut distances = grid.to_vec();
        distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        distances.dedup_by(|next, kept| next.lookup_key() == kept.lookup_key());

        let positions: HashMap<u64, usize> = distances
            .iter()
            .enumerate()
            .map(|(index, value)| (value.lookup_key(), index))
            .collect();
        let cells = grid
            .iter()
            .map(|value| match positions.get(&value.lookup_key()) {
                Some(&index) => index,
                None => panic!("distance {value} missing from its bucket table"),
            })
            .collect();
        Self {
            distances,
            cells,
            cols,
        }
    }

    /// Number of distinct distances.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distances(&self) -> &[T] {
        &self.distances
    }

    pub fn bucket(&self, x: usize, y: usize) -> usize {
        self.cells[x * self.cols + y]
    }

    /// Difference between bucket `index + 1` and bucket `index`.
    pub fn gap(&self, index: usize) -> T {
        self.distances[index + 1] - self.distances[index]
    }
}
