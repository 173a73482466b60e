use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{QifError, QifResult},
    scalar::Scalar,
};

/// Row-stochastic matrix mapping each secret (row) to a distribution over
/// observable outputs (columns). Stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<T>>", into = "Vec<Vec<T>>", bound = "T: Scalar")]
pub struct Channel<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> Channel<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> QifResult<Self> {
        Self::with_tolerance(rows, cols, data, T::DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(rows: usize, cols: usize, data: Vec<T>, tolerance: T) -> QifResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(QifError::EmptyDomain);
        }
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(QifError::ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        let channel = Self { rows, cols, data };
        channel.validate(tolerance)?;
        Ok(channel)
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> QifResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(QifError::ShapeMismatch {
                    rows: n_rows,
                    cols: n_cols,
                    len: data.len() + row.len(),
                });
            }
            data.extend(row);
        }
        Self::new(n_rows, n_cols, data)
    }

    /// Square channel that reveals the secret exactly.
    pub fn identity(size: usize) -> QifResult<Self> {
        let mut data = vec![T::zero(); size * size];
        for x in 0..size {
            data[x * size + x] = T::one();
        }
        Self::new(size, size, data)
    }

    /// Channel whose rows are all uniform, so the output carries no information.
    pub fn no_interference(rows: usize, cols: usize) -> QifResult<Self> {
        if cols == 0 {
            return Err(QifError::EmptyDomain);
        }
        let mass = T::one() / T::of(cols as f64);
        Self::new(rows, cols, vec![mass; rows * cols])
    }

    /// Checks entry bounds and row sums against `tolerance`.
    pub fn validate(&self, tolerance: T) -> QifResult<()> {
        for (row, values) in self.data.chunks(self.cols).enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if !(value >= -tolerance && value <= T::one() + tolerance) {
                    return Err(QifError::InvalidEntry {
                        row,
                        col,
                        value: value.as_f64(),
                    });
                }
            }
            let sum: T = values.iter().copied().sum();
            if (sum - T::one()).abs() > tolerance {
                return Err(QifError::RowNotStochastic {
                    row,
                    sum: sum.as_f64(),
                });
            }
        }
        Ok(())
    }

    pub fn is_stochastic(&self, tolerance: T) -> bool {
        self.validate(tolerance).is_ok()
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, x: usize, y: usize) -> T {
        assert!(x < self.rows && y < self.cols, "cell ({x}, {y}) out of bounds");
        self.data[x * self.cols + y]
    }

    pub fn row(&self, x: usize) -> &[T] {
        &self.data[x * self.cols..(x + 1) * self.cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.chunks(self.cols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Draws an output for secret `x` according to row `x`.
    pub fn sample_output<R: Rng + ?Sized>(&self, x: usize, rng: &mut R) -> QifResult<usize> {
        if x >= self.rows {
            return Err(QifError::OutOfRange {
                index: x,
                len: self.rows,
            });
        }
        let weights = self.row(x).iter().map(|p| p.as_f64().max(0.0));
        let dist = WeightedIndex::<f64>::new(weights).map_err(|err| QifError::Sampling {
            row: x,
            details: err.to_string(),
        })?;
        Ok(dist.sample(rng))
    }
}

impl<T: Scalar> TryFrom<Vec<Vec<T>>> for Channel<T> {
    type Error = QifError;

    fn try_from(rows: Vec<Vec<T>>) -> QifResult<Self> {
        Self::from_rows(rows)
    }
}

impl<T: Scalar> From<Channel<T>> for Vec<Vec<T>> {
    fn from(channel: Channel<T>) -> Self {
        channel.rows().map(<[T]>::to_vec).collect()
    }
}
