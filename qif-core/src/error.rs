use thiserror::Error;

pub type QifResult<T> = Result<T, QifError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum QifError {
    #[error("distribution over an empty domain")]
    EmptyDomain,
    #[error("probability {value} at index {index} is outside [0, 1]")]
    InvalidProbability { index: usize, value: f64 },
    #[error("probabilities sum to {sum}, expected 1")]
    NotNormalized { sum: f64 },
    #[error("channel shape {rows}x{cols} does not match {len} entries")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },
    #[error("channel entry ({row}, {col}) = {value} is outside [0, 1]")]
    InvalidEntry { row: usize, col: usize, value: f64 },
    #[error("channel row {row} sums to {sum}, expected 1")]
    RowNotStochastic { row: usize, sum: f64 },
    #[error("index {index} out of range for domain of size {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("cannot sample from channel row {row}: {details}")]
    Sampling { row: usize, details: String },
}
