use qif_core::QifError;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LeakageError {
    #[error("prior has {prior} secrets but the channel has {rows} rows")]
    DimensionMismatch { prior: usize, rows: usize },
    #[error("{measure} leakage does not define a {quantity}")]
    Unsupported {
        measure: &'static str,
        quantity: &'static str,
    },
    #[error("capacity requires a positive precision and iteration cap: {0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Core(#[from] QifError),
}

pub type LeakageResult<T> = Result<T, LeakageError>;
