use qif_core::QifError;
use thiserror::Error;

use crate::{config::ConfigError, solver::SolverError};

pub type SynthesisResult<T> = Result<T, SynthesisError>;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("secret domain is empty")]
    EmptyDomain,
    #[error("output domain is empty")]
    NoOutputs,
    #[error("privacy budget must be positive and finite, got {0}")]
    InvalidEpsilon(f64),
    #[error("privacy metric returned {value} for ({a}, {b}); distances must be finite and non-negative")]
    InvalidDistance { a: usize, b: usize, value: f64 },
    #[error("loss returned {value} for secret {secret}, output {output}; losses must be finite and non-negative")]
    InvalidLoss {
        secret: usize,
        output: usize,
        value: f64,
    },
    #[error("solver returned an invalid channel: {0}")]
    InvalidSolution(#[source] QifError),
    #[error("solver returned {values} values for {vars} variables")]
    SolutionLength { vars: usize, values: usize },
    #[error("solver solution violates the program by {violation}")]
    ConstraintViolation { violation: f64 },
    #[error("prior has {prior} secrets but the channel has {rows} rows")]
    DimensionMismatch { prior: usize, rows: usize },
    #[error("mechanism has no channel: {0}")]
    NoChannel(SolverError),
    #[error(transparent)]
    Channel(#[from] QifError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
