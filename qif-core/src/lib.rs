//! Shared building blocks for quantitative information flow: the numeric
//! element policy, prior distributions over secrets, row-stochastic channels,
//! and the metric abstraction consumed both as a privacy metric and as a
//! loss function.

pub mod channel;
pub mod error;
pub mod metric;
pub mod prior;
pub mod scalar;

pub use channel::Channel;
pub use error::{QifError, QifResult};
pub use metric::{Discrete, GridEuclidean, LineDistance, Metric};
pub use prior::Prior;
pub use scalar::Scalar;
