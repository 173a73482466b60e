//! Leakage measures over channels: how much an adversary learns about a
//! secret drawn from a prior by observing the channel's output.

pub mod error;
pub mod measure;
pub mod min_entropy;
pub mod shannon;

pub use error::{LeakageError, LeakageResult};
pub use measure::{LeakageMeasure, LeakageReport};
pub use min_entropy::MinEntropy;
pub use shannon::Shannon;
