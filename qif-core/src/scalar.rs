use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::AddAssign,
};

use num_traits::Float;
use serde::{de::DeserializeOwned, Serialize};

/// Floating-point element type of priors, channels and LP descriptors.
///
/// Every instantiation fixes its own comparison tolerance, so stochasticity
/// checks never hard-code an epsilon at the call site.
pub trait Scalar:
    Float
    + AddAssign
    + Sum
    + Default
    + Debug
    + Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Slack allowed when comparing sums of probabilities against one.
    const DEFAULT_TOLERANCE: Self;

    fn of(value: f64) -> Self;

    fn as_f64(self) -> f64;

    /// Exact-match key for lookup tables. `-0.0` and `0.0` share a key.
    fn lookup_key(self) -> u64 {
        (self.as_f64() + 0.0).to_bits()
    }
}

impl Scalar for f64 {
    const DEFAULT_TOLERANCE: f64 = 1e-7;

    fn of(value: f64) -> Self {
        value
    }

    fn as_f64(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    const DEFAULT_TOLERANCE: f32 = 1e-4;

    fn of(value: f64) -> Self {
        value as f32
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}
