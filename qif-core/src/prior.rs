use std::ops::Index;

use rand::Rng;
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};

use crate::{
    error::{QifError, QifResult},
    scalar::Scalar,
};

/// Immutable probability vector over the secret domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<T>", into = "Vec<T>", bound = "T: Scalar")]
pub struct Prior<T> {
    probs: Vec<T>,
}

impl<T: Scalar> Prior<T> {
    pub fn new(probs: Vec<T>) -> QifResult<Self> {
        Self::with_tolerance(probs, T::DEFAULT_TOLERANCE)
    }

    /// Validates `probs` allowing the row sum to deviate from one by `tolerance`.
    pub fn with_tolerance(probs: Vec<T>, tolerance: T) -> QifResult<Self> {
        if probs.is_empty() {
            return Err(QifError::EmptyDomain);
        }
        for (index, &value) in probs.iter().enumerate() {
            if !(value >= T::zero() && value <= T::one() + tolerance) {
                return Err(QifError::InvalidProbability {
                    index,
                    value: value.as_f64(),
                });
            }
        }
        let sum: T = probs.iter().copied().sum();
        if (sum - T::one()).abs() > tolerance {
            return Err(QifError::NotNormalized { sum: sum.as_f64() });
        }
        Ok(Self { probs })
    }

    pub fn uniform(len: usize) -> QifResult<Self> {
        if len == 0 {
            return Err(QifError::EmptyDomain);
        }
        let mass = T::one() / T::of(len as f64);
        Ok(Self {
            probs: vec![mass; len],
        })
    }

    /// Point mass on `index`.
    pub fn dirac(len: usize, index: usize) -> QifResult<Self> {
        if len == 0 {
            return Err(QifError::EmptyDomain);
        }
        if index >= len {
            return Err(QifError::OutOfRange { index, len });
        }
        let mut probs = vec![T::zero(); len];
        probs[index] = T::one();
        Ok(Self { probs })
    }

    /// Draws a prior uniformly from the probability simplex.
    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> QifResult<Self> {
        if len == 0 {
            return Err(QifError::EmptyDomain);
        }
        let weights: Vec<f64> = (0..len)
            .map(|_| -> f64 { Exp1.sample(&mut *rng) })
            .collect();
        let total: f64 = weights.iter().sum::<f64>().max(f64::MIN_POSITIVE);
        let probs = weights.iter().map(|w| T::of(w / total)).collect();
        Ok(Self { probs })
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.probs.get(index).copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.probs
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.probs.iter().copied()
    }

    /// Largest single probability, i.e. the prior vulnerability.
    pub fn max(&self) -> T {
        self.probs.iter().copied().fold(T::zero(), T::max)
    }
}

impl<T> Index<usize> for Prior<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.probs[index]
    }
}

impl<T: Scalar> TryFrom<Vec<T>> for Prior<T> {
    type Error = QifError;

    fn try_from(probs: Vec<T>) -> QifResult<Self> {
        Self::new(probs)
    }
}

impl<T> From<Prior<T>> for Vec<T> {
    fn from(prior: Prior<T>) -> Self {
        prior.probs
    }
}
