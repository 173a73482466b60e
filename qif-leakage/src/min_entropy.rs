//! Min-entropy (Bayes vulnerability) leakage: the adversary gets one guess.

use qif_core::{Channel, Prior, Scalar};
use serde::{Deserialize, Serialize};

use crate::{
    error::LeakageResult,
    measure::{check_dimensions, LeakageMeasure},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinEntropy;

impl<T: Scalar> LeakageMeasure<T> for MinEntropy {
    fn name(&self) -> &'static str {
        "min-entropy"
    }

    /// Probability of guessing the secret from the prior alone.
    fn vulnerability(&self, prior: &Prior<T>) -> LeakageResult<T> {
        Ok(prior.max())
    }

    /// `sum_y max_x pi(x) C(x, y)`.
    fn posterior_vulnerability(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T> {
        check_dimensions(prior, channel)?;
        Ok((0..channel.n_cols())
            .map(|y| column_max(channel, y, |x| prior[x]))
            .sum())
    }

    fn entropy(&self, prior: &Prior<T>) -> LeakageResult<T> {
        Ok(-self.vulnerability(prior)?.log2())
    }

    fn posterior_entropy(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T> {
        Ok(-self.posterior_vulnerability(prior, channel)?.log2())
    }

    /// `log2 sum_y max_x C(x, y)`, attained by the uniform prior.
    fn capacity(&self, channel: &Channel<T>) -> LeakageResult<T> {
        let total: T = (0..channel.n_cols())
            .map(|y| column_max(channel, y, |_| T::one()))
            .sum();
        Ok(total.log2())
    }
}

fn column_max<T: Scalar>(channel: &Channel<T>, y: usize, weight: impl Fn(usize) -> T) -> T {
    (0..channel.n_rows())
        .map(|x| weight(x) * channel.get(x, y))
        .fold(T::zero(), T::max)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::LeakageError;

    #[test]
    fn prior_entropy_in_bits() {
        let uniform2 = Prior::<f64>::uniform(2).unwrap();
        let uniform10 = Prior::<f64>::uniform(10).unwrap();
        let point = Prior::<f64>::dirac(4, 2).unwrap();
        assert_abs_diff_eq!(MinEntropy.entropy(&uniform2).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            MinEntropy.entropy(&uniform10).unwrap(),
            10f64.log2(),
            epsilon = 1e-12
        );
        assert_eq!(MinEntropy.entropy(&point).unwrap(), 0.0);
        let skewed = Prior::new(vec![0.25, 0.75]).unwrap();
        assert_abs_diff_eq!(
            MinEntropy.entropy(&skewed).unwrap(),
            -(0.75f64.log2()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn identity_reveals_the_secret() {
        let prior = Prior::<f64>::uniform(4).unwrap();
        let channel = Channel::identity(4).unwrap();
        assert_abs_diff_eq!(
            MinEntropy.posterior_vulnerability(&prior, &channel).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(MinEntropy.leakage(&prior, &channel).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(MinEntropy.capacity(&channel).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_channel_leaks_nothing() {
        let prior = Prior::new(vec![0.2, 0.3, 0.5]).unwrap();
        let channel = Channel::<f64>::no_interference(3, 2).unwrap();
        assert_abs_diff_eq!(MinEntropy.leakage(&prior, &channel).unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(MinEntropy.capacity(&channel).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn posterior_vulnerability_picks_column_maxima() {
        let prior = Prior::new(vec![0.5, 0.5]).unwrap();
        let channel = Channel::from_rows(vec![vec![0.8, 0.2], vec![0.3, 0.7]]).unwrap();
        // 0.5 * 0.8 + 0.5 * 0.7
        assert_abs_diff_eq!(
            MinEntropy.posterior_vulnerability(&prior, &channel).unwrap(),
            0.75,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            MinEntropy.capacity(&channel).unwrap(),
            1.5f64.log2(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rejects_mismatched_prior() {
        let prior = Prior::<f64>::uniform(3).unwrap();
        let channel = Channel::identity(2).unwrap();
        assert_eq!(
            MinEntropy.posterior_entropy(&prior, &channel),
            Err(LeakageError::DimensionMismatch { prior: 3, rows: 2 })
        );
    }
}
