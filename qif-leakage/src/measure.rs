use qif_core::{Channel, Prior, Scalar};
use serde::{Deserialize, Serialize};

use crate::error::{LeakageError, LeakageResult};

/// A family of uncertainty measures. Entropies are in bits.
pub trait LeakageMeasure<T: Scalar> {
    /// Human-readable family name used in error reports.
    fn name(&self) -> &'static str;

    fn vulnerability(&self, prior: &Prior<T>) -> LeakageResult<T>;

    fn posterior_vulnerability(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T>;

    fn entropy(&self, prior: &Prior<T>) -> LeakageResult<T>;

    fn posterior_entropy(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T>;

    /// Prior entropy minus posterior entropy.
    fn leakage(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T> {
        Ok(self.entropy(prior)? - self.posterior_entropy(prior, channel)?)
    }

    /// Leakage maximized over all priors.
    fn capacity(&self, channel: &Channel<T>) -> LeakageResult<T>;

    fn report(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<LeakageReport> {
        let prior_entropy = self.entropy(prior)?;
        let posterior_entropy = self.posterior_entropy(prior, channel)?;
        Ok(LeakageReport {
            measure: self.name().to_owned(),
            prior_entropy: prior_entropy.as_f64(),
            posterior_entropy: posterior_entropy.as_f64(),
            leakage: (prior_entropy - posterior_entropy).as_f64(),
            capacity: self.capacity(channel)?.as_f64(),
        })
    }
}

/// Snapshot of one measure applied to a prior and channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeakageReport {
    pub measure: String,
    pub prior_entropy: f64,
    pub posterior_entropy: f64,
    pub leakage: f64,
    pub capacity: f64,
}

pub(crate) fn check_dimensions<T: Scalar>(
    prior: &Prior<T>,
    channel: &Channel<T>,
) -> LeakageResult<()> {
    if prior.len() == channel.n_rows() {
        Ok(())
    } else {
        Err(LeakageError::DimensionMismatch {
            prior: prior.len(),
            rows: channel.n_rows(),
        })
    }
}
