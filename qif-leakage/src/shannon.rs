//! Shannon entropy and mutual-information leakage.

use qif_core::{Channel, Prior, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{LeakageError, LeakageResult},
    measure::{check_dimensions, LeakageMeasure},
};

const DEFAULT_MAX_ITERATIONS: usize = 10_000;
const DEFAULT_PRECISION: f64 = 1e-9;

/// Shannon measures. Capacity runs Blahut-Arimoto until the gap between its
/// lower and upper bound drops below `precision` nats or `max_iterations`
/// rounds have run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Shannon {
    max_iterations: usize,
    precision: f64,
}

impl Default for Shannon {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Shannon {
    pub fn new(max_iterations: usize, precision: f64) -> LeakageResult<Self> {
        if max_iterations == 0 {
            return Err(LeakageError::InvalidParameters(
                "max_iterations is zero".into(),
            ));
        }
        if !(precision.is_finite() && precision > 0.0) {
            return Err(LeakageError::InvalidParameters(format!(
                "precision {precision}"
            )));
        }
        Ok(Self {
            max_iterations,
            precision,
        })
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Capacity in bits together with the prior that attains it.
    pub fn capacity_with_prior<T: Scalar>(
        &self,
        channel: &Channel<T>,
    ) -> LeakageResult<(T, Prior<T>)> {
        let rows: Vec<Vec<f64>> = channel
            .rows()
            .map(|row| row.iter().map(|c| c.as_f64()).collect())
            .collect();
        let m = rows.len();
        let mut input = vec![1.0 / m as f64; m];
        let mut rounds = 0;
        let lower = loop {
            rounds += 1;
            let gains = divergence_gains(&rows, &input);
            let total: f64 = input.iter().zip(&gains).map(|(p, g)| p * g).sum();
            let lower = total.ln();
            let upper = gains.iter().copied().fold(f64::MIN, f64::max).ln();
            if upper - lower < self.precision {
                debug!(rounds, capacity = lower, "blahut-arimoto converged");
                break lower;
            }
            if rounds >= self.max_iterations {
                warn!(rounds, gap = upper - lower, "blahut-arimoto stopped before converging");
                break lower;
            }
            for (p, g) in input.iter_mut().zip(&gains) {
                *p *= g / total;
            }
        };
        let prior = Prior::with_tolerance(
            input.into_iter().map(T::of).collect(),
            T::DEFAULT_TOLERANCE,
        )?;
        Ok((T::of(lower / std::f64::consts::LN_2), prior))
    }
}

/// `exp(D(C(x, .) || q))` per row, where `q` is the output distribution
/// induced by `input`.
fn divergence_gains(rows: &[Vec<f64>], input: &[f64]) -> Vec<f64> {
    let cols = rows.first().map_or(0, Vec::len);
    let output: Vec<f64> = (0..cols)
        .map(|y| rows.iter().zip(input).map(|(row, p)| p * row[y]).sum())
        .collect();
    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&output)
                .filter(|&(&c, _)| c > 0.0)
                .map(|(&c, &q)| c * (c / q).ln())
                .sum::<f64>()
                .exp()
        })
        .collect()
}

fn plogp<T: Scalar>(p: T) -> T {
    if p > T::zero() {
        p * p.log2()
    } else {
        T::zero()
    }
}

impl<T: Scalar> LeakageMeasure<T> for Shannon {
    fn name(&self) -> &'static str {
        "shannon"
    }

    fn vulnerability(&self, _prior: &Prior<T>) -> LeakageResult<T> {
        Err(LeakageError::Unsupported {
            measure: "shannon",
            quantity: "vulnerability",
        })
    }

    fn posterior_vulnerability(
        &self,
        _prior: &Prior<T>,
        _channel: &Channel<T>,
    ) -> LeakageResult<T> {
        Err(LeakageError::Unsupported {
            measure: "shannon",
            quantity: "posterior vulnerability",
        })
    }

    /// `-sum pi(x) log2 pi(x)`.
    fn entropy(&self, prior: &Prior<T>) -> LeakageResult<T> {
        Ok(-prior.iter().map(plogp).sum::<T>())
    }

    /// `H(X | Y) = H(X, Y) - H(Y)` over the joint `pi(x) C(x, y)`.
    fn posterior_entropy(&self, prior: &Prior<T>, channel: &Channel<T>) -> LeakageResult<T> {
        check_dimensions(prior, channel)?;
        let mut joint = T::zero();
        let mut outputs = vec![T::zero(); channel.n_cols()];
        for (x, row) in channel.rows().enumerate() {
            for (y, &c) in row.iter().enumerate() {
                let j = prior[x] * c;
                joint += plogp(j);
                outputs[y] += j;
            }
        }
        let marginal: T = outputs.into_iter().map(plogp).sum();
        Ok((marginal - joint).max(T::zero()))
    }

    fn capacity(&self, channel: &Channel<T>) -> LeakageResult<T> {
        Ok(self.capacity_with_prior(channel)?.0)
    }
}
