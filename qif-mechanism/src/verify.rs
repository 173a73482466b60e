//! Post-hoc checks on synthesized channels: expected loss and the ratio
//! bounds each formulation guarantees.

use qif_core::{Channel, Metric, Prior, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{SynthesisError, SynthesisResult};

/// A cell whose probability exceeds the ratio bound against another secret.
#[derive(Clone, Copy, Debug, Error, PartialEq, Serialize, Deserialize)]
#[error("C({secret}, {output}) = {value} exceeds {bound} allowed against secret {other}")]
pub struct PrivacyViolation {
    pub secret: usize,
    pub other: usize,
    pub output: usize,
    pub value: f64,
    pub bound: f64,
}

/// `sum pi(x) loss(x, y) C(x, y)`.
pub fn expected_loss<T, L>(
    prior: &Prior<T>,
    channel: &Channel<T>,
    loss: &L,
) -> SynthesisResult<T>
where
    T: Scalar,
    L: Metric<T> + ?Sized,
{
    if prior.len() != channel.n_rows() {
        return Err(SynthesisError::DimensionMismatch {
            prior: prior.len(),
            rows: channel.n_rows(),
        });
    }
    Ok(channel
        .rows()
        .enumerate()
        .flat_map(|(x, row)| {
            row.iter()
                .enumerate()
                .map(move |(y, &c)| prior[x] * loss.distance(x, y) * c)
        })
        .sum())
}

/// Checks `C(x1, y) <= exp(epsilon d(x1, x2)) C(x2, y) + tolerance` over all
/// ordered pairs of distinct secrets, the guarantee of the pairwise
/// formulation.
pub fn check_pairwise_bound<T, D>(
    channel: &Channel<T>,
    privacy: &D,
    epsilon: T,
    tolerance: T,
) -> Result<(), PrivacyViolation>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
{
    check_bound(channel, epsilon, tolerance, |x1, x2, _| {
        privacy.distance(x1, x2)
    })
}

/// Checks `C(x1, y) <= exp(epsilon |d(x1, y) - d(x2, y)|) C(x2, y) + tolerance`,
/// the guarantee of the bucketed formulations, whose metric is read per
/// (secret, output) cell.
pub fn check_cellwise_bound<T, D>(
    channel: &Channel<T>,
    privacy: &D,
    epsilon: T,
    tolerance: T,
) -> Result<(), PrivacyViolation>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
{
    check_bound(channel, epsilon, tolerance, |x1, x2, y| {
        (privacy.distance(x1, y) - privacy.distance(x2, y)).abs()
    })
}

fn check_bound<T, F>(
    channel: &Channel<T>,
    epsilon: T,
    tolerance: T,
    distance: F,
) -> Result<(), PrivacyViolation>
where
    T: Scalar,
    F: Fn(usize, usize, usize) -> T,
{
    let m = channel.n_rows();
    for x1 in 0..m {
        for x2 in (0..m).filter(|&x2| x2 != x1) {
            for y in 0..channel.n_cols() {
                let value = channel.get(x1, y);
                let bound = (epsilon * distance(x1, x2, y)).exp() * channel.get(x2, y);
                if value > bound + tolerance {
                    return Err(PrivacyViolation {
                        secret: x1,
                        other: x2,
                        output: y,
                        value: value.as_f64(),
                        bound: bound.as_f64(),
                    });
                }
            }
        }
    }
    Ok(())
}
