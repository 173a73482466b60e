//! Full pairwise formulation: one variable per channel cell and one ratio
//! bound per ordered pair of distinct secrets and output.

use qif_core::{Metric, Prior, Scalar};

use crate::{
    error::SynthesisResult,
    lp::{Direction, LpBuilder, LpSizing},
    solver::LpSolver,
    synthesis::{
        check_domain, check_epsilon, evaluate_pairs, ratio, weighted_losses, Formulation,
        Mechanism, Program,
    },
};

/// Builds the program minimizing `sum pi(x) loss(x, y) C(x, y)` subject to
/// `C(x1, y) <= exp(epsilon d(x1, x2)) C(x2, y)` and unit row sums.
/// Variable `x * outputs + y` holds `C(x, y)`.
pub fn pairwise_program<T, D, L>(
    prior: &Prior<T>,
    outputs: usize,
    privacy: &D,
    loss: &L,
    epsilon: T,
) -> SynthesisResult<Program<T>>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
    L: Metric<T> + ?Sized,
{
    check_domain(prior, outputs)?;
    check_epsilon(epsilon)?;
    let (m, n) = (prior.len(), outputs);
    let weights = weighted_losses(prior, n, loss)?;
    let ratios = evaluate_pairs(privacy, m)?
        .into_iter()
        .map(|distance| ratio(epsilon, distance))
        .collect::<Vec<T>>();

    let mut lp = LpBuilder::new(LpSizing::pairwise(m, n), Direction::Minimize);
    for (var, &weight) in weights.iter().enumerate() {
        lp.add_objective(var, weight);
    }
    for x1 in 0..m {
        for x2 in (0..m).filter(|&x2| x2 != x1) {
            let bound = ratios[x1 * m + x2];
            for y in 0..n {
                lp.ratio_bound(x1 * n + y, x2 * n + y, bound);
            }
        }
    }
    for x in 0..m {
        lp.unit_sum((0..n).map(|y| x * n + y));
    }

    Ok(Program::new(
        Formulation::Pairwise,
        lp.finish(),
        (0..m * n).collect(),
        m,
        n,
        None,
    ))
}

pub fn pairwise_optimal<'d, T, D, L, S>(
    prior: &Prior<T>,
    outputs: usize,
    privacy: &'d D,
    loss: &L,
    epsilon: T,
    solver: &S,
) -> SynthesisResult<Mechanism<'d, T, D>>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
    L: Metric<T> + ?Sized,
    S: LpSolver,
{
    pairwise_program(prior, outputs, privacy, loss, epsilon)?.solve(
        privacy,
        solver,
        T::DEFAULT_TOLERANCE,
    )
}
