//! Distance-bucketed formulation.
//!
//! The privacy metric is read cell-wise, `d(x, y)`, and cells sharing a
//! distance share a decision variable per output. Because the bound has the
//! form `exp(epsilon * distance)`, constraining only adjacent buckets of the
//! sorted distance list, in both directions, implies the bound between any
//! two buckets: the exponentials of the steps multiply to the exponential of
//! their telescoping sum.

use qif_core::{Metric, Prior, Scalar};

use crate::{
    buckets::DistanceTable,
    error::SynthesisResult,
    lp::{Direction, LpBuilder, LpSizing},
    solver::LpSolver,
    synthesis::{
        check_domain, check_epsilon, evaluate_cells, ratio, weighted_losses, Formulation,
        Mechanism, Program,
    },
};

/// Variable `bucket * outputs + y` holds every cell `(x, y)` whose distance
/// falls in `bucket`.
pub fn bucketed_program<T, D, L>(
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
    let table = DistanceTable::build(&evaluate_cells(privacy, m, n)?, n);
    let buckets = table.len();
    let ratios = (0..buckets - 1)
        .map(|b| ratio(epsilon, table.gap(b)))
        .collect::<Vec<T>>();
    let var = |x: usize, y: usize| table.bucket(x, y) * n + y;

    let mut lp = LpBuilder::new(LpSizing::bucketed(m, n, buckets), Direction::Minimize);
    for x in 0..m {
        for y in 0..n {
            lp.add_objective(var(x, y), weights[x * n + y]);
        }
    }
    for (b, &bound) in ratios.iter().enumerate() {
        for y in 0..n {
            let (near, far) = (b * n + y, (b + 1) * n + y);
            lp.ratio_bound(near, far, bound);
            lp.ratio_bound(far, near, bound);
        }
    }
    for x in 0..m {
        lp.unit_sum((0..n).map(|y| var(x, y)));
    }

    let cells = (0..m * n).map(|cell| var(cell / n, cell % n)).collect();
    Ok(Program::new(
        Formulation::Bucketed,
        lp.finish(),
        cells,
        m,
        n,
        Some(buckets),
    ))
}

pub fn bucketed_optimal<'d, T, D, L, S>(
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
    bucketed_program(prior, outputs, privacy, loss, epsilon)?.solve(
        privacy,
        solver,
        T::DEFAULT_TOLERANCE,
    )
}
