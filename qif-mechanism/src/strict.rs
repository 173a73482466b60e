//! Strict single-variable formulation: one decision variable per distinct
//! distance, shared by every secret and output.
//!
//! This is the earlier model the bucketed formulation replaced. Its feasible
//! set embeds into the bucketed one, so its optimum is never better; it is
//! kept to compare against.

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

pub fn strict_program<T, D, L>(
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

    let mut lp = LpBuilder::new(LpSizing::strict(m, n, buckets), Direction::Minimize);
    for x in 0..m {
        for y in 0..n {
            lp.add_objective(table.bucket(x, y), weights[x * n + y]);
        }
    }
    for (b, &bound) in ratios.iter().enumerate() {
        lp.ratio_bound(b, b + 1, bound);
        lp.ratio_bound(b + 1, b, bound);
    }
    // several outputs of one secret may land in the same bucket; their unit
    // coefficients add up in the solver's view of the row
    for x in 0..m {
        lp.unit_sum((0..n).map(|y| table.bucket(x, y)));
    }

    let cells = (0..m * n)
        .map(|cell| table.bucket(cell / n, cell % n))
        .collect();
    Ok(Program::new(
        Formulation::Strict,
        lp.finish(),
        cells,
        m,
        n,
        Some(buckets),
    ))
}

pub fn strict_optimal<'d, T, D, L, S>(
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
    strict_program(prior, outputs, privacy, loss, epsilon)?.solve(
        privacy,
        solver,
        T::DEFAULT_TOLERANCE,
    )
}
