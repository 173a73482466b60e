use std::fmt;

use qif_core::{Channel, Metric, Prior, Scalar};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    bucketed::bucketed_program,
    config::SynthesisConfig,
    error::{SynthesisError, SynthesisResult},
    lp::{LpDescriptor, LpSizing},
    pairwise::pairwise_program,
    solver::{LpSolver, MinilpSolver, SolverError},
    strict::strict_program,
};

/// Which LP encoding of the privacy bound to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Formulation {
    /// One variable per (secret, output) and one bound per ordered pair of
    /// distinct secrets and output.
    #[default]
    Pairwise,
    /// One variable per (distance bucket, output), adjacent buckets chained.
    Bucketed,
    /// One variable per distance bucket. Superseded by `Bucketed`; never
    /// better and kept for comparison.
    Strict,
}

/// Shape of the program a synthesis built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisSummary {
    pub formulation: Formulation,
    pub secrets: usize,
    pub outputs: usize,
    pub distinct_distances: Option<usize>,
    pub sizing: LpSizing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Scalar")]
pub enum SynthesisOutcome<T> {
    Solved { channel: Channel<T>, objective: T },
    Infeasible { reason: SolverError },
}

/// A privacy metric together with the channel synthesized for it. The
/// channel is absent when the program admitted no solution.
pub struct Mechanism<'d, T, D: ?Sized> {
    privacy: &'d D,
    outcome: SynthesisOutcome<T>,
    summary: SynthesisSummary,
}

impl<'d, T: Scalar, D: Metric<T> + ?Sized> Mechanism<'d, T, D> {
    pub fn privacy(&self) -> &'d D {
        self.privacy
    }

    pub fn outcome(&self) -> &SynthesisOutcome<T> {
        &self.outcome
    }

    pub fn summary(&self) -> &SynthesisSummary {
        &self.summary
    }

    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, SynthesisOutcome::Solved { .. })
    }

    pub fn channel(&self) -> Option<&Channel<T>> {
        match &self.outcome {
            SynthesisOutcome::Solved { channel, .. } => Some(channel),
            SynthesisOutcome::Infeasible { .. } => None,
        }
    }

    /// Optimal expected loss reported by the solver.
    pub fn objective(&self) -> Option<T> {
        match &self.outcome {
            SynthesisOutcome::Solved { objective, .. } => Some(*objective),
            SynthesisOutcome::Infeasible { .. } => None,
        }
    }

    pub fn into_channel(self) -> Option<Channel<T>> {
        match self.outcome {
            SynthesisOutcome::Solved { channel, .. } => Some(channel),
            SynthesisOutcome::Infeasible { .. } => None,
        }
    }

    /// Draws the output reported for `secret`.
    pub fn report<R: Rng + ?Sized>(&self, secret: usize, rng: &mut R) -> SynthesisResult<usize> {
        match &self.outcome {
            SynthesisOutcome::Solved { channel, .. } => Ok(channel.sample_output(secret, rng)?),
            SynthesisOutcome::Infeasible { reason } => {
                Err(SynthesisError::NoChannel(reason.clone()))
            }
        }
    }
}

impl<T: fmt::Debug, D: ?Sized> fmt::Debug for Mechanism<'_, T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mechanism")
            .field("outcome", &self.outcome)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// A built program together with the map from channel cells to the decision
/// variables that hold them.
#[derive(Clone, Debug)]
pub struct Program<T> {
    formulation: Formulation,
    lp: LpDescriptor<T>,
    cells: Vec<usize>,
    secrets: usize,
    outputs: usize,
    distinct_distances: Option<usize>,
}

impl<T: Scalar> Program<T> {
    pub(crate) fn new(
        formulation: Formulation,
        lp: LpDescriptor<T>,
        cells: Vec<usize>,
        secrets: usize,
        outputs: usize,
        distinct_distances: Option<usize>,
    ) -> Self {
        assert_eq!(cells.len(), secrets * outputs, "cell map does not cover the channel");
        Self {
            formulation,
            lp,
            cells,
            secrets,
            outputs,
            distinct_distances,
        }
    }

    pub fn formulation(&self) -> Formulation {
        self.formulation
    }

    pub fn lp(&self) -> &LpDescriptor<T> {
        &self.lp
    }

    /// Decision variable holding channel cell `(x, y)`.
    pub fn cell_variable(&self, x: usize, y: usize) -> usize {
        self.cells[x * self.outputs + y]
    }

    pub fn distinct_distances(&self) -> Option<usize> {
        self.distinct_distances
    }

    pub fn summary(&self) -> SynthesisSummary {
        SynthesisSummary {
            formulation: self.formulation,
            secrets: self.secrets,
            outputs: self.outputs,
            distinct_distances: self.distinct_distances,
            sizing: self.lp.sizing(),
        }
    }

    /// Runs the solver once and decodes its solution into a channel.
    /// Infeasible and unbounded programs yield a mechanism without a channel.
    pub fn solve<'d, D, S>(
        self,
        privacy: &'d D,
        solver: &S,
        tolerance: T,
    ) -> SynthesisResult<Mechanism<'d, T, D>>
    where
        D: Metric<T> + ?Sized,
        S: LpSolver,
    {
        let summary = self.summary();
        let solution = match solver.solve(&self.lp) {
            Ok(solution) => solution,
            Err(reason) => {
                warn!(formulation = ?self.formulation, %reason, "no mechanism satisfies the bound");
                return Ok(Mechanism {
                    privacy,
                    outcome: SynthesisOutcome::Infeasible { reason },
                    summary,
                });
            }
        };
        if solution.values.len() != self.lp.n_vars() {
            return Err(SynthesisError::SolutionLength {
                vars: self.lp.n_vars(),
                values: solution.values.len(),
            });
        }
        let violation = self.lp.max_violation(&solution.values);
        if violation > tolerance {
            warn!(formulation = ?self.formulation, %violation, "solver output breaks the program");
            return Err(SynthesisError::ConstraintViolation {
                violation: violation.as_f64(),
            });
        }
        let data = self
            .cells
            .iter()
            .map(|&var| snap_to_unit(solution.values[var], tolerance))
            .collect();
        let channel = Channel::with_tolerance(self.secrets, self.outputs, data, tolerance)
            .map_err(|err| {
                warn!(formulation = ?self.formulation, %err, "solver output is not stochastic");
                SynthesisError::InvalidSolution(err)
            })?;
        info!(
            formulation = ?self.formulation,
            objective = %solution.objective,
            "mechanism synthesized"
        );
        Ok(Mechanism {
            privacy,
            outcome: SynthesisOutcome::Solved {
                channel,
                objective: solution.objective,
            },
            summary,
        })
    }
}

/// Clamps solver round-off just outside `[0, 1]`; larger excursions are left
/// for channel validation to reject.
fn snap_to_unit<T: Scalar>(value: T, tolerance: T) -> T {
    if value < T::zero() && value >= -tolerance {
        T::zero()
    } else if value > T::one() && value <= T::one() + tolerance {
        T::one()
    } else {
        value
    }
}

pub(crate) fn check_domain<T: Scalar>(prior: &Prior<T>, outputs: usize) -> SynthesisResult<()> {
    if prior.is_empty() {
        return Err(SynthesisError::EmptyDomain);
    }
    if outputs == 0 {
        return Err(SynthesisError::NoOutputs);
    }
    Ok(())
}

pub(crate) fn check_epsilon<T: Scalar>(epsilon: T) -> SynthesisResult<()> {
    if epsilon.is_finite() && epsilon > T::zero() {
        Ok(())
    } else {
        Err(SynthesisError::InvalidEpsilon(epsilon.as_f64()))
    }
}

/// `exp(epsilon * distance)`, capped at the reciprocal of the element
/// type's tolerance. A capped bound only binds cells that are already below
/// that tolerance, and the solver squares coefficients internally.
pub(crate) fn ratio<T: Scalar>(epsilon: T, distance: T) -> T {
    (epsilon * distance).exp().min(ratio_ceiling())
}

pub(crate) fn ratio_ceiling<T: Scalar>() -> T {
    T::DEFAULT_TOLERANCE.recip()
}

fn check_distance<T: Scalar>(a: usize, b: usize, value: T) -> SynthesisResult<T> {
    if value.is_finite() && value >= T::zero() {
        Ok(value)
    } else {
        Err(SynthesisError::InvalidDistance {
            a,
            b,
            value: value.as_f64(),
        })
    }
}

/// Evaluates `metric` once per `(row, col)` cell, row-major.
pub(crate) fn evaluate_cells<T, D>(metric: &D, rows: usize, cols: usize) -> SynthesisResult<Vec<T>>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
{
    let mut grid = Vec::with_capacity(rows * cols);
    for x in 0..rows {
        for y in 0..cols {
            grid.push(check_distance(x, y, metric.distance(x, y))?);
        }
    }
    Ok(grid)
}

/// Evaluates `metric` once per ordered pair of distinct secrets. The diagonal
/// is left at zero and never evaluated.
pub(crate) fn evaluate_pairs<T, D>(metric: &D, secrets: usize) -> SynthesisResult<Vec<T>>
where
    T: Scalar,
    D: Metric<T> + ?Sized,
{
    let mut grid = vec![T::zero(); secrets * secrets];
    for x1 in 0..secrets {
        for x2 in (0..secrets).filter(|&x2| x2 != x1) {
            grid[x1 * secrets + x2] = check_distance(x1, x2, metric.distance(x1, x2))?;
        }
    }
    Ok(grid)
}

/// Objective weights `prior(x) * loss(x, y)`, row-major.
pub(crate) fn weighted_losses<T, L>(
    prior: &Prior<T>,
    outputs: usize,
    loss: &L,
) -> SynthesisResult<Vec<T>>
where
    T: Scalar,
    L: Metric<T> + ?Sized,
{
    let mut weights = Vec::with_capacity(prior.len() * outputs);
    for (x, p) in prior.iter().enumerate() {
        for y in 0..outputs {
            let value = loss.distance(x, y);
            if !(value.is_finite() && value >= T::zero()) {
                return Err(SynthesisError::InvalidLoss {
                    secret: x,
                    output: y,
                    value: value.as_f64(),
                });
            }
            weights.push(p * value);
        }
    }
    Ok(weights)
}

/// Dispatches synthesis requests to the configured formulation.
#[derive(Clone, Debug)]
pub struct MechanismSynthesizer<S = MinilpSolver> {
    config: SynthesisConfig,
    solver: S,
}

impl MechanismSynthesizer<MinilpSolver> {
    pub fn new(config: SynthesisConfig) -> SynthesisResult<Self> {
        Self::with_solver(config, MinilpSolver)
    }
}

impl<S: LpSolver> MechanismSynthesizer<S> {
    pub fn with_solver(config: SynthesisConfig, solver: S) -> SynthesisResult<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn program<T, D, L>(
        &self,
        prior: &Prior<T>,
        outputs: usize,
        privacy: &D,
        loss: &L,
    ) -> SynthesisResult<Program<T>>
    where
        T: Scalar,
        D: Metric<T> + ?Sized,
        L: Metric<T> + ?Sized,
    {
        let epsilon = T::of(self.config.epsilon);
        match self.config.formulation {
            Formulation::Pairwise => pairwise_program(prior, outputs, privacy, loss, epsilon),
            Formulation::Bucketed => bucketed_program(prior, outputs, privacy, loss, epsilon),
            Formulation::Strict => strict_program(prior, outputs, privacy, loss, epsilon),
        }
    }

    pub fn synthesize<'d, T, D, L>(
        &self,
        prior: &Prior<T>,
        outputs: usize,
        privacy: &'d D,
        loss: &L,
    ) -> SynthesisResult<Mechanism<'d, T, D>>
    where
        T: Scalar,
        D: Metric<T> + ?Sized,
        L: Metric<T> + ?Sized,
    {
        self.program(prior, outputs, privacy, loss)?.solve(
            privacy,
            &self.solver,
            self.config.tolerance_for(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_only_absorbs_round_off() {
        assert_eq!(snap_to_unit(-1e-9f64, 1e-7), 0.0);
        assert_eq!(snap_to_unit(1.0 + 1e-9f64, 1e-7), 1.0);
        assert_eq!(snap_to_unit(-1e-3f64, 1e-7), -1e-3);
        assert_eq!(snap_to_unit(0.5f64, 1e-7), 0.5);
    }

    #[test]
    fn ratio_is_capped_below_solver_overflow() {
        assert_eq!(ratio(1.0f64, 2.0), 2f64.exp());
        assert_eq!(ratio(500.0f64, 1.0), ratio_ceiling::<f64>());
        assert_eq!(ratio(1e3f64, 1.0), ratio_ceiling::<f64>());
        assert_eq!(ratio(100.0f32, 1.0), ratio_ceiling::<f32>());
        approx::assert_relative_eq!(ratio_ceiling::<f64>(), 1e7, max_relative = 1e-12);
        assert_eq!(ratio(1e-9f64, 0.0), 1.0);
    }

    #[test]
    fn pairs_skip_the_diagonal() {
        let calls = std::cell::Cell::new(0usize);
        let metric = |a: usize, b: usize| {
            calls.set(calls.get() + 1);
            assert_ne!(a, b, "diagonal must not be evaluated");
            1.0f64
        };
        let grid = evaluate_pairs(&metric, 3).unwrap();
        assert_eq!(calls.get(), 6);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[1], 1.0);
    }

    #[test]
    fn rejects_negative_distances() {
        let metric = |_: usize, _: usize| -1.0f64;
        assert!(matches!(
            evaluate_cells(&metric, 2, 2),
            Err(SynthesisError::InvalidDistance { a: 0, b: 0, .. })
        ));
    }

    #[test]
    fn rejects_nan_losses() {
        let prior = Prior::<f64>::uniform(2).unwrap();
        let loss = |x: usize, y: usize| if x == 1 && y == 0 { f64::NAN } else { 0.0 };
        assert!(matches!(
            weighted_losses(&prior, 2, &loss),
            Err(SynthesisError::InvalidLoss {
                secret: 1,
                output: 0,
                ..
            })
        ));
    }
}
