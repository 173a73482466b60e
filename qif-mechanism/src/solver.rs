use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use qif_core::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lp::{Direction, LpDescriptor, Sense};

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverError {
    #[error("linear program is infeasible")]
    Infeasible,
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("solver backend failure: {0}")]
    Backend(String),
}

/// Optimal assignment of every decision variable.
#[derive(Clone, Debug, PartialEq)]
pub struct LpSolution<T> {
    pub values: Vec<T>,
    pub objective: T,
}

/// Solves an [`LpDescriptor`] in one blocking call. Every decision variable
/// is bounded below by zero.
pub trait LpSolver {
    fn solve<T: Scalar>(&self, lp: &LpDescriptor<T>) -> Result<LpSolution<T>, SolverError>;
}

/// Simplex backend provided by the `minilp` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinilpSolver;

impl LpSolver for MinilpSolver {
    fn solve<T: Scalar>(&self, lp: &LpDescriptor<T>) -> Result<LpSolution<T>, SolverError> {
        let direction = match lp.direction() {
            Direction::Minimize => OptimizationDirection::Minimize,
            Direction::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);
        let vars: Vec<Variable> = lp
            .objective()
            .iter()
            .map(|coeff| problem.add_var(coeff.as_f64(), (0.0, f64::INFINITY)))
            .collect();
        for ((terms, sense), rhs) in lp.rows().into_iter().zip(lp.senses()).zip(lp.rhs()) {
            let mut expr = LinearExpr::empty();
            for (var, coeff) in terms {
                expr.add(vars[var], coeff.as_f64());
            }
            let op = match sense {
                Sense::Le => ComparisonOp::Le,
                Sense::Eq => ComparisonOp::Eq,
                Sense::Ge => ComparisonOp::Ge,
            };
            problem.add_constraint(expr, op, rhs.as_f64());
        }
        let solution = problem.solve().map_err(|err| match err {
            minilp::Error::Infeasible => SolverError::Infeasible,
            minilp::Error::Unbounded => SolverError::Unbounded,
            #[allow(unreachable_patterns)]
            other => SolverError::Backend(format!("{other:?}")),
        })?;
        Ok(LpSolution {
            values: vars.iter().map(|&var| T::of(solution[var])).collect(),
            objective: T::of(solution.objective()),
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::lp::{LpBuilder, LpSizing};

    #[test]
    fn solves_small_program() {
        // max x + 2y  s.t.  x + y <= 4,  y <= 3
        let sizing = LpSizing {
            vars: 2,
            constraints: 2,
            nonzeros: 3,
        };
        let mut builder = LpBuilder::<f64>::new(sizing, Direction::Maximize);
        builder.add_objective(0, 1.0);
        builder.add_objective(1, 2.0);
        let row = builder.constraint(Sense::Le, 4.0);
        builder.coefficient(row, 0, 1.0);
        builder.coefficient(row, 1, 1.0);
        let row = builder.constraint(Sense::Le, 3.0);
        builder.coefficient(row, 1, 1.0);
        let lp = builder.finish();

        let solution = MinilpSolver.solve(&lp).unwrap();
        assert_abs_diff_eq!(solution.objective, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.values[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.values[1], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn reports_infeasibility() {
        let sizing = LpSizing {
            vars: 1,
            constraints: 2,
            nonzeros: 2,
        };
        let mut builder = LpBuilder::<f32>::new(sizing, Direction::Minimize);
        let row = builder.constraint(Sense::Ge, 2.0);
        builder.coefficient(row, 0, 1.0);
        let row = builder.constraint(Sense::Le, 1.0);
        builder.coefficient(row, 0, 1.0);
        let lp = builder.finish();
        assert_eq!(MinilpSolver.solve(&lp), Err(SolverError::Infeasible));
    }

    #[test]
    fn reports_unboundedness() {
        let sizing = LpSizing {
            vars: 1,
            constraints: 1,
            nonzeros: 1,
        };
        let mut builder = LpBuilder::<f64>::new(sizing, Direction::Maximize);
        builder.add_objective(0, 1.0);
        let row = builder.constraint(Sense::Ge, 1.0);
        builder.coefficient(row, 0, 1.0);
        let lp = builder.finish();
        assert_eq!(MinilpSolver.solve(&lp), Err(SolverError::Unbounded));
    }
}
