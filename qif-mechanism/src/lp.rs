//! Linear-program descriptor handed to the solver, and the builder that
//! assembles it from coordinate triplets into buffers sized exactly once.

use qif_core::Scalar;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Relational sense of one constraint row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// Closed-form counts a formulation commits to before writing any value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LpSizing {
    pub vars: usize,
    pub constraints: usize,
    pub nonzeros: usize,
}

impl LpSizing {
    /// One variable per cell, one ratio bound per ordered pair of distinct
    /// secrets and output, one row-sum equality per secret.
    pub fn pairwise(secrets: usize, outputs: usize) -> Self {
        let pairs = secrets * secrets.saturating_sub(1);
        Self {
            vars: secrets * outputs,
            constraints: pairs * outputs + secrets,
            nonzeros: 2 * pairs * outputs + secrets * outputs,
        }
    }

    /// One variable per (distance bucket, output); two ratio bounds per
    /// adjacent bucket pair and output.
    pub fn bucketed(secrets: usize, outputs: usize, buckets: usize) -> Self {
        let gaps = buckets.saturating_sub(1);
        Self {
            vars: buckets * outputs,
            constraints: 2 * gaps * outputs + secrets,
            nonzeros: 4 * gaps * outputs + secrets * outputs,
        }
    }

    /// One variable per distance bucket regardless of output.
    pub fn strict(secrets: usize, outputs: usize, buckets: usize) -> Self {
        let gaps = buckets.saturating_sub(1);
        Self {
            vars: buckets,
            constraints: 2 * gaps + secrets,
            nonzeros: 4 * gaps + secrets * outputs,
        }
    }
}

/// One nonzero of the sparse constraint matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triplet<T> {
    pub row: usize,
    pub col: usize,
    pub value: T,
}

/// A deserialized descriptor that disagrees with its own sizing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("{field} holds {len} entries, sizing requires {expected}")]
    Length {
        field: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("triplet {index} addresses ({row}, {col}) outside {rows} x {cols}")]
    OutOfRange {
        index: usize,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Immutable LP in coordinate form. Several triplets may address the same
/// cell; their values add up. Deserialization checks every buffer against
/// the recorded sizing, the same counts `LpBuilder::finish` asserts.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(bound = "T: Scalar")]
pub struct LpDescriptor<T> {
    sizing: LpSizing,
    direction: Direction,
    objective: Vec<T>,
    rhs: Vec<T>,
    senses: Vec<Sense>,
    triplets: Vec<Triplet<T>>,
}

impl<T: Scalar> LpDescriptor<T> {
    pub fn sizing(&self) -> LpSizing {
        self.sizing
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn n_vars(&self) -> usize {
        self.objective.len()
    }

    pub fn n_constraints(&self) -> usize {
        self.rhs.len()
    }

    pub fn objective(&self) -> &[T] {
        &self.objective
    }

    pub fn rhs(&self) -> &[T] {
        &self.rhs
    }

    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    pub fn triplets(&self) -> &[Triplet<T>] {
        &self.triplets
    }

    /// Constraint rows as `(variable, coefficient)` lists sorted by variable,
    /// with repeated cells summed.
    pub fn rows(&self) -> Vec<Vec<(usize, T)>> {
        let mut rows = vec![Vec::new(); self.rhs.len()];
        for triplet in &self.triplets {
            rows[triplet.row].push((triplet.col, triplet.value));
        }
        for row in &mut rows {
            row.sort_by_key(|&(col, _)| col);
            row.dedup_by(|next, kept| {
                if next.0 == kept.0 {
                    kept.1 += next.1;
                    true
                } else {
                    false
                }
            });
        }
        rows
    }

    /// Largest amount by which `x` violates a constraint or the
    /// non-negativity bound; zero when `x` is feasible.
    pub fn max_violation(&self, x: &[T]) -> T {
        let mut activity = vec![T::zero(); self.rhs.len()];
        for triplet in &self.triplets {
            activity[triplet.row] += triplet.value * x[triplet.col];
        }
        let rows = activity
            .iter()
            .zip(&self.rhs)
            .zip(&self.senses)
            .map(|((&lhs, &rhs), sense)| match sense {
                Sense::Le => (lhs - rhs).max(T::zero()),
                Sense::Ge => (rhs - lhs).max(T::zero()),
                Sense::Eq => (lhs - rhs).abs(),
            });
        let bounds = x.iter().map(|&v| (-v).max(T::zero()));
        rows.chain(bounds).fold(T::zero(), T::max)
    }
}

#[derive(Deserialize)]
#[serde(bound = "T: Scalar")]
struct RawDescriptor<T> {
    sizing: LpSizing,
    direction: Direction,
    objective: Vec<T>,
    rhs: Vec<T>,
    senses: Vec<Sense>,
    triplets: Vec<Triplet<T>>,
}

impl<T: Scalar> RawDescriptor<T> {
    fn check(&self) -> Result<(), DescriptorError> {
        let LpSizing {
            vars,
            constraints,
            nonzeros,
        } = self.sizing;
        for (field, len, expected) in [
            ("objective", self.objective.len(), vars),
            ("rhs", self.rhs.len(), constraints),
            ("senses", self.senses.len(), constraints),
            ("triplets", self.triplets.len(), nonzeros),
        ] {
            if len != expected {
                return Err(DescriptorError::Length {
                    field,
                    len,
                    expected,
                });
            }
        }
        match self
            .triplets
            .iter()
            .position(|t| t.row >= constraints || t.col >= vars)
        {
            Some(index) => Err(DescriptorError::OutOfRange {
                index,
                row: self.triplets[index].row,
                col: self.triplets[index].col,
                rows: constraints,
                cols: vars,
            }),
            None => Ok(()),
        }
    }
}

impl<'de, T: Scalar> Deserialize<'de> for LpDescriptor<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDescriptor::<T>::deserialize(deserializer)?;
        raw.check()
            .map_err(<D::Error as serde::de::Error>::custom)?;
        Ok(Self {
            sizing: raw.sizing,
            direction: raw.direction,
            objective: raw.objective,
            rhs: raw.rhs,
            senses: raw.senses,
            triplets: raw.triplets,
        })
    }
}

/// Accumulates an [`LpDescriptor`] into buffers allocated once from an
/// [`LpSizing`]. Writing past the sizing, or finishing short of it, is a
/// defect in the formulation and panics.
#[derive(Debug)]
pub struct LpBuilder<T> {
    sizing: LpSizing,
    direction: Direction,
    objective: Vec<T>,
    rhs: Vec<T>,
    senses: Vec<Sense>,
    triplets: Vec<Triplet<T>>,
}

impl<T: Scalar> LpBuilder<T> {
    pub fn new(sizing: LpSizing, direction: Direction) -> Self {
        Self {
            sizing,
            direction,
            objective: vec![T::zero(); sizing.vars],
            rhs: Vec::with_capacity(sizing.constraints),
            senses: Vec::with_capacity(sizing.constraints),
            triplets: Vec::with_capacity(sizing.nonzeros),
        }
    }

    /// Adds `coeff` to the objective coefficient of `var`.
    pub fn add_objective(&mut self, var: usize, coeff: T) {
        self.objective[var] += coeff;
    }

    /// Opens a new constraint row and returns its index.
    pub fn constraint(&mut self, sense: Sense, rhs: T) -> usize {
        assert!(
            self.rhs.len() < self.sizing.constraints,
            "constraint {} exceeds sizing of {}",
            self.rhs.len(),
            self.sizing.constraints
        );
        self.rhs.push(rhs);
        self.senses.push(sense);
        self.rhs.len() - 1
    }

    pub fn coefficient(&mut self, row: usize, col: usize, value: T) {
        assert!(
            self.triplets.len() < self.sizing.nonzeros,
            "nonzero {} exceeds sizing of {}",
            self.triplets.len(),
            self.sizing.nonzeros
        );
        assert!(row < self.rhs.len(), "row {row} was never opened");
        assert!(col < self.sizing.vars, "variable {col} out of range");
        self.triplets.push(Triplet { row, col, value });
    }

    /// `x[lhs] <= ratio * x[rhs]`, written as `x[lhs] - ratio * x[rhs] <= 0`.
    pub fn ratio_bound(&mut self, lhs: usize, rhs: usize, ratio: T) {
        let row = self.constraint(Sense::Le, T::zero());
        self.coefficient(row, lhs, T::one());
        self.coefficient(row, rhs, -ratio);
    }

    /// `sum x[v] = 1` over `vars`; a variable listed twice gets coefficient 2.
    pub fn unit_sum<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let row = self.constraint(Sense::Eq, T::one());
        for var in vars {
            self.coefficient(row, var, T::one());
        }
    }

    pub fn finish(self) -> LpDescriptor<T> {
        assert_eq!(
            self.rhs.len(),
            self.sizing.constraints,
            "constraints written differ from sizing"
        );
        assert_eq!(
            self.triplets.len(),
            self.sizing.nonzeros,
            "nonzeros written differ from sizing"
        );
        debug!(
            vars = self.sizing.vars,
            constraints = self.sizing.constraints,
            nonzeros = self.sizing.nonzeros,
            "lp descriptor finalized"
        );
        LpDescriptor {
            sizing: self.sizing,
            direction: self.direction,
            objective: self.objective,
            rhs: self.rhs,
            senses: self.senses,
            triplets: self.triplets,
        }
    }
}
