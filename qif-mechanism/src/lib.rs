//! Synthesis of utility-optimal mechanisms under a distance-based privacy
//! bound. Given a prior over secrets, a privacy metric, a loss function and a
//! budget epsilon, each formulation assembles a linear program whose optimum
//! is the channel of least expected loss satisfying
//! `C(x1, y) <= exp(epsilon d) C(x2, y)`, solves it once, and decodes the
//! solution into a row-stochastic channel.
//!
//! ```
//! use qif_core::Prior;
//! use qif_mechanism::{Formulation, MechanismSynthesizer, SynthesisConfig};
//!
//! let line = |a: usize, b: usize| a.abs_diff(b) as f64;
//! let prior = Prior::uniform(3).unwrap();
//! let synthesizer =
//!     MechanismSynthesizer::new(SynthesisConfig::new(1.0, Formulation::Bucketed)).unwrap();
//! let mechanism = synthesizer.synthesize(&prior, 3, &line, &line).unwrap();
//! assert!(mechanism.channel().unwrap().is_stochastic(1e-7));
//! ```

pub mod bucketed;
pub mod buckets;
pub mod config;
pub mod error;
pub mod lp;
pub mod pairwise;
pub mod solver;
pub mod strict;
pub mod synthesis;
pub mod verify;

pub use bucketed::{bucketed_optimal, bucketed_program};
pub use buckets::DistanceTable;
pub use config::{load_config, ConfigError, SynthesisConfig};
pub use error::{SynthesisError, SynthesisResult};
pub use lp::{DescriptorError, Direction, LpBuilder, LpDescriptor, LpSizing, Sense, Triplet};
pub use pairwise::{pairwise_optimal, pairwise_program};
pub use solver::{LpSolution, LpSolver, MinilpSolver, SolverError};
pub use strict::{strict_optimal, strict_program};
pub use synthesis::{
    Formulation, Mechanism, MechanismSynthesizer, Program, SynthesisOutcome, SynthesisSummary,
};
pub use verify::{check_cellwise_bound, check_pairwise_bound, expected_loss, PrivacyViolation};
