use std::cell::Cell;

use qif_core::{Discrete, LineDistance, Prior, Scalar};
use qif_mechanism::{
    bucketed_program, pairwise_optimal, pairwise_program, Formulation, LpDescriptor, LpSizing,
    LpSolution, LpSolver, MechanismSynthesizer, SolverError, SynthesisConfig, SynthesisError,
    SynthesisOutcome,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn line(a: usize, b: usize) -> f64 {
    a.abs_diff(b) as f64
}

struct RefusingSolver;

impl LpSolver for RefusingSolver {
    fn solve<T: Scalar>(&self, _lp: &LpDescriptor<T>) -> Result<LpSolution<T>, SolverError> {
        Err(SolverError::Infeasible)
    }
}

/// Returns `len` copies of `value` regardless of the program.
struct ConstantSolver {
    value: f64,
    len: Option<usize>,
}

impl LpSolver for ConstantSolver {
    fn solve<T: Scalar>(&self, lp: &LpDescriptor<T>) -> Result<LpSolution<T>, SolverError> {
        Ok(LpSolution {
            values: vec![T::of(self.value); self.len.unwrap_or(lp.n_vars())],
            objective: T::of(0.0),
        })
    }
}

#[test]
fn dispatches_on_configured_formulation() -> anyhow::Result<()> {
    let prior = Prior::<f64>::uniform(4)?;
    for formulation in [
        Formulation::Pairwise,
        Formulation::Bucketed,
        Formulation::Strict,
    ] {
        let synthesizer = MechanismSynthesizer::new(SynthesisConfig::new(0.5, formulation))?;
        let mechanism = synthesizer.synthesize(&prior, 4, &line, &line)?;
        assert_eq!(mechanism.summary().formulation, formulation);
        assert!(mechanism.is_solved());
        let expected = match formulation {
            Formulation::Pairwise => LpSizing::pairwise(4, 4),
            Formulation::Bucketed => LpSizing::bucketed(4, 4, 4),
            Formulation::Strict => LpSizing::strict(4, 4, 4),
        };
        assert_eq!(mechanism.summary().sizing, expected);
    }
    Ok(())
}

#[test]
fn synthesizer_reads_toml_config() -> anyhow::Result<()> {
    let config = SynthesisConfig::from_toml_str(
        r#"
            epsilon = 2.0
            formulation = "bucketed"
            tolerance = 1e-6
        "#,
    )?;
    let synthesizer = MechanismSynthesizer::new(config)?;
    assert_eq!(synthesizer.config().formulation, Formulation::Bucketed);
    let prior = Prior::<f64>::uniform(2)?;
    let mechanism = synthesizer.synthesize(&prior, 2, &line, &line)?;
    let e2 = 2f64.exp();
    approx::assert_abs_diff_eq!(mechanism.objective().unwrap(), 1.0 / (1.0 + e2), epsilon = 1e-6);
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    let err = MechanismSynthesizer::new(SynthesisConfig::new(-1.0, Formulation::Pairwise))
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Config(_)));
}

#[test]
fn infeasible_programs_return_mechanism_without_channel() {
    let prior = Prior::<f64>::uniform(3).unwrap();
    let mechanism = pairwise_optimal(&prior, 3, &line, &line, 1.0, &RefusingSolver).unwrap();
    assert!(!mechanism.is_solved());
    assert!(mechanism.channel().is_none());
    assert!(mechanism.objective().is_none());
    assert_eq!(
        mechanism.outcome(),
        &SynthesisOutcome::Infeasible {
            reason: SolverError::Infeasible
        }
    );
    // the metric the synthesis was attempted with stays inspectable
    assert_eq!(mechanism.privacy()(0, 2), 2.0);
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    assert!(matches!(
        mechanism.report(0, &mut rng),
        Err(SynthesisError::NoChannel(SolverError::Infeasible))
    ));
}

#[test]
fn solutions_breaking_the_program_are_rejected() {
    let prior = Prior::<f64>::uniform(2).unwrap();
    let solver = ConstantSolver {
        value: 0.9,
        len: None,
    };
    let program = pairwise_program(&prior, 2, &line, &line, 1.0).unwrap();
    match program.solve(&line, &solver, 1e-7).unwrap_err() {
        // rows sum to 1.8
        SynthesisError::ConstraintViolation { violation } => {
            approx::assert_abs_diff_eq!(violation, 0.8, epsilon = 1e-12)
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn short_solutions_are_rejected() {
    let prior = Prior::<f64>::uniform(2).unwrap();
    let solver = ConstantSolver {
        value: 0.5,
        len: Some(3),
    };
    let program = pairwise_program(&prior, 2, &line, &line, 1.0).unwrap();
    assert!(matches!(
        program.solve(&line, &solver, 1e-7),
        Err(SynthesisError::SolutionLength { vars: 4, values: 3 })
    ));
}

#[test]
fn zero_outputs_rejected_by_every_formulation() {
    let prior = Prior::<f64>::uniform(3).unwrap();
    for formulation in [
        Formulation::Pairwise,
        Formulation::Bucketed,
        Formulation::Strict,
    ] {
        let synthesizer = MechanismSynthesizer::new(SynthesisConfig::new(1.0, formulation)).unwrap();
        let err = synthesizer.synthesize(&prior, 0, &line, &line).unwrap_err();
        assert!(matches!(err, SynthesisError::NoOutputs), "{formulation:?}");
    }
}

#[test]
fn metrics_are_evaluated_once_per_pair_or_cell() {
    let prior = Prior::<f64>::uniform(4).unwrap();
    let calls = Cell::new(0usize);
    let counted = |a: usize, b: usize| {
        calls.set(calls.get() + 1);
        line(a, b)
    };

    pairwise_program(&prior, 3, &counted, &line, 1.0).unwrap();
    assert_eq!(calls.replace(0), 4 * 3);

    bucketed_program(&prior, 3, &counted, &line, 1.0).unwrap();
    assert_eq!(calls.replace(0), 4 * 3);
}

#[test]
fn reports_follow_the_synthesized_channel() {
    let prior = Prior::<f64>::uniform(3).unwrap();
    let synthesizer =
        MechanismSynthesizer::new(SynthesisConfig::new(10.0, Formulation::Pairwise)).unwrap();
    let mechanism = synthesizer
        .synthesize(&prior, 3, &Discrete, &Discrete)
        .unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let hits = (0..200)
        .filter(|_| mechanism.report(2, &mut rng).unwrap() == 2)
        .count();
    assert!(hits > 190, "secret reported truthfully only {hits}/200 times");
}

#[test]
fn summary_serializes_to_json() {
    let prior = Prior::<f64>::uniform(2).unwrap();
    let d = LineDistance::new(1.0);
    let synthesizer =
        MechanismSynthesizer::new(SynthesisConfig::new(1.0, Formulation::Strict)).unwrap();
    let mechanism = synthesizer.synthesize(&prior, 2, &d, &d).unwrap();
    let json = serde_json::to_value(mechanism.summary()).unwrap();
    assert_eq!(json["formulation"], "strict");
    assert_eq!(json["distinct_distances"], 2);
    assert_eq!(json["sizing"]["vars"], 2);
}
