//! Synthesizes location-privacy mechanisms over a 4x4 grid with every
//! formulation and prints what each one costs.
//!
//! Set `QIF_SYNTHESIS_CONFIG` to a TOML file to override epsilon and
//! tolerance; `RUST_LOG=debug` shows program sizing.

use std::{env, path::Path};

use anyhow::Context;
use qif_core::{GridEuclidean, Prior};
use qif_mechanism::{
    check_cellwise_bound, check_pairwise_bound, expected_loss, load_config, Formulation,
    MechanismSynthesizer, SynthesisConfig, SynthesisSummary,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

const WIDTH: usize = 4;

#[derive(Serialize)]
struct Row<'a> {
    summary: &'a SynthesisSummary,
    objective: f64,
    expected_loss: f64,
    reports_for_corner: Vec<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let base = match env::var("QIF_SYNTHESIS_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => SynthesisConfig::new(0.7, Formulation::Pairwise),
    };

    let cells = WIDTH * WIDTH;
    let grid = GridEuclidean::new(WIDTH, 1.0f64);
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let prior = Prior::random(cells, &mut rng)?;

    for formulation in [
        Formulation::Pairwise,
        Formulation::Bucketed,
        Formulation::Strict,
    ] {
        let config = SynthesisConfig {
            formulation,
            ..base.clone()
        };
        let tolerance = config.tolerance_for::<f64>();
        let synthesizer = MechanismSynthesizer::new(config)?;
        let mechanism = synthesizer.synthesize(&prior, cells, &grid, &grid)?;
        let (Some(channel), Some(objective)) = (mechanism.channel(), mechanism.objective()) else {
            println!("{formulation:?}: infeasible ({:?})", mechanism.outcome());
            continue;
        };

        let epsilon = synthesizer.config().epsilon;
        match formulation {
            Formulation::Pairwise => check_pairwise_bound(channel, &grid, epsilon, tolerance),
            Formulation::Bucketed | Formulation::Strict => {
                check_cellwise_bound(channel, &grid, epsilon, tolerance)
            }
        }
        .with_context(|| format!("{formulation:?} channel violates its bound"))?;

        let reports_for_corner = (0..8)
            .map(|_| mechanism.report(0, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        let row = Row {
            summary: mechanism.summary(),
            objective,
            expected_loss: expected_loss(&prior, channel, &grid)?,
            reports_for_corner,
        };
        println!("{}", serde_json::to_string_pretty(&row)?);
    }
    Ok(())
}
