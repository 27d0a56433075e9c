//! Drives whole evolution runs: every trial of a generation in parallel,
//! then one optimizer step.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, ConfigError, SimConfig};
use crate::evolve::{Chromosome, GeneticOptimizer, OptimizerError, OptimizerState, Species};
use crate::sim::{trial_rng, Trial, TrialResult};

/// Everything a finished run produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Every evaluated species, oldest generation first.
    pub history: Vec<Species>,
    pub best_per_generation: Vec<Species>,
    pub best: Option<Species>,
    /// Unevaluated offspring of the last generation, ready to seed a follow-up run.
    pub next_generation: Vec<Species>,
}

/// Run trials for every pending species of the current generation.
///
/// Trials are independent: each gets its own agents, goals and RNG stream, so
/// they run in parallel and the results do not depend on scheduling.
pub fn evaluate_generation(
    optimizer: &mut GeneticOptimizer,
    sim: &SimConfig,
) -> Result<(), OptimizerError> {
    let seed = optimizer.config().seed;
    let generation = optimizer.generation();

    let outcomes = optimizer
        .population()
        .par_iter()
        .filter(|species| !species.is_evaluated())
        .map(|species| -> Result<(usize, TrialResult), ConfigError> {
            let rng = trial_rng(seed, generation, species.id);
            let trial = Trial::new(sim.clone(), species.genome, rng)?;
            Ok((species.id, trial.run()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (id, result) in outcomes {
        optimizer.record(id, result.fitness, result.live_time, result.survivors)?;
    }
    Ok(())
}

/// Evolve steering weights for `config.evolution.generations` generations.
pub fn run_evolution(config: &Config) -> Result<RunReport, OptimizerError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.evolution.seed);
    let mut optimizer = GeneticOptimizer::new(config.evolution.clone(), &mut rng)?;
    info!(
        generations = config.evolution.generations,
        population = config.evolution.population,
        agents = config.sim.population,
        search = ?config.sim.neighbor_search,
        "starting evolution"
    );

    while optimizer.state() != OptimizerState::Done {
        evaluate_generation(&mut optimizer, &config.sim)?;
        optimizer.advance(&mut rng)?;
    }

    if let Some(best) = optimizer.best() {
        info!(
            generation = best.generation,
            species = best.id,
            performance = best.performance,
            genome = %best.genome,
            "best genome"
        );
    }

    Ok(RunReport {
        history: optimizer.history().to_vec(),
        best_per_generation: optimizer.best_per_generation().to_vec(),
        best: optimizer.best().cloned(),
        next_generation: optimizer.next_population().to_vec(),
    })
}

/// One trial of a fixed genome, outside any evolution run.
pub fn run_showcase(sim: &SimConfig, genome: Chromosome, seed: u64) -> Result<TrialResult, ConfigError> {
    let trial = Trial::new(sim.clone(), genome, StdRng::seed_from_u64(seed))?;
    Ok(trial.run())
}
