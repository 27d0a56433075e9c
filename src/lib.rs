//! Boid flocking with genetically tuned steering weights.
//!
//! Agents steer by a weighted sum of five rules. A trial runs one population
//! under one [`evolve::Chromosome`] until extinction or a time budget, and the
//! [`evolve::GeneticOptimizer`] breeds better weights from trial fitness.

pub mod boid;
pub mod config;
pub mod evolve;
pub mod fitness;
pub mod flock;
pub mod goal;
pub mod records;
pub mod rules;
pub mod runner;
pub mod sim;
pub mod vector;

pub use boid::{Boid, BoidId, BoidSnapshot};
pub use config::{Config, ConfigError, EvolutionConfig, NeighborStrategy, SimConfig, WorldBounds};
pub use evolve::{Chromosome, Crossover, GeneticOptimizer, OptimizerError, OptimizerState, Species};
pub use flock::{Flock, Flocks};
pub use goal::Goal;
pub use runner::{run_evolution, run_showcase, RunReport};
pub use sim::{Trial, TrialResult, TrialStatus};
pub use vector::{Compass, Vector};

/// Install a `fmt` subscriber filtered by `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
