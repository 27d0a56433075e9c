//! Generational optimizer for the steering weights.

mod chromosome;
mod crossover;
mod optimizer;

pub use chromosome::{
    Chromosome, ALIGNMENT, COHESION, DIVERGENCE, GENE_COUNT, GOAL_SEEK, SEPARATION, WALL_AVOID,
};
pub use crossover::{saw_wrap, Crossover, CrossoverError};
pub use optimizer::{
    breed, cull, median, GeneticOptimizer, OptimizerError, OptimizerState, Species,
    CHILDREN_PER_PAIR,
};
