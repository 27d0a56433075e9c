use crate::boid::Boid;
use crate::config::NeighborStrategy;

/// A pluggable neighbor query that can be swapped without touching steering logic.
pub trait NeighborSearch: Send + Sync {
    /// Rebuild internal structures based on the current agent positions.
    fn rebuild(&mut self, boids: &[Boid]);

    /// Indices of agents that may lie within `range` of `index`, in ascending
    /// order and excluding `index` itself. Agents further away may be included.
    fn candidates(&self, boids: &[Boid], index: usize, range: f32) -> Vec<usize>;

    /// Human-readable name for display/debugging.
    fn name(&self) -> &'static str;
}

/// Build the search backing a trial. `range` is the widest query it will serve.
pub fn neighbor_search(strategy: NeighborStrategy, range: f32) -> Box<dyn NeighborSearch> {
    match strategy {
        NeighborStrategy::BruteForce => Box::new(BruteForceNeighborSearch),
        NeighborStrategy::SpatialHash => Box::new(SpatialHashNeighborSearch::new(range)),
    }
}

mod brute_force;
mod engine;
mod spatial_hashing;
pub mod utils;

pub use brute_force::BruteForceNeighborSearch;
pub use engine::{trial_rng, Trial, TrialResult, TrialStatus};
pub use spatial_hashing::SpatialHashNeighborSearch;
