use crate::boid::Boid;
use super::NeighborSearch;

/// Every other agent is a candidate, whatever the range.
pub struct BruteForceNeighborSearch;

impl NeighborSearch for BruteForceNeighborSearch {
    fn rebuild(&mut self, _boids: &[Boid]) {
        // Nothing to rebuild for brute force.
    }

    fn candidates(&self, boids: &[Boid], index: usize, _range: f32) -> Vec<usize> {
        (0..boids.len()).filter(|&j| j != index).collect()
    }

    fn name(&self) -> &'static str {
        "BruteForce"
    }
}
