use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of genes in a chromosome.
pub const GENE_COUNT: usize = 6;

pub const COHESION: usize = 0;
pub const SEPARATION: usize = 1;
pub const ALIGNMENT: usize = 2;
pub const GOAL_SEEK: usize = 3;
pub const WALL_AVOID: usize = 4;
pub const DIVERGENCE: usize = 5;

/// Steering weights, in the order
/// `[cohesion, separation, alignment, goal_seek, wall_avoid, divergence_bound]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chromosome([f32; GENE_COUNT]);

impl Default for Chromosome {
    /// The hand-tuned weights used before any evolution.
    fn default() -> Self {
        Self([1.0, 0.25, 0.125, 1.0 / 128.0, 1.0, 1.1])
    }
}

impl Chromosome {
    pub fn new(genes: [f32; GENE_COUNT]) -> Self {
        Self(genes)
    }

    /// Every gene uniform in `[-1, 1]`, shifted by `offset` when given.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, offset: Option<&[f32; GENE_COUNT]>) -> Self {
        let mut genes = [0.0f32; GENE_COUNT];
        for (i, gene) in genes.iter_mut().enumerate() {
            *gene = rng.random_range(-1.0..=1.0) + offset.map_or(0.0, |o| o[i]);
        }
        Self(genes)
    }

    pub fn genes(&self) -> &[f32; GENE_COUNT] {
        &self.0
    }

    pub fn cohesion(&self) -> f32 {
        self.0[COHESION]
    }

    pub fn separation(&self) -> f32 {
        self.0[SEPARATION]
    }

    pub fn alignment(&self) -> f32 {
        self.0[ALIGNMENT]
    }

    pub fn goal_seek(&self) -> f32 {
        self.0[GOAL_SEEK]
    }

    pub fn wall_avoid(&self) -> f32 {
        self.0[WALL_AVOID]
    }

    pub fn divergence_bound(&self) -> f32 {
        self.0[DIVERGENCE]
    }

    /// Per-agent divergence factor: `1 + U(-b, b)` with `b = |divergence_bound|`.
    pub fn sample_divergence<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let bound = self.divergence_bound().abs();
        if bound == 0.0 || !bound.is_finite() {
            return 1.0;
        }
        1.0 + rng.random_range(-bound..=bound)
    }

    /// Replace each gene with probability `1 / rate` by a fresh value in `[-bound, bound]`.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: u32, bound: f32) {
        debug_assert!(rate > 0, "mutation rate denominator must be positive");
        for gene in &mut self.0 {
            if rng.random_range(1..=rate) == rate {
                *gene = rng.random_range(-bound..=bound);
            }
        }
    }
}

impl Index<usize> for Chromosome {
    type Output = f32;

    fn index(&self, gene: usize) -> &f32 {
        assert!(gene < GENE_COUNT, "gene index {gene} out of range 0..{GENE_COUNT}");
        &self.0[gene]
    }
}

impl IndexMut<usize> for Chromosome {
    fn index_mut(&mut self, gene: usize) -> &mut f32 {
        assert!(gene < GENE_COUNT, "gene index {gene} out of range 0..{GENE_COUNT}");
        &mut self.0[gene]
    }
}

impl From<[f32; GENE_COUNT]> for Chromosome {
    fn from(genes: [f32; GENE_COUNT]) -> Self {
        Self(genes)
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.0;
        write!(f, "[{}, {}, {}, {}, {}, {}]", g[0], g[1], g[2], g[3], g[4], g[5])
    }
}
