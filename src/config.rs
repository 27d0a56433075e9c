use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vector::Vector;

/// Which neighbor search backs the per-tick scan.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    #[default]
    BruteForce,
    SpatialHash,
}

/// Errors raised while validating a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("playfield must have positive finite width and height (got {width}x{height})")]
    InvalidPlayfield { width: f32, height: f32 },
    #[error("top margin {0} leaves no room inside the playfield")]
    InvalidTopMargin(f32),
    #[error("agent radius must be positive and finite (got {0})")]
    InvalidRadius(f32),
    #[error("initial population must be positive")]
    EmptyPopulation,
    #[error("goal count must be positive")]
    NoGoals,
    #[error("tick duration must be positive and finite (got {0})")]
    InvalidTick(f32),
    #[error("time budget must be positive and finite (got {0})")]
    InvalidTimeBudget(f32),
    #[error("max velocity must be positive and finite (got {0})")]
    InvalidMaxVelocity(f32),
    #[error("preferred flock size {pref} must be positive and below max flock size {max}")]
    InvalidFlockSizes { pref: u32, max: u32 },
    #[error("optimizer population must be at least 2 (got {0})")]
    PopulationTooSmall(usize),
    #[error("generation count must be positive")]
    NoGenerations,
    #[error("mutation rate denominator must be positive")]
    InvalidMutationRate,
    #[error("mutation bound must be positive and finite (got {0})")]
    InvalidMutationBound(f32),
    #[error("crossover selector {0} is outside 0..=6")]
    InvalidCrossover(u8),
    #[error("seed genome weight {0} is not finite")]
    InvalidSeedGenome(usize),
}

/// Parameters of a single trial: playfield, agents, rewards, and cost weights.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Playfield width in world units.
    pub width: f32,
    /// Playfield height in world units, including the top margin.
    pub height: f32,
    /// Strip at the top of the playfield reserved for status display.
    pub top_margin: f32,
    /// Agent radius; drives collision, separation, and flock ranges.
    pub radius: f32,
    /// Agents spawned at the start of each trial.
    pub population: usize,
    /// Goal slots kept alive during a trial.
    pub goal_count: usize,
    /// Distance from the walls inside which goals never spawn.
    pub goal_margin: f32,
    /// Simulated seconds per tick.
    pub tick_seconds: f32,
    /// Simulated seconds after which a trial stops.
    pub time_budget: f32,
    /// Per-component velocity bound.
    pub max_velocity: f32,
    /// Per-component bound on the blind exploration vector.
    pub max_force: f32,
    /// Flock size up to which goal rewards grow with the flock.
    pub pref_flock_size: u32,
    /// Flocks at or above this size receive no goal reward.
    pub max_flock_size: u32,
    /// Points per rewarded flock member slot.
    pub unit_reward: u32,
    /// Fitness weight on score (k1).
    pub score_weight: f32,
    /// Fitness weight on seconds survived (k2).
    pub live_time_weight: f32,
    /// Per-tick cost scale for heading deviation from the flock heading.
    pub flock_heading_cost: f32,
    /// Per-tick cost scale for heading deviation from the goal bearing.
    pub goal_heading_cost: f32,
    /// Per-tick cost when no goal is visible.
    pub blind_goal_cost: f32,
    /// Cost per neighbor inside separation range, charged during separation.
    pub crowding_cost: f32,
    /// Subtract cost from agents that survive to the end of the trial.
    pub charge_survivor_cost: bool,
    pub neighbor_search: NeighborStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 980.0,
            height: 620.0,
            top_margin: 12.0,
            radius: 3.0,
            population: 32,
            goal_count: 5,
            goal_margin: 15.0,
            tick_seconds: 1.0 / 30.0,
            time_budget: 60.0,
            max_velocity: 3.5,
            max_force: 2.0,
            pref_flock_size: 8,
            max_flock_size: 16,
            unit_reward: 1,
            score_weight: 10.0,
            live_time_weight: 1.0,
            flock_heading_cost: 1.0,
            goal_heading_cost: 1.0,
            blind_goal_cost: 2.0,
            crowding_cost: 1.0,
            charge_survivor_cost: false,
            neighbor_search: NeighborStrategy::BruteForce,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.width) || !positive(self.height) {
            return Err(ConfigError::InvalidPlayfield {
                width: self.width,
                height: self.height,
            });
        }
        if !self.top_margin.is_finite() || self.top_margin < 0.0 || self.top_margin >= self.height {
            return Err(ConfigError::InvalidTopMargin(self.top_margin));
        }
        if !positive(self.radius) {
            return Err(ConfigError::InvalidRadius(self.radius));
        }
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.goal_count == 0 {
            return Err(ConfigError::NoGoals);
        }
        if !positive(self.tick_seconds) {
            return Err(ConfigError::InvalidTick(self.tick_seconds));
        }
        if !positive(self.time_budget) {
            return Err(ConfigError::InvalidTimeBudget(self.time_budget));
        }
        if !positive(self.max_velocity) {
            return Err(ConfigError::InvalidMaxVelocity(self.max_velocity));
        }
        if self.pref_flock_size == 0 || self.pref_flock_size >= self.max_flock_size {
            return Err(ConfigError::InvalidFlockSizes {
                pref: self.pref_flock_size,
                max: self.max_flock_size,
            });
        }
        Ok(())
    }

    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            w: self.width,
            h: self.height,
            top: self.top_margin,
        }
    }
}

/// Parameters of the generational optimizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Base seed; every trial derives its own stream from it.
    pub seed: u64,
    pub generations: u32,
    /// Chromosomes evaluated per generation.
    pub population: usize,
    /// Each gene mutates with probability `1 / mutation_rate`.
    pub mutation_rate: u32,
    /// Mutated genes are drawn uniformly from `[-mutation_bound, mutation_bound]`.
    pub mutation_bound: f32,
    /// Crossover operator selector, see `evolve::Crossover`.
    pub crossover: u8,
    /// Optional offsets added to every gene of the initial random population.
    pub seed_genome: Option<[f32; 6]>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            generations: 24,
            population: 12,
            mutation_rate: 6,
            mutation_bound: 1.0,
            crossover: 0,
            seed_genome: None,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population < 2 {
            return Err(ConfigError::PopulationTooSmall(self.population));
        }
        if self.generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.mutation_rate == 0 {
            return Err(ConfigError::InvalidMutationRate);
        }
        if !self.mutation_bound.is_finite() || self.mutation_bound <= 0.0 {
            return Err(ConfigError::InvalidMutationBound(self.mutation_bound));
        }
        if self.crossover > 6 {
            return Err(ConfigError::InvalidCrossover(self.crossover));
        }
        if let Some(genes) = &self.seed_genome {
            if let Some(index) = genes.iter().position(|g| !g.is_finite()) {
                return Err(ConfigError::InvalidSeedGenome(index));
            }
        }
        Ok(())
    }
}

/// Full run configuration as loaded from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sim: SimConfig,
    pub evolution: EvolutionConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.evolution.validate()
    }
}

/// Playfield rectangle. Agents live in `[0, w] x [top, h]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub w: f32,
    pub h: f32,
    pub top: f32,
}

impl WorldBounds {
    /// Clamp a point so a body of `radius` stays inside the playfield.
    pub fn clamp(&self, pos: Vector, radius: f32) -> Vector {
        let max_x = (self.w - radius).max(radius);
        let min_y = self.top + radius;
        let max_y = (self.h - radius).max(min_y);
        Vector::new(pos.x.clamp(radius, max_x), pos.y.clamp(min_y, max_y))
    }

    pub fn contains(&self, pos: Vector) -> bool {
        pos.x >= 0.0 && pos.x <= self.w && pos.y >= self.top && pos.y <= self.h
    }
}
