use std::collections::{BTreeSet, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::boid::{Boid, BoidId, BoidSnapshot};
use crate::config::{ConfigError, SimConfig, WorldBounds};
use crate::evolve::Chromosome;
use crate::fitness::{accrue_cost, FitnessLedger};
use crate::flock::{Flock, Flocks};
use crate::goal::Goal;
use crate::rules::{self, SteeringParts};
use crate::sim::utils::{assign_goal, keep_within_bounds, limit_velocity, scan_neighbors};
use crate::vector::Vector;
use super::{neighbor_search, NeighborSearch};

// Spreads species ids and generations across the seed space.
const TRIAL_SEED_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Independent, reproducible stream for one trial of one generation.
pub fn trial_rng(seed: u64, generation: u32, species_id: usize) -> StdRng {
    let stream = (u64::from(generation) << 32) | species_id as u64;
    StdRng::seed_from_u64(seed ^ stream.wrapping_mul(TRIAL_SEED_PRIME))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Running,
    Extinct,
    OutOfTime,
}

/// Outcome of one trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub fitness: f32,
    /// Playtime when the trial ended.
    pub live_time: f32,
    pub survivors: usize,
    pub deaths: usize,
    pub ticks: u64,
}

/// One simulation run of a population under a single chromosome.
pub struct Trial {
    config: SimConfig,
    genome: Chromosome,
    bounds: WorldBounds,
    boids: Vec<Boid>,
    goals: Vec<Goal>,
    search: Box<dyn NeighborSearch>,
    rng: StdRng,
    flocks: Flocks,
    ledger: FitnessLedger,
    playtime: f32,
    ticks: u64,
    status: TrialStatus,
}

impl Trial {
    /// Spawn `config.population` agents and `config.goal_count` goals at random.
    pub fn new(config: SimConfig, genome: Chromosome, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = config.bounds();
        let r = config.radius;

        let boids = (0..config.population as u32)
            .map(|id| {
                let x = rng.random_range(r..=(bounds.w - r).max(r));
                let y = rng.random_range((bounds.top + r)..=(bounds.h - r).max(bounds.top + r));
                Boid::new(BoidId(id), Vector::new(x, y), r)
                    .with_divergence(genome.sample_divergence(&mut rng))
            })
            .collect();
        let goals = (0..config.goal_count)
            .map(|id| Goal::random(id, &bounds, config.goal_margin, &mut rng))
            .collect();

        Ok(Self::assemble(config, genome, boids, goals, rng))
    }

    /// Start from hand-placed agents and goals instead of random ones.
    pub fn with_population(
        config: SimConfig,
        genome: Chromosome,
        boids: Vec<Boid>,
        goals: Vec<Goal>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, genome, boids, goals, rng))
    }

    fn assemble(config: SimConfig, genome: Chromosome, boids: Vec<Boid>, goals: Vec<Goal>, rng: StdRng) -> Self {
        let range = boids
            .iter()
            .map(Boid::flock_range)
            .fold(config.radius * 100.0, f32::max);
        let mut trial = Self {
            bounds: config.bounds(),
            search: neighbor_search(config.neighbor_search, range),
            config,
            genome,
            flocks: Flocks::form(&boids),
            boids,
            goals,
            rng,
            ledger: FitnessLedger::new(),
            playtime: 0.0,
            ticks: 0,
            status: TrialStatus::Running,
        };
        if trial.boids.is_empty() {
            trial.status = TrialStatus::Extinct;
        }
        trial
    }

    pub fn algo_name(&self) -> &'static str {
        self.search.name()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn genome(&self) -> &Chromosome {
        &self.genome
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn flocks(&self) -> &[Flock] {
        self.flocks.as_slice()
    }

    pub fn snapshots(&self) -> Vec<BoidSnapshot> {
        self.boids.iter().map(Boid::snapshot).collect()
    }

    pub fn playtime(&self) -> f32 {
        self.playtime
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn deaths(&self) -> usize {
        self.ledger.deaths()
    }

    pub fn status(&self) -> TrialStatus {
        self.status
    }

    /// Fitness banked so far from agents that have died.
    pub fn banked_fitness(&self) -> f32 {
        self.ledger.fitness()
    }

    /// Advance the world by one tick.
    pub fn step(&mut self) -> TrialStatus {
        if self.status != TrialStatus::Running {
            return self.status;
        }

        self.playtime += self.config.tick_seconds;
        self.ticks += 1;
        for boid in &mut self.boids {
            boid.live_time = self.playtime;
        }

        self.sense();
        self.remove_collided();
        self.flocks = Flocks::form(&self.boids);
        self.reward_goal_touches();
        let crowding = self.steer();
        self.flocks.refresh(&self.boids);
        for (i, boid) in self.boids.iter_mut().enumerate() {
            accrue_cost(boid, self.flocks.flock_of(i), crowding[i], &self.config);
        }

        self.status = if self.boids.is_empty() {
            TrialStatus::Extinct
        } else if self.playtime >= self.config.time_budget {
            TrialStatus::OutOfTime
        } else {
            TrialStatus::Running
        };
        self.status
    }

    /// Run to extinction or the time budget and settle the fitness.
    pub fn run(mut self) -> TrialResult {
        while self.step() == TrialStatus::Running {}
        let result = self.result();
        debug!(
            genome = %self.genome,
            fitness = result.fitness,
            survivors = result.survivors,
            deaths = result.deaths,
            ticks = result.ticks,
            "trial finished"
        );
        result
    }

    /// Fitness as if the trial ended now, with current agents settled as survivors.
    pub fn result(&self) -> TrialResult {
        let mut ledger = self.ledger.clone();
        ledger.settle_survivors(&self.boids, &self.config);
        TrialResult {
            fitness: ledger.fitness(),
            live_time: self.playtime,
            survivors: self.boids.len(),
            deaths: ledger.deaths(),
            ticks: self.ticks,
        }
    }

    // Neighbor scan and goal assignment, both read from the frozen pre-move state.
    fn sense(&mut self) {
        self.search.rebuild(&self.boids);
        let boids = &self.boids;
        let goals = &self.goals;
        let search = self.search.as_ref();
        let sensed: Vec<_> = (0..boids.len())
            .into_par_iter()
            .map(|i| (scan_neighbors(boids, search, i), assign_goal(&boids[i], goals)))
            .collect();

        let collided: HashSet<BoidId> = boids
            .iter()
            .zip(&sensed)
            .filter(|(_, (scan, _))| scan.collided)
            .map(|(b, _)| b.id)
            .collect();

        for (boid, (mut scan, choice)) in self.boids.iter_mut().zip(sensed) {
            scan.connected.retain(|(id, _)| !collided.contains(id));
            boid.visible_neighbors = scan.visible;
            boid.connected_neighbors = scan.connected;
            boid.collided = scan.collided;
            boid.nearest_goal = choice.goal;
            boid.goal_bearing = choice.bearing;
            boid.in_goal_range = choice.in_range;
            boid.touched_goal = choice.touched;
        }
    }

    fn remove_collided(&mut self) {
        if !self.boids.iter().any(|b| b.collided) {
            return;
        }
        let (dead, alive): (Vec<Boid>, Vec<Boid>) =
            std::mem::take(&mut self.boids).into_iter().partition(|b| b.collided);
        for boid in &dead {
            trace!(
                id = boid.id.0,
                live_time = boid.live_time,
                score = boid.score,
                cost = boid.cost,
                "agent collided"
            );
            self.ledger.record_death(boid, &self.config);
        }
        self.boids = alive;
    }

    fn reward_goal_touches(&mut self) {
        let mut touched_slots = BTreeSet::new();
        for i in 0..self.boids.len() {
            if !self.boids[i].touched_goal {
                continue;
            }
            self.flocks.award_goal_touch(
                &mut self.boids,
                i,
                self.config.pref_flock_size,
                self.config.max_flock_size,
                self.config.unit_reward,
            );
            if let Some(slot) = self.boids[i].nearest_goal {
                touched_slots.insert(slot);
            }
        }
        for slot in touched_slots {
            if let Some(goal) = self.goals.get_mut(slot) {
                goal.respawn(&self.bounds, self.config.goal_margin, &mut self.rng);
            }
        }
    }

    // Compute every delta from the same state, then integrate. Returns the
    // crowding count per agent for the cost step.
    fn steer(&mut self) -> Vec<usize> {
        let n = self.boids.len();
        // One seed per agent keeps parallel exploration draws reproducible.
        let seeds: Vec<u64> = (0..n).map(|_| self.rng.random()).collect();
        let index_of: HashMap<BoidId, usize> =
            self.boids.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

        let boids = &self.boids;
        let goals = &self.goals;
        let flocks = &self.flocks;
        let genome = &self.genome;
        let bounds = &self.bounds;
        let max_force = self.config.max_force;

        let steering: Vec<(Vector, usize)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let me = &boids[i];
                let mut rng = StdRng::seed_from_u64(seeds[i]);
                let lookup = |id: &BoidId| index_of.get(id).map(|&j| &boids[j]);
                let flockmates = flocks.mates_of(i).iter().map(|&j| &boids[j]);
                let visible = me.visible_neighbors.iter().filter_map(lookup);
                let connected = me.connected_neighbors.iter().filter_map(|(id, _)| lookup(id));

                let parts = SteeringParts {
                    cohesion: rules::cohesion(me, flockmates),
                    separation: rules::separation(me, visible.clone()),
                    alignment: rules::alignment(me, connected),
                    goal: rules::goal_seek(me, me.nearest_goal.and_then(|g| goals.get(g)), max_force, &mut rng),
                    walls: rules::avoid_walls(me, bounds),
                };
                (parts.combine(genome, me.divergence), rules::crowding(me, visible))
            })
            .collect();

        let max_velocity = self.config.max_velocity;
        let mut crowding = Vec::with_capacity(n);
        for (boid, (delta, crowded)) in self.boids.iter_mut().zip(steering) {
            limit_velocity(boid, delta, max_velocity);
            keep_within_bounds(boid, &self.bounds);
            crowding.push(crowded);
        }
        crowding
    }
}
