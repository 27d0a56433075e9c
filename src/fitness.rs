//! Per-tick cost accrual and the running fitness of a trial.

use serde::{Deserialize, Serialize};

use crate::boid::Boid;
use crate::config::SimConfig;
use crate::flock::Flock;
use crate::vector::angle_between;

/// Cost charged to `boid` for one tick. Never negative.
///
/// Straying from the flock heading and from the goal bearing are each
/// normalised to `[0, 1]` before weighting; an agent with no visible goal pays
/// the flat blind penalty instead. Every agent crowding inside separation
/// range adds `crowding_cost`.
pub fn tick_cost(boid: &Boid, flock: &Flock, crowded: usize, config: &SimConfig) -> f32 {
    let flock_term = config.flock_heading_cost * angle_between(boid.heading, flock.heading) / 180.0;
    let goal_term = match boid.goal_bearing {
        Some(bearing) => config.goal_heading_cost * angle_between(boid.heading, bearing) / 180.0,
        None => config.blind_goal_cost,
    };
    let crowd_term = config.crowding_cost * crowded as f32;
    (flock_term + goal_term + crowd_term).max(0.0)
}

/// Adds this tick's cost to the agent's running total.
pub fn accrue_cost(boid: &mut Boid, flock: &Flock, crowded: usize, config: &SimConfig) {
    boid.cost += tick_cost(boid, flock, crowded, config);
}

/// `score * k1 + live_time * k2`, the reward half of an agent's fitness.
pub fn reward(boid: &Boid, config: &SimConfig) -> f32 {
    boid.score as f32 * config.score_weight + boid.live_time * config.live_time_weight
}

/// Running fitness for one trial.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessLedger {
    fitness: f32,
    deaths: usize,
}

impl FitnessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle an agent removed by collision: its cost is always charged.
    pub fn record_death(&mut self, boid: &Boid, config: &SimConfig) {
        self.fitness += reward(boid, config) - boid.cost;
        self.deaths += 1;
    }

    /// Settle the agents alive at trial end. Cost is charged only when
    /// `charge_survivor_cost` is set.
    pub fn settle_survivors<'a>(&mut self, survivors: impl IntoIterator<Item = &'a Boid>, config: &SimConfig) {
        for boid in survivors {
            self.fitness += reward(boid, config);
            if config.charge_survivor_cost {
                self.fitness -= boid.cost;
            }
        }
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn deaths(&self) -> usize {
        self.deaths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boid::BoidId;
    use crate::vector::Vector;

    fn flock_heading(heading: f32) -> Flock {
        Flock {
            members: vec![BoidId(0)],
            centroid: Vector::ZERO,
            velocity: Vector::ZERO,
            heading,
            goal_direction: None,
            score: 0,
        }
    }

    fn boid_with(heading: f32, goal_bearing: Option<f32>) -> Boid {
        let mut b = Boid::new(BoidId(0), Vector::new(10.0, 10.0), 3.0);
        b.heading = heading;
        b.goal_bearing = goal_bearing;
        b
    }

    #[test]
    fn aligned_agent_with_goal_ahead_pays_nothing() {
        let cfg = SimConfig::default();
        let b = boid_with(90.0, Some(90.0));
        assert_eq!(tick_cost(&b, &flock_heading(90.0), 0, &cfg), 0.0);
    }

    #[test]
    fn deviation_is_normalised() {
        let cfg = SimConfig::default();
        let b = boid_with(0.0, Some(90.0));
        let cost = tick_cost(&b, &flock_heading(180.0), 0, &cfg);
        assert!((cost - 1.5).abs() < 1e-5);
    }

    #[test]
    fn blind_agent_pays_flat_penalty_and_crowding() {
        let cfg = SimConfig::default();
        let mut b = boid_with(0.0, None);
        accrue_cost(&mut b, &flock_heading(0.0), 2, &cfg);
        assert!((b.cost - (cfg.blind_goal_cost + 2.0 * cfg.crowding_cost)).abs() < 1e-5);
        let before = b.cost;
        accrue_cost(&mut b, &flock_heading(0.0), 0, &cfg);
        assert!(b.cost >= before);
    }

    #[test]
    fn death_charges_cost_but_survivors_do_not_by_default() {
        let mut cfg = SimConfig::default();
        let mut b = boid_with(0.0, None);
        b.score = 2;
        b.live_time = 3.0;
        b.cost = 5.0;

        let mut ledger = FitnessLedger::new();
        ledger.record_death(&b, &cfg);
        assert_eq!(ledger.deaths(), 1);
        assert!((ledger.fitness() - (20.0 + 3.0 - 5.0)).abs() < 1e-5);

        let mut ledger = FitnessLedger::new();
        ledger.settle_survivors([&b], &cfg);
        assert!((ledger.fitness() - 23.0).abs() < 1e-5);

        cfg.charge_survivor_cost = true;
        let mut ledger = FitnessLedger::new();
        ledger.settle_survivors([&b], &cfg);
        assert!((ledger.fitness() - 18.0).abs() < 1e-5);
        assert_eq!(ledger.deaths(), 0);
    }
}
