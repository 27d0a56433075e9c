//! Steering rules. Each rule maps an agent and its surroundings to a velocity
//! delta; the caller weights them by the chromosome and sums.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::boid::Boid;
use crate::config::WorldBounds;
use crate::evolve::Chromosome;
use crate::goal::Goal;
use crate::vector::{Compass, Vector};

/// Unweighted output of every rule for one agent on one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringParts {
    pub cohesion: Vector,
    pub separation: Vector,
    pub alignment: Vector,
    pub goal: Vector,
    pub walls: Vector,
}

impl SteeringParts {
    /// Weighted sum of the rules, scaled by the agent's divergence.
    pub fn combine(&self, genome: &Chromosome, divergence: f32) -> Vector {
        let sum = self.cohesion * genome.cohesion()
            + self.separation * genome.separation()
            + self.alignment * genome.alignment()
            + self.goal * genome.goal_seek()
            + self.walls * genome.wall_avoid();
        sum * divergence
    }
}

fn mean_velocity<'a>(boid: &Boid, others: impl IntoIterator<Item = &'a Boid>) -> Option<Vector> {
    let mut sum = Vector::ZERO;
    let mut count = 0usize;
    for other in others {
        if other.id == boid.id {
            continue;
        }
        sum += other.vel;
        count += 1;
    }
    (count > 0).then(|| sum / count as f32)
}

/// Mean velocity of the other flock members minus our own.
pub fn cohesion<'a>(boid: &Boid, flockmates: impl IntoIterator<Item = &'a Boid>) -> Vector {
    mean_velocity(boid, flockmates)
        .map(|avg| avg - boid.vel)
        .unwrap_or(Vector::ZERO)
}

/// Sum of offsets pointing away from every neighbor inside separation range.
pub fn separation<'a>(boid: &Boid, neighbors: impl IntoIterator<Item = &'a Boid>) -> Vector {
    let range2 = boid.separation_range() * boid.separation_range();
    let mut avoid = Vector::ZERO;
    for other in neighbors {
        if other.id == boid.id {
            continue;
        }
        if boid.distance_squared(other.pos) < range2 {
            avoid -= other.pos - boid.pos;
        }
    }
    avoid
}

/// How many neighbors sit inside separation range.
pub fn crowding<'a>(boid: &Boid, neighbors: impl IntoIterator<Item = &'a Boid>) -> usize {
    let range2 = boid.separation_range() * boid.separation_range();
    neighbors
        .into_iter()
        .filter(|other| other.id != boid.id && boid.distance_squared(other.pos) < range2)
        .count()
}

/// Mean neighbor velocity minus our own.
pub fn alignment<'a>(boid: &Boid, neighbors: impl IntoIterator<Item = &'a Boid>) -> Vector {
    mean_velocity(boid, neighbors)
        .map(|avg| avg - boid.vel)
        .unwrap_or(Vector::ZERO)
}

/// Head for the goal when it is in view; otherwise wander.
pub fn goal_seek<R: Rng + ?Sized>(boid: &Boid, goal: Option<&Goal>, max_force: f32, rng: &mut R) -> Vector {
    match goal {
        Some(goal) if boid.is_visible(goal.pos) => goal.pos - boid.pos,
        _ => exploration(max_force, rng),
    }
}

/// Small random vector, each component bounded by `max_force`.
pub fn exploration<R: Rng + ?Sized>(max_force: f32, rng: &mut R) -> Vector {
    if max_force <= 0.0 {
        return Vector::ZERO;
    }
    let normal = match Normal::new(0.0f32, max_force / 3.0) {
        Ok(normal) => normal,
        Err(_) => return Vector::ZERO,
    };
    Vector::new(normal.sample(rng), normal.sample(rng)).clamp_components(max_force)
}

/// Push of `radius` away from any wall closer than two radii.
pub fn avoid_walls(boid: &Boid, bounds: &WorldBounds) -> Vector {
    let r = boid.radius();
    let mut push = Vector::ZERO;

    if boid.pos.x < r * 2.0 {
        push.x = r;
    } else if boid.pos.x >= bounds.w - r * 2.0 {
        push.x = -r;
    }

    if boid.pos.y < bounds.top + r * 2.0 {
        push.y = r;
    } else if boid.pos.y >= bounds.h - r * 2.0 {
        push.y = -r;
    }

    push
}
