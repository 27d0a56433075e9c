use serde::{Deserialize, Serialize};

use crate::vector::{Compass, Vector};

/// Half-width of the rear blind cone, centred on the direction opposite the heading.
pub const BLIND_HALF_ARC: f32 = 45.0;

/// Stable agent identifier, never reused within a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoidId(pub u32);

/// A steering agent.
#[derive(Clone, Debug)]
pub struct Boid {
    pub id: BoidId,
    pub pos: Vector,
    pub vel: Vector,
    radius: f32,
    /// Multiplier applied to the weighted steering sum.
    pub divergence: f32,
    /// Facing in degrees, derived from velocity after each move.
    pub heading: f32,
    pub visible_neighbors: Vec<BoidId>,
    /// Visible neighbors inside flock range, with squared distance.
    pub connected_neighbors: Vec<(BoidId, f32)>,
    pub collided: bool,
    /// Goal slot currently targeted.
    pub nearest_goal: Option<usize>,
    /// Bearing to the nearest goal when it is visible.
    pub goal_bearing: Option<f32>,
    pub score: u32,
    pub cost: f32,
    pub live_time: f32,
    pub touched_goal: bool,
    /// Inside collision range of the targeted goal as of the last scan.
    pub in_goal_range: bool,
}

impl Boid {
    pub fn new(id: BoidId, pos: Vector, radius: f32) -> Self {
        debug_assert!(radius > 0.0, "radius must be positive");
        Self {
            id,
            pos,
            vel: Vector::ZERO,
            radius,
            divergence: 1.0,
            heading: 0.0,
            visible_neighbors: Vec::new(),
            connected_neighbors: Vec::new(),
            collided: false,
            nearest_goal: None,
            goal_bearing: None,
            score: 0,
            cost: 0.0,
            live_time: 0.0,
            touched_goal: false,
            in_goal_range: false,
        }
    }

    pub fn with_divergence(mut self, divergence: f32) -> Self {
        self.divergence = divergence;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn collision_range(&self) -> f32 {
        2.5 * self.radius
    }

    pub fn separation_range(&self) -> f32 {
        5.0 * self.radius
    }

    pub fn flock_range(&self) -> f32 {
        20.0 * self.separation_range()
    }

    /// Bearing of `target` as seen from this agent, in the heading convention.
    pub fn bearing_to(&self, target: Vector) -> f32 {
        (target - self.pos).heading()
    }

    /// False only for bearings inside the rear 90° blind cone.
    pub fn can_see(&self, bearing: f32) -> bool {
        let relative = (bearing - self.heading).rem_euclid(360.0);
        !(180.0 - BLIND_HALF_ARC..=180.0 + BLIND_HALF_ARC).contains(&relative)
    }

    pub fn is_visible(&self, target: Vector) -> bool {
        self.can_see(self.bearing_to(target))
    }

    pub fn distance_squared(&self, target: Vector) -> f32 {
        (target - self.pos).length_squared()
    }

    /// Recompute heading from velocity. A stalled agent keeps its facing.
    pub fn refresh_heading(&mut self) {
        if self.vel != Vector::ZERO {
            self.heading = self.vel.heading();
        }
    }

    pub fn snapshot(&self) -> BoidSnapshot {
        BoidSnapshot {
            id: self.id,
            pos: self.pos,
            vel: self.vel,
            heading: self.heading,
            score: self.score,
            cost: self.cost,
        }
    }
}

/// Read-only per-tick view of an agent for renderers and monitors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoidSnapshot {
    pub id: BoidId,
    pub pos: Vector,
    pub vel: Vector,
    pub heading: f32,
    pub score: u32,
    pub cost: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ranges_follow_radius() {
        let b = Boid::new(BoidId(0), Vector::ZERO, 4.0);
        assert_eq!(b.collision_range(), 10.0);
        assert_eq!(b.separation_range(), 20.0);
        assert_eq!(b.flock_range(), 400.0);
    }

    #[test]
    fn blind_cone_is_behind_heading() {
        // Facing up (heading 0): things below are hidden.
        let b = Boid::new(BoidId(0), Vector::new(100.0, 100.0), 3.0);
        assert!(b.is_visible(Vector::new(100.0, 50.0)));
        assert!(b.is_visible(Vector::new(150.0, 100.0)));
        assert!(b.is_visible(Vector::new(50.0, 100.0)));
        assert!(!b.is_visible(Vector::new(100.0, 150.0)));
        assert!(!b.is_visible(Vector::new(110.0, 150.0)));
    }

    #[test]
    fn blind_cone_wraps_around_zero() {
        // Facing down (heading 180): the blind cone spans 315..=45.
        let mut b = Boid::new(BoidId(0), Vector::new(100.0, 100.0), 3.0);
        b.heading = 180.0;
        assert!(!b.can_see(0.0));
        assert!(!b.can_see(350.0));
        assert!(!b.can_see(30.0));
        assert!(b.can_see(180.0));
        assert!(b.can_see(90.0));
    }

    #[test]
    fn stalled_agent_keeps_heading() {
        let mut b = Boid::new(BoidId(0), Vector::ZERO, 3.0);
        b.vel = Vector::new(1.0, 0.0);
        b.refresh_heading();
        let facing = b.heading;
        assert!((facing - 270.0).abs() < 1e-3);
        b.vel = Vector::ZERO;
        b.refresh_heading();
        assert_eq!(b.heading, facing);
    }
}
