use crate::boid::{Boid, BoidId};
use crate::config::WorldBounds;
use crate::goal::Goal;
use crate::vector::{Compass, Vector};

use super::NeighborSearch;

/// What one agent learned about the others during a tick's scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborScan {
    pub visible: Vec<BoidId>,
    /// Visible agents inside flock range, with squared distance.
    pub connected: Vec<(BoidId, f32)>,
    pub collided: bool,
}

/// Classify every candidate around `index`.
///
/// Collision ignores visibility: anything at or inside collision range counts,
/// including agents in the blind cone.
pub fn scan_neighbors(boids: &[Boid], search: &dyn NeighborSearch, index: usize) -> NeighborScan {
    let me = &boids[index];
    let flock_r2 = me.flock_range() * me.flock_range();
    let collision_r2 = me.collision_range() * me.collision_range();

    let mut scan = NeighborScan::default();
    for j in search.candidates(boids, index, me.flock_range()) {
        let other = &boids[j];
        let dist2 = me.distance_squared(other.pos);
        if dist2 <= collision_r2 {
            scan.collided = true;
        }
        if me.is_visible(other.pos) {
            scan.visible.push(other.id);
            if dist2 < flock_r2 {
                scan.connected.push((other.id, dist2));
            }
        }
    }
    scan
}

/// Goal choice for one agent on one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoalChoice {
    pub goal: Option<usize>,
    /// Bearing to the chosen goal, present only when it is visible.
    pub bearing: Option<f32>,
    pub in_range: bool,
    /// Rising edge of `in_range`.
    pub touched: bool,
}

/// Pick the nearest visible goal.
///
/// With none in view the previous target is kept; an agent that never had one
/// falls back to the nearest goal overall so it always has a slot to steer by.
pub fn assign_goal(boid: &Boid, goals: &[Goal]) -> GoalChoice {
    let nearest = |visible_only: bool| {
        let mut best: Option<(usize, f32)> = None;
        for (slot, goal) in goals.iter().enumerate() {
            if visible_only && !boid.is_visible(goal.pos) {
                continue;
            }
            let d2 = boid.distance_squared(goal.pos);
            if best.map_or(true, |(_, b)| d2 < b) {
                best = Some((slot, d2));
            }
        }
        best.map(|(slot, _)| slot)
    };

    let goal = nearest(true)
        .or(boid.nearest_goal.filter(|&slot| slot < goals.len()))
        .or_else(|| nearest(false));

    let Some(slot) = goal else {
        return GoalChoice::default();
    };

    let target = goals[slot].pos;
    let range = boid.collision_range();
    let in_range = boid.distance_squared(target) < range * range;
    let bearing = boid.bearing_to(target);
    GoalChoice {
        goal: Some(slot),
        bearing: boid.can_see(bearing).then_some(bearing),
        in_range,
        touched: in_range && !boid.in_goal_range,
    }
}

/// Add the steering delta and clamp each velocity component to `±max_velocity`.
pub fn limit_velocity(boid: &mut Boid, delta: Vector, max_velocity: f32) {
    boid.vel = (boid.vel + delta).clamp_components(max_velocity);
    boid.refresh_heading();
}

/// Move by one tick's velocity and keep the body inside the playfield.
pub fn keep_within_bounds(boid: &mut Boid, bounds: &WorldBounds) {
    let radius = boid.radius();
    boid.pos = bounds.clamp(boid.pos + boid.vel, radius);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BruteForceNeighborSearch;

    fn boid(id: u32, x: f32, y: f32) -> Boid {
        Boid::new(BoidId(id), Vector::new(x, y), 4.0)
    }

    #[test]
    fn collision_ignores_blind_cone() {
        // Heading 0 faces up; the other agent sits directly behind at exactly collision range.
        let boids = vec![boid(0, 100.0, 100.0), boid(1, 100.0, 110.0)];
        let scan = scan_neighbors(&boids, &BruteForceNeighborSearch, 0);
        assert!(scan.collided);
        assert!(scan.visible.is_empty());
        assert!(scan.connected.is_empty());
    }

    #[test]
    fn connected_requires_visibility_and_range() {
        let boids = vec![
            boid(0, 500.0, 500.0),
            boid(1, 500.0, 300.0),
            boid(2, 500.0, 50.0),
            boid(3, 500.0, 560.0),
        ];
        let scan = scan_neighbors(&boids, &BruteForceNeighborSearch, 0);
        assert!(!scan.collided);
        assert_eq!(scan.visible, vec![BoidId(1), BoidId(2)]);
        assert_eq!(scan.connected, vec![(BoidId(1), 40000.0)]);
    }

    #[test]
    fn nearest_visible_goal_wins_over_a_closer_hidden_one() {
        let me = boid(0, 100.0, 100.0);
        let goals = vec![
            Goal::new(0, Vector::new(100.0, 120.0)),
            Goal::new(1, Vector::new(100.0, 40.0)),
            Goal::new(2, Vector::new(100.0, 20.0)),
        ];
        let choice = assign_goal(&me, &goals);
        assert_eq!(choice.goal, Some(1));
        assert!(choice.bearing.is_some());
        assert!(!choice.touched);
    }

    #[test]
    fn hidden_goals_keep_previous_target() {
        let mut me = boid(0, 100.0, 100.0);
        let goals = vec![
            Goal::new(0, Vector::new(100.0, 130.0)),
            Goal::new(1, Vector::new(100.0, 160.0)),
        ];
        assert_eq!(assign_goal(&me, &goals).goal, Some(0));
        me.nearest_goal = Some(1);
        let choice = assign_goal(&me, &goals);
        assert_eq!(choice.goal, Some(1));
        assert_eq!(choice.bearing, None);
    }

    #[test]
    fn touch_is_edge_triggered() {
        let mut me = boid(0, 100.0, 100.0);
        let goals = vec![Goal::new(0, Vector::new(100.0, 95.0))];
        let first = assign_goal(&me, &goals);
        assert!(first.in_range && first.touched);
        me.in_goal_range = first.in_range;
        let second = assign_goal(&me, &goals);
        assert!(second.in_range && !second.touched);
    }

    #[test]
    fn integration_clamps_velocity_and_position() {
        let bounds = WorldBounds { w: 100.0, h: 100.0, top: 10.0 };
        let mut me = boid(0, 98.0, 12.0);
        limit_velocity(&mut me, Vector::new(50.0, -50.0), 3.5);
        assert_eq!(me.vel, Vector::new(3.5, -3.5));
        keep_within_bounds(&mut me, &bounds);
        assert_eq!(me.pos, Vector::new(96.0, 14.0));
    }
}
