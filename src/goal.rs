use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::WorldBounds;
use crate::vector::Vector;

/// A stationary point agents seek. Touched goals respawn in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: usize,
    pub pos: Vector,
}

impl Goal {
    pub fn new(id: usize, pos: Vector) -> Self {
        Self { id, pos }
    }

    pub fn random<R: Rng + ?Sized>(id: usize, bounds: &WorldBounds, margin: f32, rng: &mut R) -> Self {
        Self::new(id, random_goal_position(bounds, margin, rng))
    }

    /// Move to a fresh random position, keeping the slot id.
    pub fn respawn<R: Rng + ?Sized>(&mut self, bounds: &WorldBounds, margin: f32, rng: &mut R) {
        self.pos = random_goal_position(bounds, margin, rng);
    }
}

fn random_goal_position<R: Rng + ?Sized>(bounds: &WorldBounds, margin: f32, rng: &mut R) -> Vector {
    let (x_lo, x_hi) = span(margin, bounds.w - margin, bounds.w * 0.5);
    let (y_lo, y_hi) = span(bounds.top + margin, bounds.h - margin, (bounds.top + bounds.h) * 0.5);
    Vector::new(rng.random_range(x_lo..=x_hi), rng.random_range(y_lo..=y_hi))
}

// Collapse an empty range onto its midpoint so tiny playfields still spawn goals.
fn span(lo: f32, hi: f32, mid: f32) -> (f32, f32) {
    if lo <= hi {
        (lo, hi)
    } else {
        (mid, mid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn respawn_keeps_slot_and_stays_inside_margin() {
        let bounds = WorldBounds { w: 200.0, h: 100.0, top: 12.0 };
        let mut rng = StdRng::seed_from_u64(7);
        let mut goal = Goal::random(3, &bounds, 15.0, &mut rng);
        for _ in 0..200 {
            goal.respawn(&bounds, 15.0, &mut rng);
            assert_eq!(goal.id, 3);
            assert!((15.0..=185.0).contains(&goal.pos.x));
            assert!((27.0..=85.0).contains(&goal.pos.y));
        }
    }

    #[test]
    fn tiny_playfield_collapses_to_center() {
        let bounds = WorldBounds { w: 10.0, h: 10.0, top: 0.0 };
        let mut rng = StdRng::seed_from_u64(1);
        let goal = Goal::random(0, &bounds, 15.0, &mut rng);
        assert_eq!(goal.pos, Vector::new(5.0, 5.0));
    }
}
