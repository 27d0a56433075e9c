use std::collections::HashMap;

use crate::boid::Boid;
use crate::vector::Vector;
use super::NeighborSearch;

/// Spatial hashing–based neighbor search.
///
/// `cell_size` should be on the order of the widest query range (usually the
/// flock range), so a query only visits the surrounding ring of cells.
pub struct SpatialHashNeighborSearch {
    pub cell_size: f32,
    grid: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHashNeighborSearch {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 && cell_size.is_finite() { cell_size } else { 1.0 },
            grid: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, pos: Vector) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

impl NeighborSearch for SpatialHashNeighborSearch {
    fn rebuild(&mut self, boids: &[Boid]) {
        self.grid.clear();

        for (i, boid) in boids.iter().enumerate() {
            let cell = self.cell_of(boid.pos);
            self.grid.entry(cell).or_default().push(i);
        }
    }

    fn candidates(&self, boids: &[Boid], index: usize, range: f32) -> Vec<usize> {
        let range2 = range * range;
        let pos_i = boids[index].pos;
        let (cx, cy) = self.cell_of(pos_i);
        let reach = (range / self.cell_size).ceil().max(1.0) as i32;

        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(indices) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in indices {
                    if j != index && (boids[j].pos - pos_i).length_squared() <= range2 {
                        found.push(j);
                    }
                }
            }
        }

        found.sort_unstable();
        found
    }

    fn name(&self) -> &'static str {
        "SpatialHash"
    }
}
