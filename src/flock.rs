use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::boid::{Boid, BoidId};
use crate::vector::{circular_mean, Vector};

/// Disjoint-set forest with path compression and union by rank.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// One connected group of agents for a single tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flock {
    pub members: Vec<BoidId>,
    pub centroid: Vector,
    /// Mean member velocity.
    pub velocity: Vector,
    /// Circular mean of member headings.
    pub heading: f32,
    /// Circular mean of visible goal bearings; `None` when no member sees its goal.
    pub goal_direction: Option<f32>,
    pub score: u32,
}

impl Flock {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn summarize(indices: &[usize], boids: &[Boid]) -> Self {
        debug_assert!(!indices.is_empty(), "flocks always have at least one member");
        let n = indices.len().max(1) as f32;
        let members: Vec<&Boid> = indices.iter().map(|&i| &boids[i]).collect();

        let centroid = members.iter().map(|b| b.pos).sum::<Vector>() / n;
        let velocity = members.iter().map(|b| b.vel).sum::<Vector>() / n;
        let heading = circular_mean(members.iter().map(|b| b.heading)).unwrap_or_default();
        let goal_direction = circular_mean(members.iter().filter_map(|b| b.goal_bearing));
        let score = members.iter().fold(0u32, |acc, b| acc.saturating_add(b.score));

        Self {
            members: members.iter().map(|b| b.id).collect(),
            centroid,
            velocity,
            heading,
            goal_direction,
            score,
        }
    }
}

/// The partition of the active agents into flocks for one tick.
#[derive(Clone, Debug, Default)]
pub struct Flocks {
    flocks: Vec<Flock>,
    /// Agent indices per flock.
    indices: Vec<Vec<usize>>,
    /// Flock index per agent index.
    membership: Vec<usize>,
}

impl Flocks {
    /// Group agents into connected components of the connectivity graph.
    ///
    /// An edge joins two agents when either lists the other as connected, so
    /// one-sided links still merge. Agents missing from `boids` are ignored.
    pub fn form(boids: &[Boid]) -> Self {
        let n = boids.len();
        let index_of: HashMap<BoidId, usize> =
            boids.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

        let mut sets = DisjointSet::new(n);
        for (i, boid) in boids.iter().enumerate() {
            for (other, _) in &boid.connected_neighbors {
                if let Some(&j) = index_of.get(other) {
                    sets.union(i, j);
                }
            }
        }

        let mut root_to_flock: HashMap<usize, usize> = HashMap::new();
        let mut indices: Vec<Vec<usize>> = Vec::new();
        let mut membership = vec![0usize; n];
        for (i, slot) in membership.iter_mut().enumerate() {
            let root = sets.find(i);
            let flock = *root_to_flock.entry(root).or_insert_with(|| {
                indices.push(Vec::new());
                indices.len() - 1
            });
            indices[flock].push(i);
            *slot = flock;
        }

        let flocks = indices
            .iter()
            .map(|members| Flock::summarize(members, boids))
            .collect();

        Self {
            flocks,
            indices,
            membership,
        }
    }

    /// Recompute every aggregate from the agents' current state; membership is unchanged.
    pub fn refresh(&mut self, boids: &[Boid]) {
        for (flock, members) in self.flocks.iter_mut().zip(&self.indices) {
            *flock = Flock::summarize(members, boids);
        }
    }

    pub fn len(&self) -> usize {
        self.flocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flocks.is_empty()
    }

    pub fn as_slice(&self) -> &[Flock] {
        &self.flocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flock> {
        self.flocks.iter()
    }

    /// Flock index of the agent at `boid_index`.
    pub fn flock_index(&self, boid_index: usize) -> usize {
        self.membership[boid_index]
    }

    pub fn flock_of(&self, boid_index: usize) -> &Flock {
        &self.flocks[self.membership[boid_index]]
    }

    /// Agent indices sharing a flock with `boid_index`, itself included.
    pub fn mates_of(&self, boid_index: usize) -> &[usize] {
        &self.indices[self.membership[boid_index]]
    }

    /// Credit every member of the toucher's flock for a goal touch.
    ///
    /// Each member earns `min(size, pref_size) * unit_reward`; flocks of
    /// `max_size` or more earn nothing. Returns the total points handed out.
    pub fn award_goal_touch(
        &self,
        boids: &mut [Boid],
        toucher: usize,
        pref_size: u32,
        max_size: u32,
        unit_reward: u32,
    ) -> u32 {
        let mates = self.mates_of(toucher);
        let size = mates.len() as u32;
        if size >= max_size {
            return 0;
        }
        let points = size.min(pref_size).saturating_mul(unit_reward);
        for &i in mates {
            boids[i].score = boids[i].score.saturating_add(points);
        }
        points.saturating_mul(size)
    }
}
