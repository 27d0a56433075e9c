use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::chromosome::Chromosome;
use super::crossover::Crossover;
use crate::config::{ConfigError, EvolutionConfig};

/// Children produced per breeding pair: two parent copies and two crossover children.
pub const CHILDREN_PER_PAIR: usize = 4;

/// One chromosome's slot in a generation, plus the outcome of its trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub generation: u32,
    /// 1-based within its generation.
    pub id: usize,
    pub genome: Chromosome,
    pub performance: f32,
    pub live_time: f32,
    pub survivors: usize,
    #[serde(skip)]
    evaluated: bool,
}

impl Species {
    pub fn new(generation: u32, id: usize, genome: Chromosome) -> Self {
        Self {
            generation,
            id,
            genome,
            performance: 0.0,
            live_time: 0.0,
            survivors: 0,
            evaluated: false,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn record(&mut self, performance: f32, live_time: f32, survivors: usize) {
        self.performance = performance;
        self.live_time = live_time;
        self.survivors = survivors;
        self.evaluated = true;
    }
}

/// Optimizer lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerState {
    Init,
    EvaluatePopulation,
    Cull,
    Breed,
    Done,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no species {id} in generation {generation}")]
    UnknownSpecies { generation: u32, id: usize },
    #[error("{pending} species in generation {generation} have not finished their trial")]
    PendingTrials { generation: u32, pending: usize },
    #[error("optimizer is in state {0:?}")]
    WrongState(OptimizerState),
}

/// Median of the given values; mean of the middle pair for even counts.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    })
}

/// Keep at most half the population, all at or above the median fitness.
///
/// Species strictly above the median are taken first, then ties with the
/// median in population order until the cap is reached.
pub fn cull(population: &[Species]) -> Vec<Species> {
    let performances: Vec<f32> = population.iter().map(|s| s.performance).collect();
    let Some(median) = median(&performances) else {
        return Vec::new();
    };
    let cap = population.len() / 2;

    let above = population.iter().filter(|s| s.performance > median);
    let tied = population.iter().filter(|s| s.performance == median);
    above.chain(tied).take(cap).cloned().collect()
}

/// Breed `survivors` into a population of exactly `size` species for `generation`.
///
/// Parents are drawn in pairs from a shuffled pool. A lone parent is paired
/// with a backup survivor picked up front; an exhausted pool is reshuffled.
pub fn breed<R: Rng + ?Sized>(
    survivors: &[Species],
    size: usize,
    generation: u32,
    crossover: Crossover,
    mutation_rate: u32,
    mutation_bound: f32,
    rng: &mut R,
) -> Vec<Species> {
    let mut next: Vec<Species> = Vec::with_capacity(size);
    let Some(backup) = survivors.choose(rng).map(|s| s.genome) else {
        return next;
    };

    let mut pool: Vec<Chromosome> = Vec::new();
    while next.len() < size {
        if pool.is_empty() {
            pool = survivors.iter().map(|s| s.genome).collect();
            pool.shuffle(rng);
        }
        let Some(first) = pool.pop() else { break };
        let second = pool.pop().unwrap_or(backup);

        let (third, fourth) = crossover.apply(&first, &second, rng);
        let mut children: [Chromosome; CHILDREN_PER_PAIR] = [first, second, third, fourth];
        for child in &mut children {
            child.mutate(rng, mutation_rate, mutation_bound);
        }
        children.shuffle(rng);

        for genome in children {
            if next.len() == size {
                break;
            }
            next.push(Species::new(generation, next.len() + 1, genome));
        }
    }
    next
}

/// Generational optimizer over steering chromosomes.
///
/// Drive it by evaluating every species in [`GeneticOptimizer::population`],
/// reporting each outcome with [`GeneticOptimizer::record`], then calling
/// [`GeneticOptimizer::advance`] until the state is [`OptimizerState::Done`].
pub struct GeneticOptimizer {
    config: EvolutionConfig,
    crossover: Crossover,
    generation: u32,
    state: OptimizerState,
    population: Vec<Species>,
    history: Vec<Species>,
    best_per_generation: Vec<Species>,
    /// Offspring of the last configured generation, bred but never evaluated.
    next_population: Vec<Species>,
}

impl GeneticOptimizer {
    pub fn new<R: Rng + ?Sized>(config: EvolutionConfig, rng: &mut R) -> Result<Self, OptimizerError> {
        config.validate()?;
        let crossover = Crossover::try_from(config.crossover)
            .map_err(|e| ConfigError::InvalidCrossover(e.0))?;

        let mut optimizer = Self {
            config,
            crossover,
            generation: 0,
            state: OptimizerState::Init,
            population: Vec::new(),
            history: Vec::new(),
            best_per_generation: Vec::new(),
            next_population: Vec::new(),
        };
        optimizer.seed_population(rng);
        Ok(optimizer)
    }

    fn seed_population<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let offset = self.config.seed_genome;
        self.population = (1..=self.config.population)
            .map(|id| Species::new(0, id, Chromosome::random(rng, offset.as_ref())))
            .collect();
        self.state = OptimizerState::EvaluatePopulation;
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    pub fn population(&self) -> &[Species] {
        &self.population
    }

    /// Every evaluated species, oldest generation first.
    pub fn history(&self) -> &[Species] {
        &self.history
    }

    pub fn best_per_generation(&self) -> &[Species] {
        &self.best_per_generation
    }

    /// The generation bred from the final evaluated one. Empty until the
    /// optimizer reaches [`OptimizerState::Done`].
    pub fn next_population(&self) -> &[Species] {
        &self.next_population
    }

    /// Best species evaluated so far across all generations.
    pub fn best(&self) -> Option<&Species> {
        self.best_per_generation
            .iter()
            .max_by(|a, b| a.performance.total_cmp(&b.performance))
    }

    /// Store the trial outcome for species `id` of the current generation.
    pub fn record(
        &mut self,
        id: usize,
        performance: f32,
        live_time: f32,
        survivors: usize,
    ) -> Result<(), OptimizerError> {
        if self.state != OptimizerState::EvaluatePopulation {
            return Err(OptimizerError::WrongState(self.state));
        }
        let generation = self.generation;
        let species = self
            .population
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(OptimizerError::UnknownSpecies { generation, id })?;
        species.record(performance, live_time, survivors);

        if self.population.iter().all(Species::is_evaluated) {
            self.state = OptimizerState::Cull;
        }
        Ok(())
    }

    /// Close out the evaluated generation: log it, cull, and breed the next one.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<OptimizerState, OptimizerError> {
        match self.state {
            OptimizerState::Cull => {}
            OptimizerState::EvaluatePopulation => {
                let pending = self.population.iter().filter(|s| !s.is_evaluated()).count();
                return Err(OptimizerError::PendingTrials {
                    generation: self.generation,
                    pending,
                });
            }
            other => return Err(OptimizerError::WrongState(other)),
        }

        self.archive_generation();

        let survivors = cull(&self.population);
        debug!(
            generation = self.generation,
            survivors = survivors.len(),
            "culled population"
        );
        self.state = OptimizerState::Breed;

        let offspring = breed(
            &survivors,
            self.config.population,
            self.generation + 1,
            self.crossover,
            self.config.mutation_rate,
            self.config.mutation_bound,
            rng,
        );

        if self.generation + 1 >= self.config.generations {
            self.next_population = offspring;
            self.state = OptimizerState::Done;
            info!(generations = self.config.generations, "evolution finished");
            return Ok(self.state);
        }

        self.generation += 1;
        self.population = offspring;
        self.state = OptimizerState::EvaluatePopulation;
        Ok(self.state)
    }

    fn archive_generation(&mut self) {
        self.history.extend(self.population.iter().cloned());
        if let Some(best) = self
            .population
            .iter()
            .max_by(|a, b| a.performance.total_cmp(&b.performance))
        {
            let performances: Vec<f32> = self.population.iter().map(|s| s.performance).collect();
            info!(
                generation = self.generation,
                best_species = best.id,
                best = best.performance,
                median = median(&performances).unwrap_or_default(),
                survivors = best.survivors,
                "generation evaluated"
            );
            self.best_per_generation.push(best.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(performances: &[f32]) -> Vec<Species> {
        performances
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let mut s = Species::new(0, i + 1, Chromosome::default());
                s.record(p, 1.0, 1);
                s
            })
            .collect()
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn cull_keeps_at_most_half() {
        let population = scored(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(cull(&population).len(), 2);
        let population = scored(&[3.0, 9.0, 1.0, 7.0, 5.0, 2.0]);
        let kept: Vec<usize> = cull(&population).iter().map(|s| s.id).collect();
        assert_eq!(kept, vec![2, 4, 5]);
    }

    #[test]
    fn cull_prefers_strictly_above_median_over_ties() {
        let population = scored(&[5.0, 5.0, 5.0, 9.0]);
        let kept: Vec<usize> = cull(&population).iter().map(|s| s.id).collect();
        assert_eq!(kept, vec![4, 1]);
    }

    #[test]
    fn breed_fills_exact_size_with_odd_survivors() {
        let survivors = scored(&[1.0, 2.0, 3.0]);
        let mut rng = StdRng::seed_from_u64(17);
        for size in [1, 5, 7, 12, 13] {
            let next = breed(&survivors, size, 3, Crossover::Blend, 6, 1.0, &mut rng);
            assert_eq!(next.len(), size);
            assert!(next.iter().all(|s| s.generation == 3 && !s.is_evaluated()));
            let ids: Vec<usize> = next.iter().map(|s| s.id).collect();
            assert_eq!(ids, (1..=size).collect::<Vec<_>>());
        }
    }

    #[test]
    fn breed_without_survivors_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(breed(&[], 4, 1, Crossover::SinglePoint, 6, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn state_machine_walks_generations() {
        let mut rng = StdRng::seed_from_u64(99);
        let config = EvolutionConfig {
            generations: 2,
            population: 4,
            ..EvolutionConfig::default()
        };
        let mut opt = GeneticOptimizer::new(config, &mut rng).unwrap();
        assert_eq!(opt.state(), OptimizerState::EvaluatePopulation);
        assert!(matches!(
            opt.advance(&mut rng),
            Err(OptimizerError::PendingTrials { pending: 4, .. })
        ));

        for id in 1..=4 {
            opt.record(id, id as f32, 2.0, id).unwrap();
        }
        assert_eq!(opt.state(), OptimizerState::Cull);
        assert_eq!(opt.advance(&mut rng), Ok(OptimizerState::EvaluatePopulation));
        assert_eq!(opt.generation(), 1);
        assert_eq!(opt.population().len(), 4);
        assert!(opt.next_population().is_empty());

        for id in 1..=4 {
            opt.record(id, 0.5, 1.0, 0).unwrap();
        }
        assert_eq!(opt.advance(&mut rng), Ok(OptimizerState::Done));
        assert_eq!(opt.generation(), 1);
        let next = opt.next_population();
        assert_eq!(next.len(), 4);
        assert!(next.iter().all(|s| s.generation == 2 && !s.is_evaluated()));
        assert_eq!(opt.history().len(), 8);
        assert_eq!(opt.best_per_generation().len(), 2);
        assert_eq!(opt.best().map(|s| s.performance), Some(4.0));
        assert_eq!(
            opt.record(1, 0.0, 0.0, 0),
            Err(OptimizerError::WrongState(OptimizerState::Done))
        );
    }

    #[test]
    fn unknown_species_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut opt = GeneticOptimizer::new(EvolutionConfig::default(), &mut rng).unwrap();
        assert_eq!(
            opt.record(99, 1.0, 1.0, 1),
            Err(OptimizerError::UnknownSpecies { generation: 0, id: 99 })
        );
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = EvolutionConfig {
            population: 1,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            GeneticOptimizer::new(config, &mut rng),
            Err(OptimizerError::Config(ConfigError::PopulationTooSmall(1)))
        ));
    }
}
