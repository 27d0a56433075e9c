use evolved_boids::boid::{Boid, BoidId};
use evolved_boids::config::{EvolutionConfig, SimConfig};
use evolved_boids::evolve::{Chromosome, Crossover, GeneticOptimizer, OptimizerState};
use evolved_boids::goal::Goal;
use evolved_boids::rules::goal_seek;
use evolved_boids::sim::{trial_rng, Trial, TrialStatus};
use evolved_boids::vector::Vector;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn config_with_radius(radius: f32) -> SimConfig {
    SimConfig {
        radius,
        population: 2,
        goal_count: 1,
        ..SimConfig::default()
    }
}

#[test]
fn touching_agents_die_together_on_the_first_tick() {
    let cfg = config_with_radius(4.0);
    let tick = cfg.tick_seconds;
    let boids = vec![
        Boid::new(BoidId(0), Vector::new(200.0, 200.0), 4.0),
        Boid::new(BoidId(1), Vector::new(210.0, 200.0), 4.0),
    ];
    let goals = vec![Goal::new(0, Vector::new(800.0, 500.0))];
    let mut trial = Trial::with_population(cfg, Chromosome::default(), boids, goals, trial_rng(1, 0, 1)).unwrap();

    assert_eq!(trial.step(), TrialStatus::Extinct);
    assert!(trial.boids().is_empty());
    assert_eq!(trial.deaths(), 2);

    // No score and no cost yet: each death banks only its live time.
    let result = trial.result();
    assert_eq!(result.survivors, 0);
    assert!((result.fitness - 2.0 * tick).abs() < 1e-5);
}

#[test]
fn agents_just_outside_collision_range_survive() {
    let cfg = config_with_radius(4.0);
    let boids = vec![
        Boid::new(BoidId(0), Vector::new(200.0, 200.0), 4.0),
        Boid::new(BoidId(1), Vector::new(210.5, 200.0), 4.0),
    ];
    let goals = vec![Goal::new(0, Vector::new(800.0, 500.0))];
    let mut trial = Trial::with_population(cfg, Chromosome::default(), boids, goals, trial_rng(1, 0, 1)).unwrap();
    trial.step();
    assert_eq!(trial.deaths(), 0);
}

#[test]
fn visible_goal_in_reach_is_touched_and_scored() {
    let cfg = SimConfig {
        population: 1,
        ..config_with_radius(4.0)
    };
    // Heading 0 faces up, so a goal just above is in view and inside collision range.
    let boids = vec![Boid::new(BoidId(0), Vector::new(300.0, 300.0), 4.0)];
    let goals = vec![Goal::new(0, Vector::new(300.0, 295.0))];
    let mut trial = Trial::with_population(cfg, Chromosome::default(), boids, goals, trial_rng(2, 0, 1)).unwrap();

    assert_eq!(trial.step(), TrialStatus::Running);
    let boid = &trial.boids()[0];
    assert!(boid.touched_goal);
    assert!(boid.score >= 1);
    assert_eq!(trial.goals()[0].id, 0);
    assert_ne!(trial.goals()[0].pos, Vector::new(300.0, 295.0));
}

#[test]
fn goal_behind_the_agent_is_never_steered_at_directly() {
    let me = Boid::new(BoidId(0), Vector::new(300.0, 300.0), 3.0);
    let goal = Goal::new(0, Vector::new(300.0, 360.0));
    let literal = goal.pos - me.pos;
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..500 {
        let delta = goal_seek(&me, Some(&goal), 2.0, &mut rng);
        assert_ne!(delta, literal);
        assert!(delta.x.abs() <= 2.0 && delta.y.abs() <= 2.0);
    }
}

#[test]
fn next_generation_keeps_population_size_for_every_crossover() {
    for selector in 0..Crossover::ALL.len() {
        let mut rng = StdRng::seed_from_u64(selector as u64);
        let config = EvolutionConfig {
            population: 12,
            generations: 1,
            mutation_rate: u32::MAX,
            crossover: selector as u8,
            ..EvolutionConfig::default()
        };
        let mut opt = GeneticOptimizer::new(config, &mut rng).unwrap();
        for id in 1..=12 {
            opt.record(id, (id % 5) as f32, 1.0, 0).unwrap();
        }
        assert_eq!(opt.advance(&mut rng), Ok(OptimizerState::Done));
        assert_eq!(opt.history().len(), 12);
        assert_eq!(opt.next_population().len(), 12, "crossover {selector}");
    }
}
