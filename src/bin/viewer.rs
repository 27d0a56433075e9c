use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use ::rand::{rngs::StdRng, SeedableRng};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use macroquad::prelude::*;
use tracing::{error, info};

use evolved_boids::vector::{Compass, Vector};
use evolved_boids::{init_tracing, Boid, Chromosome, Config, Goal, SimConfig, Trial, TrialStatus};

const MSAA_SAMPLE_COUNT: i32 = 8;
const BOID_SCALE: f32 = 1.5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorMode {
    Heading,
    Flock,
}

/// Watch a live trial.
#[derive(Parser, Debug)]
#[command(name = "viewer")]
struct Args {
    /// Config file (JSON); only the `sim` section is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Six comma-separated weights; defaults to the hand-tuned genome.
    #[arg(long, value_delimiter = ',', num_args = 6, allow_hyphen_values = true)]
    genome: Option<Vec<f32>>,

    /// RNG seed; `BOIDS_SEED` is used when absent.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = ColorMode::Heading)]
    color: ColorMode,
}

fn rng_seed(args: &Args) -> u64 {
    args.seed
        .or_else(|| std::env::var("BOIDS_SEED").ok().and_then(|s| s.parse::<u64>().ok()))
        .unwrap_or(1)
}

fn load_sim_config(args: &Args) -> Result<SimConfig> {
    let Some(path) = &args.config else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config.sim)
}

fn genome(args: &Args) -> Result<Chromosome> {
    match &args.genome {
        None => Ok(Chromosome::default()),
        Some(genes) => {
            let genes: [f32; 6] = genes
                .as_slice()
                .try_into()
                .context("genome needs exactly six weights")?;
            Ok(Chromosome::new(genes))
        }
    }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Color::new(r, g, b, 0.8)
}

/// Window dimensions that fit the whole playfield.
fn window_size(sim: &SimConfig) -> (i32, i32) {
    (sim.width.ceil() as i32, sim.height.ceil() as i32)
}

// Runs before `main`, so it parses the arguments itself. A bad config falls
// back to the default size here and is reported properly by `run`.
fn window_conf() -> Conf {
    let sim = Args::try_parse()
        .ok()
        .and_then(|args| load_sim_config(&args).ok())
        .unwrap_or_default();
    let (window_width, window_height) = window_size(&sim);
    Conf {
        window_title: "Evolved Boids".to_owned(),
        window_width,
        window_height,
        sample_count: MSAA_SAMPLE_COUNT,
        high_dpi: true,
        ..Default::default()
    }
}

fn draw_boid(boid: &Boid, color: Color) {
    let forward = if boid.vel == Vector::ZERO {
        Vector::from_heading(boid.heading)
    } else {
        boid.vel
    };
    let angle = forward.y.atan2(forward.x).to_degrees();
    let r = boid.radius() * BOID_SCALE;
    draw_ellipse(boid.pos.x, boid.pos.y, r * 2.0, r, angle, color);
}

fn draw_goal(goal: &Goal, radius: f32) {
    draw_circle_lines(goal.pos.x, goal.pos.y, radius * 2.5, 2.0, GOLD);
}

fn start_trial(sim: &SimConfig, genome: Chromosome, seed: u64) -> Result<Trial> {
    info!(seed, %genome, "starting trial");
    Trial::new(sim.clone(), genome, StdRng::seed_from_u64(seed)).context("building trial")
}

#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("{e:#}");
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let sim = load_sim_config(&args)?;
    let genome = genome(&args)?;
    let mut seed = rng_seed(&args);
    let mut trial = start_trial(&sim, genome, seed)?;

    let mut frame_times_ms: VecDeque<f32> = VecDeque::with_capacity(100);

    loop {
        let start = Instant::now();
        let status = trial.step();
        let engine_ms = start.elapsed().as_micros() as f32 / 1000.0;

        clear_background(BLACK);

        for goal in trial.goals() {
            draw_goal(goal, sim.radius);
        }

        let flocks = trial.flocks();
        let flock_count = flocks.len().max(1) as f32;
        for (i, boid) in trial.boids().iter().enumerate() {
            let color = match args.color {
                ColorMode::Heading => hsv_to_rgb(boid.heading / 360.0, 1.0, 1.0),
                ColorMode::Flock => {
                    let flock = flocks.iter().position(|f| f.members.contains(&boid.id)).unwrap_or(i);
                    hsv_to_rgb(flock as f32 / flock_count, 0.8, 1.0)
                }
            };
            draw_boid(boid, color);
        }
        for flock in flocks.iter().filter(|f| f.len() > 1) {
            draw_circle(flock.centroid.x, flock.centroid.y, 2.0, WHITE);
        }

        frame_times_ms.push_back(engine_ms);
        if frame_times_ms.len() > 100 {
            frame_times_ms.pop_front();
        }
        let avg_ms = frame_times_ms.iter().copied().sum::<f32>() / frame_times_ms.len() as f32;

        let result = trial.result();
        draw_text(
            &format!(
                "{} | t {:.1}s | alive {} dead {} | flocks {} | fitness {:.1} | engine {:.2}ms",
                trial.algo_name(),
                trial.playtime(),
                result.survivors,
                result.deaths,
                flocks.len(),
                result.fitness,
                avg_ms
            ),
            4.0,
            sim.top_margin,
            16.0,
            WHITE,
        );

        if status != TrialStatus::Running {
            info!(?status, fitness = result.fitness, survivors = result.survivors, "trial over");
            seed = seed.wrapping_add(1);
            trial = start_trial(&sim, genome, seed)?;
        }

        next_frame().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_the_configured_playfield() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        std::fs::write(&path, r#"{ "sim": { "width": 400.0, "height": 300.5 } }"#).unwrap();

        let args = Args::try_parse_from(["viewer", "--config", path.to_str().unwrap()]).unwrap();
        let sim = load_sim_config(&args).unwrap();
        assert_eq!(window_size(&sim), (400, 301));

        let args = Args::try_parse_from(["viewer"]).unwrap();
        let sim = load_sim_config(&args).unwrap();
        let default = SimConfig::default();
        assert_eq!(window_size(&sim), (default.width as i32, default.height as i32));
    }
}
