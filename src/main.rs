use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use evolved_boids::records::write_run;
use evolved_boids::{init_tracing, run_evolution, run_showcase, Chromosome, Config};

#[derive(Parser)]
#[command(name = "evolved-boids")]
#[command(about = "Evolve flocking weights for goal-seeking boids")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the genetic optimizer and write the record logs
    Evolve {
        /// Path to config file (JSON); defaults are used when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the record logs
        #[arg(long, default_value = "records")]
        out: PathBuf,

        /// Override the base seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of generations
        #[arg(long)]
        generations: Option<u32>,

        /// Override the crossover selector (0-6)
        #[arg(long)]
        crossover: Option<u8>,
    },
    /// Run one trial for a fixed genome
    Trial {
        /// Path to config file (JSON); only the `sim` section is used
        #[arg(long)]
        config: Option<PathBuf>,

        /// Six comma-separated weights; defaults to the hand-tuned genome
        #[arg(long, value_delimiter = ',', num_args = 6, allow_hyphen_values = true)]
        genome: Option<Vec<f32>>,

        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn parse_genome(genes: Option<Vec<f32>>) -> Result<Chromosome> {
    let Some(genes) = genes else {
        return Ok(Chromosome::default());
    };
    let genes: [f32; 6] = genes
        .as_slice()
        .try_into()
        .context("genome needs exactly six weights")?;
    Ok(Chromosome::new(genes))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evolve {
            config,
            out,
            seed,
            generations,
            crossover,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                config.evolution.seed = seed;
            }
            if let Some(generations) = generations {
                config.evolution.generations = generations;
            }
            if let Some(crossover) = crossover {
                config.evolution.crossover = crossover;
            }
            config.validate().context("invalid configuration")?;

            let report = run_evolution(&config).context("evolution run failed")?;
            let [all, best] = write_run(&out, &report)
                .with_context(|| format!("writing records to {}", out.display()))?;
            info!(all = %all.display(), best = %best.display(), "records written");

            if let Some(best) = &report.best {
                println!(
                    "best: generation {} species {} performance {:.2} genome {}",
                    best.generation, best.id, best.performance, best.genome
                );
            }
        }
        Commands::Trial { config, genome, seed } => {
            let config = load_config(config.as_deref())?;
            let genome = parse_genome(genome)?;
            let result = run_showcase(&config.sim, genome, seed).context("invalid simulation config")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::DumpDefaultConfig => {
            let config = Config::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
