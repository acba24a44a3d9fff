//! `biasbench`: build, publish and analyse a diffusion bias benchmark.
//!
//! - `generate`: synthesize prompts, generate images, publish Parquet batches
//! - `analyze`: measure face hue and demographics of a published dataset
//! - `unpack`, `excise`: prepare a LoRA training directory
//! - `collage`, `report`: inspect a dataset visually and statistically

use anyhow::{Context, Result};
use bench_core::BenchConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "biasbench")]
#[command(version)]
#[command(about = "Image-generation bias benchmark toolkit")]
struct Cli {
    /// JSON run configuration; overrides --preset
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in configuration to use when no --config is given
    #[arg(long, value_enum, global = true, default_value_t = Preset::Benchmark)]
    preset: Preset,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Benchmark,
    Finetune,
}

#[derive(Subcommand)]
enum Command {
    /// Generate images for every prompt and publish them batch by batch
    Generate,
    /// Analyse the source dataset and republish it with hue/race/sex columns
    Analyze,
    /// Write Parquet rows out as numbered image/caption pairs for LoRA training
    Unpack {
        /// Directory holding the .parquet shards
        source: PathBuf,
        /// Training root; defaults to the source directory
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Remove race and sex words from caption files
    Excise {
        /// Directory holding the .txt captions
        dir: PathBuf,
    },
    /// Save one image collage per prompt of the source dataset
    Collage {
        #[arg(long, default_value = "collages")]
        output: PathBuf,
        #[arg(long, default_value_t = 25)]
        per_prompt: usize,
        #[arg(long, default_value_t = 5)]
        columns: u32,
        /// Seed for image sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Summarize face hue by predicted race from an analysed dataset
    Report {
        #[arg(long, default_value = "reports")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = load_config(&cli)?;

    match cli.command {
        Command::Generate => commands::generate(&config).await,
        Command::Analyze => commands::analyze(&config).await,
        Command::Unpack { source, target } => {
            let target = target.unwrap_or_else(|| source.clone());
            commands::unpack(&source, &target)
        }
        Command::Excise { dir } => commands::excise(&dir),
        Command::Collage {
            output,
            per_prompt,
            columns,
            seed,
        } => {
            let options = curate::CollageOptions {
                images_per_prompt: per_prompt,
                max_columns: columns,
                output_dir: output,
            };
            commands::collage(&config, &options, seed).await
        }
        Command::Report { output } => commands::report(&config, &output).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<BenchConfig> {
    let config = match &cli.config {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match cli.preset {
            Preset::Benchmark => BenchConfig::benchmark(),
            Preset::Finetune => BenchConfig::finetune(),
        },
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}
