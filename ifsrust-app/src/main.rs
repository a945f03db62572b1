mod app_dir;
mod config;
mod harness;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use ifsrust_core::Catalog;

use config::{Overrides, RunConfig, ShadeStyle};

#[derive(Parser)]
#[command(name = "ifsrust", version)]
#[command(about = "Render iterated-function-system fractals to PNG, one thread per fractal")]
struct Cli {
    /// JSON run configuration (defaults to every built-in fractal)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory (defaults to the Desktop)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Points sampled per fractal
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Base RNG seed for reproducible images
    #[arg(long)]
    seed: Option<u64>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Render only the named job (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Shading of point density
    #[arg(long, value_enum)]
    shade: Option<ShadeStyle>,

    /// List the built-in fractals and exit
    #[arg(long)]
    list: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output.clone(),
            iterations: self.iterations,
            seed: self.seed,
            width: self.width,
            height: self.height,
            shade: self.shade,
            only: self.only.clone(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list {
        for entry in Catalog::ALL {
            println!(
                "{:<18} {} ({} maps)",
                entry.name(),
                entry.label(),
                entry.transformations().len()
            );
        }
        return ExitCode::SUCCESS;
    }

    let mut config = match &cli.config {
        Some(path) => match RunConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => RunConfig::default(),
    };
    if let Err(e) = config.apply(cli.overrides()) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    if cli.dump_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{json}");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                error!("Failed to serialize config: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let output_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(app_dir::default_output_directory);
    let base_seed = config.seed.unwrap_or_else(rand::random);
    info!(
        jobs = config.jobs.len(),
        base_seed,
        "Starting IfsRust, writing to {}",
        output_dir.display()
    );

    let jobs = match harness::plan_jobs(&config, &output_dir, base_seed) {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let summary = harness::run_all(&jobs);
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => println!(
                "ok     {:<18} {:>8.2}s  {:>9} points  seed {:<20}  {}",
                outcome.name,
                report.elapsed.as_secs_f64(),
                report.points_plotted,
                report.seed,
                report.output.display()
            ),
            Err(e) => println!("failed {:<18} {e}", outcome.name),
        }
    }
    println!(
        "All {} fractals were processed in {:.2} seconds ({} failed).",
        summary.outcomes.len(),
        summary.elapsed.as_secs_f64(),
        summary.failed()
    );

    if summary.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
