mod common;
use std::env::{set_var, var};
use std::error::Error;
use std::path::Path;

use chrono::prelude::*;
use clap::{arg, command, Parser};
use log::{info, trace};
use rayon::ThreadPool;

use common::config::builder::ConfigContainer;
use common::helpers::{plan_steps, RunSummary, Step};
use heatstress::parallel::ParallelConfig;
use heatstress::stages::{climatology, counts, indices};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "heatstress-2023 daily heat-stress indices, exceedance counts and climatologies",
    long_about = "Computes daily Heat Index and Wet Bulb Globe Temperature grids from relative humidity and maximum temperature, counts the days per year above a threshold and averages the counts over multi-year windows.
Stages are read from a YAML run file and every year is processed in parallel."
)]
struct Args {
    #[arg(required = true, help = "Path to the configuration file", index = 1)]
    config_path: String,

    #[arg(
        short,
        long,
        help = "Number of worker threads, overrides the configuration file"
    )]
    workers: Option<usize>,
}

fn run_step(step: &Step, pool: &ThreadPool, summary: &mut RunSummary) {
    let name = step.get_stage_name();
    info!("Running stage: {name}");
    let start_time = Utc::now();

    let outcome = match step {
        Step::IndexComputer(config) => {
            indices::run(config, pool).map(|report| summary.record(name, &report))
        }
        Step::ThresholdCounter(config) => {
            counts::run(config, pool).map(|report| summary.record(name, &report))
        }
        Step::Climatologies(windows) => {
            info!("{} climatology window(s)", windows.len());
            climatology::run(windows, pool).map(|report| summary.record(name, &report))
        }
    };
    if let Err(err) = outcome {
        summary.record_error(name, &err);
    }

    let elapsed_time = Utc::now() - start_time;
    info!("Elapsed time: {} seconds", elapsed_time.num_seconds());
}

/// main function
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path_str = args.config_path;

    if var("RUST_LOG").is_err() {
        set_var("RUST_LOG", "info")
    }
    pretty_env_logger::init();

    if !Path::new(&config_path_str).is_file() {
        return Err(format!("Config file {} is not a file", config_path_str).into());
    }

    let configs = ConfigContainer::from_file(&config_path_str)
        .map_err(|err| format!("Failed to load config: {}", err))?;

    let parallel = ParallelConfig::new(args.workers.or(configs.workers));
    let pool = parallel.build_pool()?;
    info!("Using {} worker(s)", parallel.workers);

    let c = Utc::now();
    let mut summary = RunSummary::default();

    let stage_names: Vec<&str> = configs.stages.iter().map(|s| s.get_stage_name()).collect();
    info!("Stages: {}", stage_names.join(", "));

    for step in plan_steps(&configs.stages) {
        run_step(&step, &pool, &mut summary);
    }
    trace!("Run took {} seconds", Utc::now() - c);

    summary.log();
    if !summary.is_success() {
        return Err(format!("{} unit(s) failed", summary.failures().len()).into());
    }
    Ok(())
}
