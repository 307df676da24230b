//! Climatology Averager: cell-wise mean of annual count grids

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use rayon::ThreadPool;

use crate::constants::NODATAVAL;
use crate::error::{HeatStressError, Result};
use crate::io::files::{climatology_name, count_dir, count_name, ensure_dir};
use crate::io::{read_grid, write_grid};
use crate::models::config::ClimatologyConfig;
use crate::models::grid::{ensure_shape, Grid};
use crate::modules::climatology::models::MeanState;
use crate::parallel::{fan_out, FanOutReport};

/// Mean of `inputs` written as `f32` to `out_path`; sentinel cells are left out of the mean
pub fn average_grids(inputs: &[PathBuf], out_path: &Path) -> Result<()> {
    let Some((first_path, rest)) = inputs.split_first() else {
        return Err(HeatStressError::Config(format!(
            "nothing to average into {}",
            out_path.display()
        )));
    };

    let first: Grid<f32> = read_grid(first_path)?;
    let mut state = MeanState::new(first.shape());
    state.update(&first.data);

    for path in rest {
        let layer: Grid<f32> = read_grid(path)?;
        ensure_shape(path, state.shape(), layer.shape())?;
        state.update(&layer.data);
        debug!("averaged {}", path.display());
    }

    let meta = first.meta.with_nodata(NODATAVAL as f64);
    write_grid(out_path, &Grid::new(state.output(), meta))
}

/// Annual count grids for every year of the window, in year order
pub fn select_counts(config: &ClimatologyConfig) -> Result<Vec<PathBuf>> {
    let dir = count_dir(&config.count_root, &config.variable, config.threshold);
    config
        .years()
        .map(|year| {
            let path = dir.join(count_name(
                config.scenario.as_deref(),
                &config.variable,
                config.threshold,
                year,
            ));
            if path.is_file() {
                Ok(path)
            } else {
                Err(HeatStressError::mismatch(
                    year,
                    format!("missing annual count {}", path.display()),
                ))
            }
        })
        .collect()
}

pub fn output_path(config: &ClimatologyConfig) -> PathBuf {
    config.output_root.join(climatology_name(
        config.scenario.as_deref(),
        &config.variable,
        config.threshold,
        config.start_year,
        config.end_year,
    ))
}

pub fn run_climatology(config: &ClimatologyConfig) -> Result<PathBuf> {
    info!("[Climatology] averaging {config}");
    let start = Utc::now();

    let inputs = select_counts(config)?;
    let out_path = output_path(config);
    average_grids(&inputs, &out_path)?;

    info!(
        "[Climatology] wrote {} from {} year(s) in {} seconds",
        out_path.display(),
        inputs.len(),
        (Utc::now() - start).num_seconds()
    );
    Ok(out_path)
}

/// Independent climatologies share the worker pool
pub fn run(
    configs: &[ClimatologyConfig],
    pool: &ThreadPool,
) -> Result<FanOutReport<ClimatologyConfig, PathBuf>> {
    for config in configs {
        config.validate()?;
        ensure_dir(&config.output_root)?;
    }
    Ok(fan_out(pool, configs, run_climatology))
}
