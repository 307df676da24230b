//! Threshold Counter: days per year above a threshold

use std::path::PathBuf;

use chrono::Utc;
use log::{debug, info};
use rayon::ThreadPool;

use crate::constants::NODATAVAL;
use crate::error::{HeatStressError, Result};
use crate::io::files::{count_dir, count_name, ensure_dir, list_rasters, year_dir};
use crate::io::{read_grid, write_grid};
use crate::models::config::CountConfig;
use crate::models::grid::{ensure_shape, Grid};
use crate::modules::counts::config::CountModelConfig;
use crate::modules::counts::models::CountState;
use crate::parallel::{fan_out, FanOutReport};

pub fn output_path(config: &CountConfig, year: i32) -> PathBuf {
    count_dir(&config.output_root, &config.variable, config.threshold).join(count_name(
        config.scenario.as_deref(),
        &config.variable,
        config.threshold,
        year,
    ))
}

/// Count one year of daily grids and write the `i16` count grid
pub fn count_year(config: &CountConfig, year: i32) -> Result<PathBuf> {
    info!("[ThresholdCounter] counting {} > {} in {year}", config.variable, config.threshold);
    let start = Utc::now();

    let files = list_rasters(&year_dir(&config.input_root, year), None)?;
    let Some((first_path, rest)) = files.split_first() else {
        return Err(HeatStressError::mismatch(year, "no daily grids found"));
    };

    let first: Grid<f32> = read_grid(first_path)?;
    let mut state = CountState::new(
        first.shape(),
        config.threshold,
        CountModelConfig::new(config.nodata_policy),
    );
    state.update(&first.data);
    debug!("[{year}] counted {}", first_path.display());

    for path in rest {
        let day: Grid<f32> = read_grid(path)?;
        ensure_shape(path, state.shape(), day.shape())?;
        state.update(&day.data);
        debug!("[{year}] counted {}", path.display());
    }

    let out_path = output_path(config, year);
    let meta = first.meta.with_nodata(NODATAVAL as f64);
    write_grid(&out_path, &Grid::new(state.output(), meta))?;

    info!(
        "[ThresholdCounter] {year} done: {} day(s) in {} seconds",
        state.days(),
        (Utc::now() - start).num_seconds()
    );
    Ok(out_path)
}

pub fn run(config: &CountConfig, pool: &ThreadPool) -> Result<FanOutReport<i32, PathBuf>> {
    config.validate()?;
    ensure_dir(&count_dir(&config.output_root, &config.variable, config.threshold))?;
    let years: Vec<i32> = config.years().collect();
    Ok(fan_out(pool, &years, |&year| count_year(config, year)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::NodataPolicy;
    use crate::models::grid::{GeoTransform, GridMeta};
    use crate::parallel::ParallelConfig;
    use ndarray::{array, Array2};
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const S: f32 = NODATAVAL;

    fn put(dir: &Path, name: &str, data: Array2<f32>) {
        fs::create_dir_all(dir).unwrap();
        let meta = GridMeta::new(GeoTransform::new(0.0, 0.0, 1.0, -1.0), Some(4326), Some(-9999.0));
        write_grid(&dir.join(name), &Grid::new(data, meta)).unwrap();
    }

    fn config(root: &TempDir, policy: NodataPolicy) -> CountConfig {
        CountConfig {
            input_root: root.path().join("wbgtmax"),
            output_root: root.path().join("counts"),
            variable: "wbgtmax".into(),
            threshold: 30.0,
            start_year: 1990,
            end_year: 1990,
            scenario: None,
            nodata_policy: policy,
        }
    }

    fn seed(config: &CountConfig) {
        let dir = year_dir(&config.input_root, 1990);
        let days = [
            array![[31.0, 10.0], [S, 30.5]],
            array![[29.0, 10.0], [32.0, 31.0]],
            array![[30.0, 12.0], [33.0, 35.0]],
            array![[30.1, 30.0], [34.0, 40.0]],
            array![[35.0, 29.9], [31.0, 30.01]],
        ];
        for (i, day) in days.into_iter().enumerate() {
            put(&dir, &format!("wbgtmax.1990.01.0{}.tif", i + 1), day);
        }
    }

    #[test]
    fn counts_strict_exceedances() {
        let root = tempdir().unwrap();
        let config = config(&root, NodataPolicy::AnyDay);
        seed(&config);
        ensure_dir(&count_dir(&config.output_root, "wbgtmax", 30.0)).unwrap();

        let path = count_year(&config, 1990).unwrap();
        assert!(path.ends_with("wbgtmax30/wbgtmax30.count.1990.tif"));

        let counts: Grid<i16> = read_grid(&path).unwrap();
        assert_eq!(counts.data, array![[3, 0], [-9999, 5]]);
        assert_eq!(counts.nodata(), Some(-9999.0));
    }

    #[test]
    fn last_day_policy_keeps_early_gaps() {
        let root = tempdir().unwrap();
        let config = config(&root, NodataPolicy::LastDay);
        seed(&config);
        ensure_dir(&count_dir(&config.output_root, "wbgtmax", 30.0)).unwrap();

        let counts: Grid<i16> = read_grid(&count_year(&config, 1990).unwrap()).unwrap();
        assert_eq!(counts.data, array![[3, 0], [4, 5]]);
    }

    #[test]
    fn empty_year_is_input_mismatch() {
        let root = tempdir().unwrap();
        let config = config(&root, NodataPolicy::AnyDay);
        fs::create_dir_all(year_dir(&config.input_root, 1990)).unwrap();
        assert!(matches!(
            count_year(&config, 1990),
            Err(HeatStressError::InputMismatch { year: 1990, .. })
        ));
    }

    #[test]
    fn ragged_day_is_metadata_error() {
        let root = tempdir().unwrap();
        let config = config(&root, NodataPolicy::AnyDay);
        let dir = year_dir(&config.input_root, 1990);
        put(&dir, "wbgtmax.1990.01.01.tif", array![[31.0, 31.0]]);
        put(&dir, "wbgtmax.1990.01.02.tif", array![[31.0], [31.0]]);
        assert!(matches!(count_year(&config, 1990), Err(HeatStressError::Metadata { .. })));
    }

    #[test]
    fn scenario_counts_across_years() {
        let root = tempdir().unwrap();
        let mut config = config(&root, NodataPolicy::AnyDay);
        config.scenario = Some("2050_SSP585".into());
        config.start_year = 2049;
        config.end_year = 2051;
        for year in config.years() {
            let dir = year_dir(&config.input_root, year);
            put(&dir, &format!("2050_SSP585.wbgtmax.{year}.06.01.tif"), array![[31.0, 20.0]]);
            put(&dir, &format!("2050_SSP585.wbgtmax.{year}.06.02.tif"), array![[32.0, 31.0]]);
        }

        let pool = ParallelConfig::new(Some(2)).build_pool().unwrap();
        let report = run(&config, &pool).unwrap();
        assert!(report.is_success());
        assert_eq!(report.succeeded.len(), 3);

        let path = output_path(&config, 2050);
        assert!(path.ends_with("wbgtmax30/2050_SSP585.wbgtmax30.count.2050.tif"));
        let counts: Grid<i16> = read_grid(&path).unwrap();
        assert_eq!(counts.data, array![[2, 1]]);
    }
}
