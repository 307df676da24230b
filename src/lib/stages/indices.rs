//! Index Computer: daily HI and WBGT grids from paired RH / Tmax grids

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Utc};
use itertools::{EitherOrBoth, Itertools};
use log::{debug, info, trace, warn};
use rayon::ThreadPool;

use crate::constants::NODATAVAL;
use crate::error::{HeatStressError, Result};
use crate::io::files::{daily_name, date_token, ensure_dir, list_rasters, parse_date, year_dir};
use crate::io::{read_grid, write_grid};
use crate::models::config::IndexConfig;
use crate::models::grid::{ensure_shape, Grid};
use crate::modules::functions::{grid_c_to_f, snap_nodata_inplace, TemperatureUnit};
use crate::modules::heat_index::functions::heatindex;
use crate::modules::wbgt::functions::wbgt_from_hi;
use crate::parallel::{fan_out, FanOutReport};

/// One day of humidity and temperature input
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPair {
    pub date: NaiveDate,
    /// date string as it appears in the file names
    pub token: String,
    pub rh: PathBuf,
    pub tmax: PathBuf,
}

fn index_by_token(
    year: i32,
    files: &[PathBuf],
    handle: &str,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut by_token = BTreeMap::new();
    for path in files {
        let token = date_token(path, handle).ok_or_else(|| {
            HeatStressError::mismatch(
                year,
                format!("no date after '{handle}' in {}", path.display()),
            )
        })?;
        if let Some(previous) = by_token.insert(token.clone(), path.clone()) {
            return Err(HeatStressError::mismatch(
                year,
                format!(
                    "date {token} appears twice: {} and {}",
                    previous.display(),
                    path.display()
                ),
            ));
        }
    }
    Ok(by_token)
}

/// Join humidity and temperature files on their date token
pub fn pair_by_date(
    config: &IndexConfig,
    year: i32,
    rh_files: &[PathBuf],
    tmax_files: &[PathBuf],
) -> Result<Vec<DailyPair>> {
    let rh = index_by_token(year, rh_files, &config.rh_handle)?;
    let tmax = index_by_token(year, tmax_files, &config.tmax_handle)?;

    // both maps are sorted by token
    let mut matched = Vec::with_capacity(rh.len());
    let mut rh_only = Vec::new();
    let mut tmax_only = Vec::new();
    for entry in rh.iter().merge_join_by(tmax.iter(), |a, b| a.0.cmp(b.0)) {
        match entry {
            EitherOrBoth::Both((token, rh_path), (_, tmax_path)) => {
                matched.push((token, rh_path, tmax_path))
            }
            EitherOrBoth::Left((token, _)) => rh_only.push(token.as_str()),
            EitherOrBoth::Right((token, _)) => tmax_only.push(token.as_str()),
        }
    }

    if !rh_only.is_empty() || !tmax_only.is_empty() {
        if !config.skip_unpaired {
            return Err(HeatStressError::mismatch(
                year,
                format!(
                    "{} RH file(s), {} Tmax file(s); dates only in RH: [{}]; only in Tmax: [{}]",
                    rh.len(),
                    tmax.len(),
                    rh_only.join(", "),
                    tmax_only.join(", ")
                ),
            ));
        }
        for token in &rh_only {
            warn!("[{year}] skipping {token}: no Tmax grid");
        }
        for token in &tmax_only {
            warn!("[{year}] skipping {token}: no RH grid");
        }
    }

    let mut pairs = Vec::with_capacity(matched.len());
    for (token, rh_path, tmax_path) in matched {
        let date = parse_date(token, &config.date_format).ok_or_else(|| {
            HeatStressError::mismatch(
                year,
                format!("cannot parse '{token}' with format {}", config.date_format),
            )
        })?;
        if date.year() != year {
            return Err(HeatStressError::mismatch(
                year,
                format!("{} is dated {date}", rh_path.display()),
            ));
        }
        pairs.push(DailyPair {
            date,
            token: token.clone(),
            rh: rh_path.clone(),
            tmax: tmax_path.clone(),
        });
    }

    if pairs.is_empty() {
        return Err(HeatStressError::mismatch(year, "no paired daily grids"));
    }
    pairs.sort_by_key(|pair| pair.date);
    Ok(pairs)
}

fn output_path(root: &Path, year: i32, scenario: Option<&str>, variable: &str, token: &str) -> PathBuf {
    year_dir(root, year).join(daily_name(scenario, variable, token))
}

/// HI and WBGT for one day, both written as `f32` with nodata -9999
pub fn compute_day(config: &IndexConfig, year: i32, pair: &DailyPair) -> Result<(PathBuf, PathBuf)> {
    let mut rh: Grid<f32> = read_grid(&pair.rh)?;
    let mut tmax: Grid<f32> = read_grid(&pair.tmax)?;
    // providers disagree on nodata conventions
    rh.stamp_nodata(NODATAVAL as f64);
    tmax.stamp_nodata(NODATAVAL as f64);
    ensure_shape(&pair.tmax, rh.shape(), tmax.shape())?;

    let mut hi = heatindex(
        &tmax.data,
        &rh.data,
        TemperatureUnit::Celsius,
        TemperatureUnit::Celsius,
    );
    snap_nodata_inplace(&mut hi);

    let mut wbgt = wbgt_from_hi(&grid_c_to_f(&hi));
    snap_nodata_inplace(&mut wbgt);

    let meta = rh.meta.clone();
    let scenario = config.scenario.as_deref();

    let hi_path = output_path(&config.hi_root, year, scenario, &config.hi_name, &pair.token);
    write_grid(&hi_path, &Grid::new(hi, meta.clone()))?;
    debug!("[{year}] wrote {}", hi_path.display());

    let wbgt_path = output_path(&config.wbgt_root, year, scenario, &config.wbgt_name, &pair.token);
    write_grid(&wbgt_path, &Grid::new(wbgt, meta))?;
    debug!("[{year}] wrote {}", wbgt_path.display());

    Ok((hi_path, wbgt_path))
}

/// All days of one year; returns the number of days written
pub fn run_year(config: &IndexConfig, year: i32) -> Result<usize> {
    info!("[IndexComputer] processing {year}");
    let start = Utc::now();

    let rh_files = list_rasters(&year_dir(&config.rh_root, year), Some(&config.rh_handle))?;
    let tmax_files = list_rasters(&year_dir(&config.tmax_root, year), Some(&config.tmax_handle))?;
    let pairs = pair_by_date(config, year, &rh_files, &tmax_files)?;

    for pair in &pairs {
        let c = Utc::now();
        compute_day(config, year, pair)?;
        trace!("[{year}] {} took {}", pair.token, Utc::now() - c);
    }

    info!(
        "[IndexComputer] {year} done: {} day(s) in {} seconds",
        pairs.len(),
        (Utc::now() - start).num_seconds()
    );
    Ok(pairs.len())
}

/// Output year directories must exist before the workers start
pub fn prepare_outputs(config: &IndexConfig) -> Result<()> {
    for year in config.years() {
        ensure_dir(&year_dir(&config.hi_root, year))?;
        ensure_dir(&year_dir(&config.wbgt_root, year))?;
    }
    Ok(())
}

pub fn run(config: &IndexConfig, pool: &ThreadPool) -> Result<FanOutReport<i32, usize>> {
    config.validate()?;
    prepare_outputs(config)?;
    let years: Vec<i32> = config.years().collect();
    Ok(fan_out(pool, &years, |&year| run_year(config, year)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grid::{GeoTransform, GridMeta};
    use crate::parallel::ParallelConfig;
    use ndarray::{array, Array2};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn meta() -> GridMeta {
        GridMeta::new(GeoTransform::new(30.0, 10.0, 0.05, -0.05), Some(4326), Some(f64::NAN))
    }

    fn put(dir: &Path, name: &str, data: Array2<f32>) {
        fs::create_dir_all(dir).unwrap();
        write_grid(&dir.join(name), &Grid::new(data, meta())).unwrap();
    }

    fn config(root: &TempDir) -> IndexConfig {
        IndexConfig {
            rh_root: root.path().join("RHx"),
            tmax_root: root.path().join("Tmax"),
            hi_root: root.path().join("himax"),
            wbgt_root: root.path().join("wbgtmax"),
            start_year: 1983,
            end_year: 1983,
            scenario: None,
            rh_handle: "RHx.".into(),
            tmax_handle: "Tmax.".into(),
            date_format: "%Y.%m.%d".into(),
            hi_name: "himax".into(),
            wbgt_name: "wbgtmax".into(),
            skip_unpaired: false,
        }
    }

    fn seed_year(config: &IndexConfig, year: i32, days: &[&str]) {
        for day in days {
            put(
                &year_dir(&config.rh_root, year),
                &format!("RHx.{day}.tif"),
                array![[60.0, NODATAVAL], [40.0, 50.0]],
            );
            put(
                &year_dir(&config.tmax_root, year),
                &format!("Tmax.{day}.tif"),
                array![[35.0, 30.0], [NODATAVAL, 20.0]],
            );
        }
    }

    fn paths(config: &IndexConfig, year: i32, handle: &str, days: &[&str]) -> Vec<PathBuf> {
        let root = if handle == "RHx." { &config.rh_root } else { &config.tmax_root };
        days.iter()
            .map(|d| year_dir(root, year).join(format!("{handle}{d}.tif")))
            .collect()
    }

    #[test]
    fn pairs_are_joined_by_date_not_position() {
        let root = tempdir().unwrap();
        let config = config(&root);
        let rh = paths(&config, 1983, "RHx.", &["1983.01.02", "1983.01.01"]);
        let tmax = paths(&config, 1983, "Tmax.", &["1983.01.01", "1983.01.02"]);
        let pairs = pair_by_date(&config, 1983, &rh, &tmax).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].token, "1983.01.01");
        assert_eq!(pairs[0].rh, rh[1]);
        assert_eq!(pairs[0].tmax, tmax[0]);
    }

    #[test]
    fn unmatched_dates_fail_the_year() {
        let root = tempdir().unwrap();
        let config = config(&root);
        let rh = paths(&config, 1983, "RHx.", &["1983.01.01", "1983.01.02"]);
        let tmax = paths(&config, 1983, "Tmax.", &["1983.01.01", "1983.01.03"]);
        match pair_by_date(&config, 1983, &rh, &tmax) {
            Err(HeatStressError::InputMismatch { year, detail }) => {
                assert_eq!(year, 1983);
                assert!(detail.contains("1983.01.02"));
                assert!(detail.contains("1983.01.03"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_dates_can_be_skipped() {
        let root = tempdir().unwrap();
        let mut config = config(&root);
        config.skip_unpaired = true;
        let rh = paths(&config, 1983, "RHx.", &["1983.01.01", "1983.01.02"]);
        let tmax = paths(&config, 1983, "Tmax.", &["1983.01.01"]);
        let pairs = pair_by_date(&config, 1983, &rh, &tmax).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].date, NaiveDate::from_ymd_opt(1983, 1, 1).unwrap());
    }

    #[test]
    fn date_from_another_year_is_rejected() {
        let root = tempdir().unwrap();
        let config = config(&root);
        let rh = paths(&config, 1983, "RHx.", &["1984.01.01"]);
        let tmax = paths(&config, 1983, "Tmax.", &["1984.01.01"]);
        assert!(matches!(
            pair_by_date(&config, 1983, &rh, &tmax),
            Err(HeatStressError::InputMismatch { .. })
        ));
    }

    #[test]
    fn writes_hi_and_wbgt_with_sentinels() {
        let root = tempdir().unwrap();
        let mut config = config(&root);
        config.scenario = Some("2050_SSP245".into());
        seed_year(&config, 1983, &["1983.01.01", "1983.01.02"]);
        prepare_outputs(&config).unwrap();

        assert_eq!(run_year(&config, 1983).unwrap(), 2);

        let hi_path = year_dir(&config.hi_root, 1983).join("2050_SSP245.himax.1983.01.02.tif");
        let hi: Grid<f32> = read_grid(&hi_path).unwrap();
        assert_eq!(hi.nodata(), Some(-9999.0));
        assert_eq!(hi.meta.epsg, Some(4326));
        assert!((hi.data[[0, 0]] - 45.05).abs() < 0.01);
        assert_eq!(hi.data[[0, 1]], NODATAVAL);
        assert_eq!(hi.data[[1, 0]], NODATAVAL);
        // 20 °C, 50 %: simple Steadman form
        assert!(hi.data[[1, 1]] > 15.0 && hi.data[[1, 1]] < 25.0);

        let wbgt_path = year_dir(&config.wbgt_root, 1983).join("2050_SSP245.wbgtmax.1983.01.02.tif");
        let wbgt: Grid<f32> = read_grid(&wbgt_path).unwrap();
        assert!((wbgt.data[[0, 0]] - 31.08).abs() < 0.01);
        assert_eq!(wbgt.data[[0, 1]], NODATAVAL);
        assert_eq!(wbgt.data[[1, 0]], NODATAVAL);
    }

    #[test]
    fn shape_mismatch_is_metadata_error() {
        let root = tempdir().unwrap();
        let config = config(&root);
        put(&year_dir(&config.rh_root, 1983), "RHx.1983.01.01.tif", array![[50.0, 50.0]]);
        put(&year_dir(&config.tmax_root, 1983), "Tmax.1983.01.01.tif", array![[30.0], [30.0]]);
        prepare_outputs(&config).unwrap();
        assert!(matches!(run_year(&config, 1983), Err(HeatStressError::Metadata { .. })));
    }

    #[test]
    fn missing_year_fails_alone() {
        let root = tempdir().unwrap();
        let mut config = config(&root);
        config.end_year = 1985;
        seed_year(&config, 1983, &["1983.07.01"]);
        seed_year(&config, 1985, &["1985.07.01"]);

        let pool = ParallelConfig::new(Some(2)).build_pool().unwrap();
        let report = run(&config, &pool).unwrap();
        assert_eq!(report.failed_units(), vec![1984]);
        assert_eq!(report.succeeded, vec![(1983, 1), (1985, 1)]);
        assert!(year_dir(&config.wbgt_root, 1985).join("wbgtmax.1985.07.01.tif").is_file());
    }
}
