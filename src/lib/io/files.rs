use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::constants::RASTER_EXT;
use crate::error::{HeatStressError, Result};

/// Inputs and outputs are organised one sub-directory per year
pub fn year_dir(root: &Path, year: i32) -> PathBuf {
    root.join(year.to_string())
}

/// Sorted `.tif` files of a directory whose name contains `handle`
pub fn list_rasters(dir: &Path, handle: Option<&str>) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| HeatStressError::io(dir, err))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| HeatStressError::io(dir, err))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(RASTER_EXT) || !path.is_file() {
            continue;
        }
        if handle.map_or(true, |h| name.contains(h)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Date string between `handle` and the `.tif` suffix of the file name
pub fn date_token(path: &Path, handle: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let (_, rest) = name.split_once(handle)?;
    let token = rest.strip_suffix(RASTER_EXT)?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub fn parse_date(token: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token, format).ok()
}

fn prefix(scenario: Option<&str>) -> String {
    scenario.map(|s| format!("{s}.")).unwrap_or_default()
}

/// `30.0` -> `30`, `30.5` -> `30.5`
pub fn threshold_label(threshold: f32) -> String {
    if threshold.fract() == 0.0 {
        format!("{}", threshold as i64)
    } else {
        format!("{threshold}")
    }
}

/// `[<scenario>.]<variable>.<date>.tif`
pub fn daily_name(scenario: Option<&str>, variable: &str, date: &str) -> String {
    format!("{}{variable}.{date}{RASTER_EXT}", prefix(scenario))
}

/// `<root>/<variable><threshold>`
pub fn count_dir(root: &Path, variable: &str, threshold: f32) -> PathBuf {
    root.join(format!("{variable}{}", threshold_label(threshold)))
}

/// `[<scenario>.]<variable><threshold>.count.<year>.tif`
pub fn count_name(scenario: Option<&str>, variable: &str, threshold: f32, year: i32) -> String {
    format!(
        "{}{variable}{}.count.{year}{RASTER_EXT}",
        prefix(scenario),
        threshold_label(threshold)
    )
}

/// `<scenario>.<variable><threshold>.avg_count_<yy>-<yy>.tif`, scenario defaults to `obs`
pub fn climatology_name(
    scenario: Option<&str>,
    variable: &str,
    threshold: f32,
    start_year: i32,
    end_year: i32,
) -> String {
    format!(
        "{}.{variable}{}.avg_count_{:02}-{:02}{RASTER_EXT}",
        scenario.unwrap_or("obs"),
        threshold_label(threshold),
        start_year.rem_euclid(100),
        end_year.rem_euclid(100)
    )
}

/// Creates `dir` and its parents, reporting the path on failure
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| HeatStressError::io(dir, err))
}
