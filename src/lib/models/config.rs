use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{HeatStressError, Result};

fn default_rh_handle() -> String {
    "RHx.".into()
}

fn default_tmax_handle() -> String {
    "Tmax.".into()
}

fn default_date_format() -> String {
    "%Y.%m.%d".into()
}

fn default_hi_name() -> String {
    "himax".into()
}

fn default_wbgt_name() -> String {
    "wbgtmax".into()
}

fn check_years(stage: &str, start_year: i32, end_year: i32) -> Result<()> {
    if start_year > end_year {
        return Err(HeatStressError::Config(format!(
            "{stage}: start_year {start_year} is after end_year {end_year}"
        )));
    }
    Ok(())
}

/// Daily HI / WBGT computation over a range of years
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub rh_root: PathBuf,
    pub tmax_root: PathBuf,
    pub hi_root: PathBuf,
    pub wbgt_root: PathBuf,
    pub start_year: i32,
    pub end_year: i32,
    /// projection label prefixed to output names, e.g. `2050_SSP245`
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default = "default_rh_handle")]
    pub rh_handle: String,
    #[serde(default = "default_tmax_handle")]
    pub tmax_handle: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_hi_name")]
    pub hi_name: String,
    #[serde(default = "default_wbgt_name")]
    pub wbgt_name: String,
    /// log and drop dates found in only one of the two inputs instead of failing the year
    #[serde(default)]
    pub skip_unpaired: bool,
}

impl IndexConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn validate(&self) -> Result<()> {
        check_years("IndexComputer", self.start_year, self.end_year)?;
        if self.rh_handle.is_empty() || self.tmax_handle.is_empty() {
            return Err(HeatStressError::Config(
                "IndexComputer: file handles must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// How the no-data mask of a year is built from its daily grids
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodataPolicy {
    /// a cell missing on any day is missing in the count
    #[default]
    AnyDay,
    /// only the final day's mask is applied (legacy products)
    LastDay,
}

/// Annual threshold-exceedance counts over a range of years
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub variable: String,
    pub threshold: f32,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub nodata_policy: NodataPolicy,
}

impl CountConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn validate(&self) -> Result<()> {
        check_years("ThresholdCounter", self.start_year, self.end_year)?;
        if !self.threshold.is_finite() {
            return Err(HeatStressError::Config(
                "ThresholdCounter: threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Multi-year mean of annual counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimatologyConfig {
    /// same root the counter wrote to
    pub count_root: PathBuf,
    pub output_root: PathBuf,
    pub variable: String,
    pub threshold: f32,
    pub start_year: i32,
    pub end_year: i32,
    /// selects `<scenario>.`-prefixed counts; `None` means observations
    #[serde(default)]
    pub scenario: Option<String>,
}

impl ClimatologyConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn validate(&self) -> Result<()> {
        check_years("Climatology", self.start_year, self.end_year)?;
        if !self.threshold.is_finite() {
            return Err(HeatStressError::Config(
                "Climatology: threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ClimatologyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{} {}-{}",
            self.scenario.as_deref().unwrap_or("obs"),
            self.variable,
            self.threshold,
            self.start_year,
            self.end_year
        )
    }
}
