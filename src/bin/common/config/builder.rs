use std::fs::File;
use std::io::Read;
use std::path::Path;

use heatstress::error::{HeatStressError, Result};
use heatstress::models::config::{ClimatologyConfig, CountConfig, IndexConfig};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StageConfig {
    IndexComputer(IndexConfig),
    ThresholdCounter(CountConfig),
    Climatology(ClimatologyConfig),
}

impl StageConfig {
    pub fn get_stage_name(&self) -> &'static str {
        match self {
            StageConfig::IndexComputer(_) => "IndexComputer",
            StageConfig::ThresholdCounter(_) => "ThresholdCounter",
            StageConfig::Climatology(_) => "Climatology",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            StageConfig::IndexComputer(config) => config.validate(),
            StageConfig::ThresholdCounter(config) => config.validate(),
            StageConfig::Climatology(config) => config.validate(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigContainer {
    /// size of the worker pool, every logical CPU when absent
    #[serde(default)]
    pub workers: Option<usize>,
    pub stages: Vec<StageConfig>,
}

impl ConfigContainer {
    pub fn from_file(config_file: &str) -> Result<ConfigContainer> {
        if config_file.ends_with(".yaml") || config_file.ends_with(".yml") {
            Self::from_yaml(config_file)
        } else {
            Err(HeatStressError::Config(format!(
                "Unsupported config file format: {}",
                config_file
            )))
        }
    }

    pub fn from_yaml(config_file: &str) -> Result<Self> {
        let mut file =
            File::open(config_file).map_err(|err| HeatStressError::io(Path::new(config_file), err))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|err| HeatStressError::io(Path::new(config_file), err))?;

        Self::from_yaml_str(&contents)
            .map_err(|err| HeatStressError::Config(format!("{}: {}", config_file, err)))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let conf: ConfigContainer = serde_yaml::from_str(contents)
            .map_err(|err| HeatStressError::Config(format!("Cannot parse config: {}", err)))?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(HeatStressError::Config("no stages to run".into()));
        }
        if self.workers == Some(0) {
            return Err(HeatStressError::Config("workers must be at least 1".into()));
        }
        for stage in &self.stages {
            stage.validate()?;
        }
        Ok(())
    }
}
