use std::fmt::Display;

use heatstress::error::HeatStressError;
use heatstress::models::config::{ClimatologyConfig, CountConfig, IndexConfig};
use heatstress::parallel::FanOutReport;
use log::{info, warn};

use crate::common::config::builder::StageConfig;

/// One fan-out of the run, in run-file order
#[derive(Debug)]
pub enum Step<'a> {
    IndexComputer(&'a IndexConfig),
    ThresholdCounter(&'a CountConfig),
    /// neighbouring climatology entries share one fan-out
    Climatologies(Vec<ClimatologyConfig>),
}

impl Step<'_> {
    pub fn get_stage_name(&self) -> &'static str {
        match self {
            Step::IndexComputer(_) => "IndexComputer",
            Step::ThresholdCounter(_) => "ThresholdCounter",
            Step::Climatologies(_) => "Climatology",
        }
    }
}

pub fn plan_steps(stages: &[StageConfig]) -> Vec<Step<'_>> {
    let mut steps: Vec<Step> = Vec::with_capacity(stages.len());
    for stage in stages {
        match stage {
            StageConfig::IndexComputer(config) => steps.push(Step::IndexComputer(config)),
            StageConfig::ThresholdCounter(config) => steps.push(Step::ThresholdCounter(config)),
            StageConfig::Climatology(config) => match steps.last_mut() {
                Some(Step::Climatologies(windows)) => windows.push(config.clone()),
                _ => steps.push(Step::Climatologies(vec![config.clone()])),
            },
        }
    }
    steps
}

/// Failures collected over all the stages of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    failures: Vec<String>,
}

impl RunSummary {
    pub fn record<K: Clone + Display, T>(&mut self, stage: &str, report: &FanOutReport<K, T>) {
        report.log_summary(stage);
        for (unit, err) in &report.failed {
            self.failures.push(format!("{stage} {unit}: {err}"));
        }
    }

    /// The stage could not start at all
    pub fn record_error(&mut self, stage: &str, err: &HeatStressError) {
        warn!("[{stage}] not run: {err}");
        self.failures.push(format!("{stage}: {err}"));
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn log(&self) {
        if self.is_success() {
            info!("All stages completed");
            return;
        }
        warn!("{} failure(s):", self.failures.len());
        for failure in &self.failures {
            warn!("  {failure}");
        }
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
