//! Fixed-size worker pool running independent units of work (one year, one climatology)
//!
//! Every unit gets its own `Result`; a failing or panicking unit is recorded and never
//! stops its siblings.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use log::{info, trace, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{HeatStressError, Result};

/// Configuration for parallel processing
#[derive(Debug, Clone, Copy)]
pub struct ParallelConfig {
    pub workers: usize,
}

impl ParallelConfig {
    /// `None` uses every logical CPU
    pub fn new(workers: Option<usize>) -> Self {
        Self {
            workers: workers.unwrap_or_else(num_cpus::get).max(1),
        }
    }

    pub fn build_pool(&self) -> Result<ThreadPool> {
        ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("heatstress-worker-{idx}"))
            .build()
            .map_err(|err| {
                HeatStressError::ThreadPool(format!(
                    "failed to start {} workers: {err}",
                    self.workers
                ))
            })
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Outcome of a fan-out, in the order the units were given
#[derive(Debug)]
pub struct FanOutReport<K, T> {
    pub succeeded: Vec<(K, T)>,
    pub failed: Vec<(K, HeatStressError)>,
}

impl<K: Clone + Display, T> FanOutReport<K, T> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_units(&self) -> Vec<K> {
        self.failed.iter().map(|(unit, _)| unit.clone()).collect()
    }

    pub fn log_summary(&self, stage: &str) {
        info!(
            "[{stage}] {} unit(s) done, {} failed",
            self.succeeded.len(),
            self.failed.len()
        );
        for (unit, err) in &self.failed {
            warn!("[{stage}] {unit} failed: {err}");
        }
        if !self.failed.is_empty() {
            let units: Vec<String> = self.failed.iter().map(|(u, _)| u.to_string()).collect();
            warn!("[{stage}] failed units: {}", units.join(", "));
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `work` once per unit on the pool and collect every outcome
pub fn fan_out<K, T, F>(pool: &ThreadPool, units: &[K], work: F) -> FanOutReport<K, T>
where
    K: Clone + Display + Send + Sync,
    T: Send,
    F: Fn(&K) -> Result<T> + Sync,
{
    let start = Utc::now();
    let outcomes: Vec<(K, Result<T>)> = pool.install(|| {
        units
            .par_iter()
            .map(|unit| {
                let outcome = catch_unwind(AssertUnwindSafe(|| work(unit)))
                    .unwrap_or_else(|payload| Err(HeatStressError::WorkerPanic(panic_message(payload))));
                (unit.clone(), outcome)
            })
            .collect()
    });
    trace!("Fan-out of {} unit(s) took {}", units.len(), Utc::now() - start);

    let mut report = FanOutReport {
        succeeded: Vec::with_capacity(outcomes.len()),
        failed: Vec::new(),
    };
    for (unit, outcome) in outcomes {
        match outcome {
            Ok(value) => report.succeeded.push((unit, value)),
            Err(err) => report.failed.push((unit, err)),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn failing_unit_does_not_stop_siblings() {
        let dir = tempdir().expect("temp dir");
        let pool = ParallelConfig::new(Some(3)).build_pool().unwrap();
        let years: Vec<i32> = (2000..2008).collect();

        let report = fan_out(&pool, &years, |&year| {
            if year == 2004 {
                return Err(HeatStressError::mismatch(year, "no RHx files"));
            }
            let path = dir.path().join(format!("{year}.txt"));
            fs::write(&path, year.to_string()).map_err(|err| HeatStressError::io(&path, err))?;
            Ok(year * 2)
        });

        assert!(!report.is_success());
        assert_eq!(report.failed_units(), vec![2004]);
        assert_eq!(report.succeeded.len(), 7);
        for (year, doubled) in &report.succeeded {
            assert_eq!(*doubled, year * 2);
            let written = fs::read_to_string(dir.path().join(format!("{year}.txt"))).unwrap();
            assert_eq!(written, year.to_string());
        }
        assert!(!dir.path().join("2004.txt").exists());
        report.log_summary("test");
    }

    #[test]
    fn panicking_unit_is_reported() {
        let pool = ParallelConfig::new(Some(2)).build_pool().unwrap();
        let units = vec![1, 2, 3];
        let report = fan_out(&pool, &units, |&unit| {
            if unit == 2 {
                panic!("boom in unit {unit}");
            }
            Ok(unit)
        });
        assert_eq!(report.failed_units(), vec![2]);
        match &report.failed[0].1 {
            HeatStressError::WorkerPanic(msg) => assert!(msg.contains("boom in unit 2")),
            other => panic!("unexpected error {other}"),
        }
        let ok: Vec<i32> = report.succeeded.iter().map(|(u, _)| *u).collect();
        assert_eq!(ok, vec![1, 3]);
    }

    #[test]
    fn worker_count_defaults_to_cpus() {
        assert!(ParallelConfig::default().workers >= 1);
        assert_eq!(ParallelConfig::new(Some(0)).workers, 1);
    }
}
