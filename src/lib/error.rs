use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a single unit of work (one year, one climatology).
#[derive(Error, Debug)]
pub enum HeatStressError {
    /// humidity/temperature inputs disagree, or a year has nothing to process
    #[error("input mismatch for year {year}: {detail}")]
    InputMismatch { year: i32, detail: String },

    /// a grid lacks georeferencing or does not match its siblings
    #[error("metadata error in {}: {detail}", path.display())]
    Metadata { path: PathBuf, detail: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// encoder/decoder failure while reading or writing a raster
    #[error("raster error on {}: {detail}", path.display())]
    Raster { path: PathBuf, detail: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

impl HeatStressError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        HeatStressError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn raster(path: impl AsRef<Path>, detail: impl ToString) -> Self {
        HeatStressError::Raster {
            path: path.as_ref().to_path_buf(),
            detail: detail.to_string(),
        }
    }

    pub fn metadata(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        HeatStressError::Metadata {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn mismatch(year: i32, detail: impl Into<String>) -> Self {
        HeatStressError::InputMismatch {
            year,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HeatStressError>;
