//! Error types for sweep configuration, result sinks and scheduling.

use lotka_core::{AccuracyError, GenerateError, MatrixError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal and surface before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A count that must be positive is zero
    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("Ecosystem configuration: {0}")]
    Ecosystem(#[from] GenerateError),

    #[error("Accuracy configuration: {0}")]
    Accuracy(#[from] AccuracyError),

    #[error("Ecosystem matrices: {0}")]
    Matrix(#[from] MatrixError),
}

/// Errors raised while building the trials of one series.
///
/// These are per-series faults: the scheduler logs them and moves on.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Accuracy(#[from] AccuracyError),
}

/// Errors returned by a [`TrialSink`](crate::TrialSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink wants the whole run to stop
    #[error("Sink requested termination: {0}")]
    Terminate(String),

    /// This record could not be stored; the run continues
    #[error("Sink fault: {0}")]
    Fault(String),

    #[error("Sink I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// A writer panicked while holding the sink lock
    #[error("Sink lock poisoned")]
    Poisoned,
}

impl SinkError {
    /// Creates a termination request.
    pub fn terminate(reason: impl Into<String>) -> Self {
        Self::Terminate(reason.into())
    }

    /// Creates a per-record fault.
    pub fn fault(reason: impl Into<String>) -> Self {
        Self::Fault(reason.into())
    }
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to flush results: {0}")]
    Flush(#[source] SinkError),
}
