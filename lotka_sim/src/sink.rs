//! Result sinks.
//!
//! The scheduler hands every finished trial to a [`TrialSink`]. Sinks are
//! shared across worker threads and must serialize their own writes.

use crate::error::SinkError;
use lotka_core::{Generations, IntegrationOutcome, NetworkSettings, SimulationAccuracy, Trial, TrialAnalysis};
use lotka_env::SeriesId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Everything recorded about one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// e.g. `0001ep-0003s-0012t`
    pub label: String,
    pub series: SeriesId,
    pub trial_index: usize,
    pub network: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<NetworkSettings>,
    pub accuracy: SimulationAccuracy,
    pub initial_populations: Vec<f64>,
    pub growth_rates: Vec<f64>,
    /// Row-major coefficient matrix
    pub coefficients: Vec<Vec<f64>>,
    pub outcome: IntegrationOutcome,
    /// One row per species, one column per coarse step; omitted when the
    /// run is configured to drop them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generations: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TrialAnalysis>,
}

impl TrialRecord {
    /// Builds the record for a finished trial.
    pub fn new(trial: &Trial, generations: &Generations, include_generations: bool) -> Self {
        let populations = &trial.populations;
        Self {
            label: trial.label(),
            series: trial.series,
            trial_index: trial.index,
            network: trial.network,
            settings: trial.settings.as_deref().cloned(),
            accuracy: trial.accuracy,
            initial_populations: populations.initial_populations.iter().copied().collect(),
            growth_rates: populations.growth_rates.iter().copied().collect(),
            coefficients: populations.coefficient_rows(),
            outcome: generations.outcome(),
            generations: include_generations.then(|| generations.rows()),
            analysis: TrialAnalysis::from_generations(generations, populations),
        }
    }
}

/// Destination for finished trials.
///
/// `record` returning [`SinkError::Terminate`] stops the whole run; any
/// other error only skips that record.
pub trait TrialSink: Send + Sync {
    fn record(&self, record: TrialRecord) -> Result<(), SinkError>;

    /// Called once after all workers finish.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl JsonLinesSink {
    /// Wraps any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(Box::new(writer))),
        }
    }

    /// Creates (or truncates) a file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl TrialSink for JsonLinesSink {
    fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
        let line = serde_json::to_vec(&record)?;
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<TrialRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records collected so far.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the collected records, sorted by label.
    pub fn into_records(self) -> Vec<TrialRecord> {
        let mut records = self
            .records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.sort_by(|a, b| a.label.cmp(&b.label));
        records
    }
}

impl TrialSink for MemorySink {
    fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(record);
        Ok(())
    }
}
