//! Sweep and single-ecosystem configuration.
//!
//! Both load from TOML. Every field has a default, so a file only needs the
//! values it changes:
//!
//! ```toml
//! epochs = 2
//! iterations = 5
//! threads = 4
//!
//! [ecosystem.topology]
//! kind = "power_law_cluster"
//! species_count = { min = 10, max = 40 }
//!
//! [accuracy]
//! variants_per_setting = 2
//! max_time = 20.0
//! ```

use crate::error::ConfigError;
use lotka_core::{AccuracySweep, EcosystemConfig, EcosystemPopulations, SimulationAccuracy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Configuration of a full sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Master seed; generated (and logged) when absent
    pub master_seed: Option<Uuid>,

    /// Number of epochs
    pub epochs: u64,

    /// Iterations per epoch
    pub iterations: u64,

    /// Worker threads
    pub threads: usize,

    /// Network generation
    pub ecosystem: EcosystemConfig,

    /// Accuracy variants per network
    pub accuracy: AccuracySweep,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            master_seed: None,
            epochs: 3,
            iterations: 10,
            threads: 1,
            ecosystem: EcosystemConfig::default(),
            accuracy: AccuracySweep::default(),
        }
    }
}

impl SweepConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Sets the master seed.
    pub fn with_seed(mut self, seed: Uuid) -> Self {
        self.master_seed = Some(seed);
        self
    }

    /// Sets the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the epoch count.
    pub fn with_epochs(mut self, epochs: u64) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the iterations per epoch.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Checks every setting before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epochs == 0 {
            return Err(ConfigError::Zero("epochs"));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Zero("iterations"));
        }
        if self.threads == 0 {
            return Err(ConfigError::Zero("threads"));
        }
        self.ecosystem.validate()?;
        self.accuracy.validate()?;
        Ok(())
    }

    /// Number of (epoch, iteration) positions.
    pub fn total_positions(&self) -> u64 {
        self.epochs * self.iterations
    }

    /// Trials generated per position.
    pub fn trials_per_position(&self) -> usize {
        self.ecosystem.networks_per_iteration * self.accuracy.cardinality()
    }
}

/// A single hand-written ecosystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateConfig {
    pub initial_populations: Vec<f64>,
    pub growth_rates: Vec<f64>,
    /// Row-major; `coefficients[i][j]` is the effect of `j` on `i`
    pub coefficients: Vec<Vec<f64>>,
    #[serde(default)]
    pub accuracy: SimulationAccuracy,
}

impl SimulateConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates and builds the dense ecosystem.
    pub fn populations(&self) -> Result<EcosystemPopulations, ConfigError> {
        self.accuracy.validate()?;
        Ok(EcosystemPopulations::new(
            self.initial_populations.clone(),
            self.growth_rates.clone(),
            self.coefficients.clone(),
        )?)
    }
}
