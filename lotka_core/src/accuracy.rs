//! Numeric accuracy settings for a single trial, and the sweep that
//! generates many of them per network.

use crate::error::AccuracyError;
use crate::factor::Factor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Immutable numeric configuration of one integration run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationAccuracy {
    /// Raw Euler step size
    pub euler_step: f64,
    /// Simulated time horizon
    pub max_time: f64,
    /// Populations below this are clamped to zero
    pub extinct_if_below: f64,
    /// Desired spacing of recorded (coarse) samples
    pub target_coarse_step: f64,
}

impl Default for SimulationAccuracy {
    fn default() -> Self {
        Self {
            euler_step: 0.005,
            max_time: 200.0,
            extinct_if_below: 1e-10,
            target_coarse_step: 0.01,
        }
    }
}

impl SimulationAccuracy {
    /// Creates validated settings.
    pub fn new(
        euler_step: f64,
        max_time: f64,
        extinct_if_below: f64,
        target_coarse_step: f64,
    ) -> Result<Self, AccuracyError> {
        let accuracy = Self {
            euler_step,
            max_time,
            extinct_if_below,
            target_coarse_step,
        };
        accuracy.validate()?;
        Ok(accuracy)
    }

    /// Checks that every field is positive and finite.
    pub fn validate(&self) -> Result<(), AccuracyError> {
        for (name, value) in [
            ("euler_step", self.euler_step),
            ("max_time", self.max_time),
            ("extinct_if_below", self.extinct_if_below),
            ("target_coarse_step", self.target_coarse_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AccuracyError::non_positive(name, value));
            }
        }
        Ok(())
    }

    /// Raw steps averaged into one recorded sample, at least 1.
    pub fn steps_in_coarse(&self) -> usize {
        ((self.target_coarse_step / self.euler_step).round() as usize).max(1)
    }

    /// Raw steps needed to cover `max_time`.
    pub fn raw_iterations(&self) -> usize {
        (self.max_time / self.euler_step).ceil() as usize
    }

    /// Recorded samples, including the initial column.
    pub fn coarse_iterations(&self) -> usize {
        (self.max_time / (self.steps_in_coarse() as f64 * self.euler_step)).ceil() as usize
    }

    /// Simulated time between recorded samples.
    pub fn coarse_step(&self) -> f64 {
        self.steps_in_coarse() as f64 * self.euler_step
    }
}

/// Generates accuracy variants for each network.
///
/// Draws `variants_per_setting` Euler steps and as many extinction
/// thresholds, then emits their full cross product with the extinction
/// threshold as the outer loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracySweep {
    pub euler_step: Factor<f64>,
    pub extinct_if_below: Factor<f64>,
    pub max_time: f64,
    pub target_coarse_step: f64,
    /// Values drawn per varied field (cross product has this squared)
    pub variants_per_setting: usize,
}

impl Default for AccuracySweep {
    fn default() -> Self {
        Self {
            euler_step: Factor::range(0.0005, 0.01),
            extinct_if_below: Factor::range(1e-12, 1e-8),
            max_time: 200.0,
            target_coarse_step: 0.01,
            variants_per_setting: 10,
        }
    }
}

impl AccuracySweep {
    /// Number of variants `generate` returns.
    pub fn cardinality(&self) -> usize {
        self.variants_per_setting * self.variants_per_setting
    }

    /// Checks the sweep can only produce valid settings.
    pub fn validate(&self) -> Result<(), AccuracyError> {
        if self.variants_per_setting == 0 {
            return Err(AccuracyError::ZeroCardinality);
        }
        let (euler_lo, _) = self.euler_step.bounds();
        let (extinct_lo, _) = self.extinct_if_below.bounds();
        SimulationAccuracy {
            euler_step: euler_lo,
            max_time: self.max_time,
            extinct_if_below: extinct_lo,
            target_coarse_step: self.target_coarse_step,
        }
        .validate()
    }

    /// Draws the variants for one network.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<SimulationAccuracy>, AccuracyError> {
        self.validate()?;
        let euler_steps: Vec<f64> = (0..self.variants_per_setting)
            .map(|_| self.euler_step.sample(rng))
            .collect();
        let thresholds: Vec<f64> = (0..self.variants_per_setting)
            .map(|_| self.extinct_if_below.sample(rng))
            .collect();

        let mut variants = Vec::with_capacity(self.cardinality());
        for &extinct_if_below in &thresholds {
            for &euler_step in &euler_steps {
                variants.push(SimulationAccuracy::new(
                    euler_step,
                    self.max_time,
                    extinct_if_below,
                    self.target_coarse_step,
                )?);
            }
        }
        Ok(variants)
    }
}
