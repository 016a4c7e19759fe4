//! Per-trial summary statistics.
//!
//! Computed from a finished [`Generations`] matrix and the coefficients that
//! produced it:
//! - **Survival time**: how long each species stayed above zero
//! - **Survivors**: species still alive in the last recorded column
//! - **Coefficient rows**: spread of each species' non-zero incoming
//!   interaction weights, signed and by magnitude
//!
//! Diverged trials carry sentinel cells and are not analyzed.

use crate::integrator::Generations;
use crate::matrix::EcosystemPopulations;
use serde::{Deserialize, Serialize};

/// Summary of a list of values. All fields are zero for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RowStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub median: f64,
}

impl RowStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            count,
            sum,
            mean,
            std: variance.sqrt(),
            median,
        }
    }
}

/// Statistics over one coefficient row's non-zero entries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoefficientStats {
    pub signed: RowStats,
    /// Same entries, absolute values
    pub magnitude: RowStats,
}

/// Summary of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialAnalysis {
    /// Simulated time each species spent above zero
    pub survival_time: Vec<f64>,
    /// Species alive in the last column
    pub survivors: usize,
    /// One entry per species (row of the coefficient matrix)
    pub coefficients: Vec<CoefficientStats>,
}

impl TrialAnalysis {
    /// Analyzes a trial, or returns `None` if it diverged.
    pub fn from_generations(generations: &Generations, populations: &EcosystemPopulations) -> Option<Self> {
        if generations.is_diverged() {
            return None;
        }
        let matrix = generations.matrix();

        let survival_time = matrix
            .row_iter()
            .map(|row| row.iter().filter(|&&p| p != 0.0).count() as f64 * generations.coarse_step())
            .collect();
        let survivors = generations
            .final_populations()
            .iter()
            .filter(|&&p| p > 0.0)
            .count();

        let coefficients = populations
            .coefficients
            .row_iter()
            .map(|row| {
                let signed: Vec<f64> = row.iter().copied().filter(|&c| c != 0.0).collect();
                let magnitude: Vec<f64> = signed.iter().map(|c| c.abs()).collect();
                CoefficientStats {
                    signed: RowStats::from_values(&signed),
                    magnitude: RowStats::from_values(&magnitude),
                }
            })
            .collect();

        Some(Self {
            survival_time,
            survivors,
            coefficients,
        })
    }
}
