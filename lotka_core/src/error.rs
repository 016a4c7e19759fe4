//! Error types for ecosystem generation, matrix flattening and accuracy
//! settings.
//!
//! Divergence during integration is an outcome, not an error, and has no
//! variant here.

use thiserror::Error;

/// Errors raised while generating ecosystem graphs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    /// A topology needs at least two species to hold an interaction
    #[error("Species count must be at least 2, got {0}")]
    SpeciesCount(usize),

    /// A sampled or configured parameter is outside its domain
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Zero networks requested per iteration
    #[error("At least one network per iteration is required")]
    ZeroNetworks,
}

impl GenerateError {
    /// Creates an invalid parameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors raised while flattening a graph (or raw vectors) into
/// [`EcosystemPopulations`](crate::EcosystemPopulations).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatrixError {
    /// A species has no self-edge, so its growth rate is unknown
    #[error("Species {species} has no self-edge (growth rate)")]
    MissingSelfEdge { species: usize },

    /// An interaction references a species outside the graph
    #[error("Interaction {from}->{to} references a species outside 0..{species_count}")]
    SpeciesOutOfRange {
        from: usize,
        to: usize,
        species_count: usize,
    },

    /// Vector or matrix dimensions disagree
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The ecosystem has no species
    #[error("Ecosystem has no species")]
    Empty,
}

impl MatrixError {
    /// Creates a shape mismatch error.
    pub fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}

/// Errors raised while building simulation accuracy settings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccuracyError {
    /// A step, horizon or threshold is zero, negative or not finite
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// The sweep would produce no accuracy variants
    #[error("Accuracy sweep needs at least one variant per setting")]
    ZeroCardinality,
}

impl AccuracyError {
    /// Creates a non-positive value error.
    pub fn non_positive(name: &'static str, value: f64) -> Self {
        Self::NonPositive { name, value }
    }
}
