//! Error types for the seed hierarchy.

use thiserror::Error;

/// Errors raised while constructing seeds.
///
/// Derivation itself never fails; only malformed seed material does.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Raw seed material had the wrong width
    #[error("Seed must be {expected} bytes, got {actual}")]
    SeedLength { expected: usize, actual: usize },

    /// Seed text could not be parsed as a UUID
    #[error("Invalid seed '{0}': expected a UUID such as 09c158c3-18f3-40a4-80fe-2b855bff538f")]
    InvalidSeed(String),
}

impl EnvError {
    /// Creates a seed length error.
    pub fn seed_length(expected: usize, actual: usize) -> Self {
        Self::SeedLength { expected, actual }
    }

    /// Creates a parse error for seed text.
    pub fn invalid_seed(text: impl Into<String>) -> Self {
        Self::InvalidSeed(text.into())
    }
}
