//! Configured value generators.
//!
//! A [`Factor`] is either a constant or a uniform range. Ecosystem settings
//! hold factors and sample them once per generated network, so a sweep can
//! pin some parameters while spreading others.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A value that is either fixed or drawn uniformly from a range.
///
/// In TOML a constant is written as a bare value (`species_count = 20`) and a
/// range as a table (`species_count = { min = 10, max = 625 }`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Factor<T> {
    Constant(T),
    Range { min: T, max: T },
}

/// Scalar types a [`Factor`] can sample.
pub trait FactorValue: Copy + PartialOrd {
    /// Draws a value in the range spanned by `lo..hi` (`lo <= hi`).
    fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self;
}

impl FactorValue for f64 {
    /// Half-open `[lo, hi)`; a degenerate range returns `lo`.
    fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self {
        lo + rng.gen::<f64>() * (hi - lo)
    }
}

impl FactorValue for usize {
    /// Inclusive `[lo, hi]`.
    fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: Self, hi: Self) -> Self {
        rng.gen_range(lo..=hi)
    }
}

impl<T: FactorValue> Factor<T> {
    /// Creates a uniform range factor.
    pub fn range(min: T, max: T) -> Self {
        Self::Range { min, max }
    }

    /// Returns `(lower, upper)`, ordered even if the range was written
    /// backwards.
    pub fn bounds(&self) -> (T, T) {
        match *self {
            Self::Constant(v) => (v, v),
            Self::Range { min, max } if max < min => (max, min),
            Self::Range { min, max } => (min, max),
        }
    }

    /// Draws one value. Constants consume no randomness.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        match *self {
            Self::Constant(v) => v,
            Self::Range { .. } => {
                let (lo, hi) = self.bounds();
                T::sample_between(rng, lo, hi)
            }
        }
    }
}

impl<T> From<T> for Factor<T> {
    fn from(value: T) -> Self {
        Self::Constant(value)
    }
}
