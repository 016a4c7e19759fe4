//! Common types for the seed hierarchy.

use serde::{Deserialize, Serialize};

/// Identifies one scheduler work unit: an `(epoch, iteration)` pair.
///
/// Every series gets its own child seed, so two series never share a
/// random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId {
    pub epoch: u64,
    pub iteration: u64,
}

impl SeriesId {
    /// Creates a series id.
    pub fn new(epoch: u64, iteration: u64) -> Self {
        Self { epoch, iteration }
    }

    /// Big-endian context parts fed into child seed derivation.
    pub fn context_bytes(&self) -> [[u8; 8]; 2] {
        [self.epoch.to_be_bytes(), self.iteration.to_be_bytes()]
    }

    /// Stable label for one trial of this series, e.g. `0001ep-0003s-0012t`.
    pub fn trial_label(&self, trial_index: usize) -> String {
        format!("{}-{:04}t", self, trial_index)
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}ep-{:04}s", self.epoch, self.iteration)
    }
}
