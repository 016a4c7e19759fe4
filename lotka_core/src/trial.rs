//! One unit of integration work.

use crate::accuracy::SimulationAccuracy;
use crate::ecosystem::NetworkSettings;
use crate::matrix::EcosystemPopulations;
use lotka_env::SeriesId;
use std::sync::Arc;

/// An ecosystem paired with one accuracy variant.
///
/// Many trials share one network, so populations and settings are held
/// behind `Arc` and never mutated.
#[derive(Debug, Clone)]
pub struct Trial {
    /// Series this trial was generated in
    pub series: SeriesId,
    /// Position within the series (networks outer, accuracy variants inner)
    pub index: usize,
    /// Which generated network of the series this trial integrates
    pub network: usize,
    pub populations: Arc<EcosystemPopulations>,
    pub accuracy: SimulationAccuracy,
    /// Sampled network settings; `None` for hand-written ecosystems
    pub settings: Option<Arc<NetworkSettings>>,
}

impl Trial {
    /// Creates a trial for a hand-written ecosystem.
    pub fn standalone(populations: EcosystemPopulations, accuracy: SimulationAccuracy) -> Self {
        Self {
            series: SeriesId::new(0, 0),
            index: 0,
            network: 0,
            populations: Arc::new(populations),
            accuracy,
            settings: None,
        }
    }

    /// Stable label, e.g. `0001ep-0003s-0012t`.
    pub fn label(&self) -> String {
        self.series.trial_label(self.index)
    }
}
