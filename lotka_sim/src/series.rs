//! Trial construction for one (epoch, iteration) series.

use crate::config::SweepConfig;
use crate::error::SeriesError;
use lotka_core::{EcosystemGenerator, EcosystemPopulations, Trial};
use lotka_env::{Seed, SeriesId};
use std::sync::Arc;
use tracing::debug;

/// Builds every trial of a series: each network paired with every accuracy
/// variant, networks outer and variants inner, numbered in that order.
///
/// The series seed is derived from `master` and `id` alone; networks and
/// accuracy variants each draw from their own fresh stream of it. Variants
/// are drawn once, so every network in the series runs under the same set.
pub fn build_series(master: &Seed, id: SeriesId, config: &SweepConfig) -> Result<Vec<Trial>, SeriesError> {
    let mut seed = master.for_series(id);
    let mut network_rng = seed.fresh_random();
    let mut accuracy_rng = seed.fresh_random();

    let networks = EcosystemGenerator::new(&config.ecosystem).generate(&mut network_rng)?;
    let variants = config.accuracy.generate(&mut accuracy_rng)?;
    let mut trials = Vec::with_capacity(config.trials_per_position());

    for (network, generated) in networks.into_iter().enumerate() {
        let populations = Arc::new(EcosystemPopulations::from_graph(&generated.graph)?);
        let settings = Arc::new(generated.settings);

        for &accuracy in &variants {
            trials.push(Trial {
                series: id,
                index: trials.len(),
                network,
                populations: Arc::clone(&populations),
                accuracy,
                settings: Some(Arc::clone(&settings)),
            });
        }
    }

    debug!(series = %id, trials = trials.len(), "Built series");
    Ok(trials)
}
