//! Randomized ecosystem generation.
//!
//! A network is built in two phases. First an immutable [`Topology`] decides
//! which species pairs interact. Then a weight pass assigns every directed
//! interaction a signed coefficient and every species a population and a
//! growth rate consistent with its role as a net predator or net prey.
//!
//! All randomness comes from the single stream handed to
//! [`EcosystemGenerator::generate`], consumed in a fixed order, so the same
//! stream always yields the same networks.

use crate::error::GenerateError;
use crate::factor::Factor;
use crate::topology::Topology;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound on Gaussian redraws while looking for a growth rate whose sign
/// matches its mean.
pub const MAX_SIGN_DRAWS: usize = 256;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which base topology to generate, with factors for its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Holme-Kim power-law cluster graph
    PowerLawCluster {
        /// Number of species
        species_count: Factor<usize>,
        /// Attachment edges per node as a fraction of `species_count`
        connection_m_perc: Factor<f64>,
        /// Probability of closing a triangle after each attachment
        connection_p: Factor<f64>,
    },
    /// Kleinberg navigable small-world lattice
    SmallWorld {
        /// Lattice dimension
        dim: Factor<usize>,
        /// Nodes per lattice side
        side_length: Factor<usize>,
    },
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::PowerLawCluster {
            species_count: Factor::range(10, 625),
            connection_m_perc: Factor::range(0.0, 1.0),
            connection_p: Factor::range(0.0, 1.0),
        }
    }
}

/// Factors for interaction weights, populations and growth-rate bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Probability that the first direction of a pair is the predator role
    pub percent_predator: Factor<f64>,
    /// Initial population of each species
    pub population: Factor<f64>,
    /// Most negative growth rate (bound for net predators)
    pub min_growth_rate: Factor<f64>,
    /// Most positive growth rate (bound for net prey)
    pub max_growth_rate: Factor<f64>,
    /// Probability that both directions of a pair are positive
    pub symbiotic_percent: f64,
    /// Probability that both directions of a pair are negative
    pub competitive_percent: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            percent_predator: Factor::Constant(0.8),
            population: Factor::range(4.0, 20.0),
            min_growth_rate: Factor::range(-0.05, -0.015),
            max_growth_rate: Factor::range(0.015, 0.05),
            symbiotic_percent: 0.0,
            competitive_percent: 0.0,
        }
    }
}

impl WeightConfig {
    fn validate(&self) -> Result<(), GenerateError> {
        let (lo, hi) = self.percent_predator.bounds();
        if lo < 0.0 || hi > 1.0 {
            return Err(GenerateError::invalid(
                "percent_predator",
                format!("range [{lo}, {hi}] outside [0, 1]"),
            ));
        }
        let (lo, _) = self.population.bounds();
        if lo <= 0.0 {
            return Err(GenerateError::invalid(
                "population",
                format!("populations must be positive, lower bound is {lo}"),
            ));
        }
        let (_, hi) = self.min_growth_rate.bounds();
        if hi > 0.0 {
            return Err(GenerateError::invalid(
                "min_growth_rate",
                format!("must not be positive, upper bound is {hi}"),
            ));
        }
        let (lo, _) = self.max_growth_rate.bounds();
        if lo < 0.0 {
            return Err(GenerateError::invalid(
                "max_growth_rate",
                format!("must not be negative, lower bound is {lo}"),
            ));
        }
        for (name, value) in [
            ("symbiotic_percent", self.symbiotic_percent),
            ("competitive_percent", self.competitive_percent),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GenerateError::invalid(name, format!("{value} outside [0, 1]")));
            }
        }
        if self.symbiotic_percent + self.competitive_percent > 1.0 {
            return Err(GenerateError::invalid(
                "symbiotic_percent",
                "symbiotic_percent + competitive_percent exceeds 1",
            ));
        }
        Ok(())
    }
}

/// Everything needed to generate the networks of one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Networks generated per (epoch, iteration)
    pub networks_per_iteration: usize,
    /// Base topology
    pub topology: TopologyConfig,
    /// Weight and population factors
    pub weights: WeightConfig,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            networks_per_iteration: 1,
            topology: TopologyConfig::default(),
            weights: WeightConfig::default(),
        }
    }
}

impl EcosystemConfig {
    /// Checks factor domains without drawing anything.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.networks_per_iteration == 0 {
            return Err(GenerateError::ZeroNetworks);
        }
        match &self.topology {
            TopologyConfig::PowerLawCluster {
                species_count,
                connection_m_perc,
                connection_p,
            } => {
                let (lo, _) = species_count.bounds();
                if lo < 2 {
                    return Err(GenerateError::SpeciesCount(lo));
                }
                let (lo, hi) = connection_m_perc.bounds();
                if lo < 0.0 || hi > 1.0 {
                    return Err(GenerateError::invalid(
                        "connection_m_perc",
                        format!("range [{lo}, {hi}] outside [0, 1]"),
                    ));
                }
                let (lo, hi) = connection_p.bounds();
                if lo < 0.0 || hi > 1.0 {
                    return Err(GenerateError::invalid(
                        "connection_p",
                        format!("range [{lo}, {hi}] outside [0, 1]"),
                    ));
                }
            }
            TopologyConfig::SmallWorld { dim, side_length } => {
                let (dim_lo, _) = dim.bounds();
                let (side_lo, _) = side_length.bounds();
                if dim_lo == 0 {
                    return Err(GenerateError::invalid("dim", "lattice needs at least one dimension"));
                }
                if side_lo < 2 {
                    return Err(GenerateError::SpeciesCount(side_lo));
                }
            }
        }
        self.weights.validate()
    }
}

// ============================================================================
// SAMPLED SETTINGS
// ============================================================================

/// Topology parameters actually used for one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySettings {
    PowerLawCluster {
        species_count: usize,
        connection_m_perc: f64,
        /// Attachment edges per node after clamping
        connection_m: usize,
        connection_p: f64,
    },
    SmallWorld {
        dim: usize,
        side_length: usize,
    },
}

/// Concrete settings sampled for one network, kept alongside the graph so
/// results can be correlated with their inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub topology: TopologySettings,
    pub species_count: usize,
    pub percent_predator: f64,
    pub min_growth_rate: f64,
    pub max_growth_rate: f64,
    /// Population factor nodes were drawn from
    pub population: Factor<f64>,
    pub symbiotic_percent: f64,
    pub competitive_percent: f64,
}

// ============================================================================
// GRAPH
// ============================================================================

/// One species: its initial population and self-edge weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesNode {
    /// Initial population (positive)
    pub population: f64,
    /// Self-edge weight; positive for net growers, negative for net decliners
    pub growth_rate: Option<f64>,
}

/// Directed interaction: effect of `source`'s population on `target`'s
/// growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Weighted ecosystem graph, species indexed by position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EcosystemGraph {
    pub nodes: Vec<SpeciesNode>,
    /// Interactions in ascending `(source, target)` order
    pub interactions: Vec<Interaction>,
}

impl EcosystemGraph {
    /// Number of species.
    pub fn species_count(&self) -> usize {
        self.nodes.len()
    }

    /// Weight of `source -> target`, if that interaction exists.
    pub fn weight(&self, source: usize, target: usize) -> Option<f64> {
        self.interactions
            .binary_search_by(|i| (i.source, i.target).cmp(&(source, target)))
            .ok()
            .map(|pos| self.interactions[pos].weight)
    }

    /// Whether every interaction has its reverse.
    pub fn is_pair_symmetric(&self) -> bool {
        self.interactions
            .iter()
            .all(|i| self.weight(i.target, i.source).is_some())
    }
}

/// A generated graph together with the settings that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNetwork {
    pub graph: EcosystemGraph,
    pub settings: NetworkSettings,
}

// ============================================================================
// GENERATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Source preys on target; non-positive weight
    Predator,
    /// Source feeds target; non-negative weight
    Prey,
}

/// Generates weighted ecosystem graphs from an [`EcosystemConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EcosystemGenerator<'a> {
    config: &'a EcosystemConfig,
}

impl<'a> EcosystemGenerator<'a> {
    /// Creates a generator over a configuration.
    pub fn new(config: &'a EcosystemConfig) -> Self {
        Self { config }
    }

    /// Generates `networks_per_iteration` networks from one stream.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<GeneratedNetwork>, GenerateError> {
        self.config.validate()?;
        (0..self.config.networks_per_iteration)
            .map(|_| self.generate_one(rng))
            .collect()
    }

    /// Generates a single network.
    pub fn generate_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GeneratedNetwork, GenerateError> {
        let (settings, topology) = self.sample_topology(rng)?;
        let graph = assign_weights(rng, &topology, &settings);
        debug!(
            species = settings.species_count,
            interactions = graph.interactions.len(),
            "Generated network"
        );
        Ok(GeneratedNetwork { graph, settings })
    }

    fn sample_topology<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(NetworkSettings, Topology), GenerateError> {
        let (topology_settings, topology) = match &self.config.topology {
            TopologyConfig::PowerLawCluster {
                species_count,
                connection_m_perc,
                connection_p,
            } => {
                let n = species_count.sample(rng);
                if n < 2 {
                    return Err(GenerateError::SpeciesCount(n));
                }
                let m_perc = connection_m_perc.sample(rng);
                let p = connection_p.sample(rng);
                let m = ((m_perc * n as f64) as usize + 1).min(n - 1);
                let topology = Topology::power_law_cluster(rng, n, m, p)?;
                let settings = TopologySettings::PowerLawCluster {
                    species_count: n,
                    connection_m_perc: m_perc,
                    connection_m: m,
                    connection_p: p,
                };
                (settings, topology)
            }
            TopologyConfig::SmallWorld { dim, side_length } => {
                let dim = dim.sample(rng);
                let side_length = side_length.sample(rng);
                let topology = Topology::navigable_small_world(rng, dim, side_length)?;
                (TopologySettings::SmallWorld { dim, side_length }, topology)
            }
        };

        let weights = &self.config.weights;
        let settings = NetworkSettings {
            topology: topology_settings,
            species_count: topology.species_count(),
            percent_predator: weights.percent_predator.sample(rng),
            min_growth_rate: weights.min_growth_rate.sample(rng),
            max_growth_rate: weights.max_growth_rate.sample(rng),
            population: weights.population,
            symbiotic_percent: weights.symbiotic_percent,
            competitive_percent: weights.competitive_percent,
        };
        Ok((settings, topology))
    }
}

/// Weight pass over a fixed topology.
fn assign_weights<R: Rng + ?Sized>(
    rng: &mut R,
    topology: &Topology,
    settings: &NetworkSettings,
) -> EcosystemGraph {
    let n = topology.species_count();

    let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (source, target) in topology.edges() {
        let role = match weights.get(&(target, source)) {
            Some(&reverse) => second_direction_role(rng, reverse, settings),
            None if rng.gen::<f64>() < settings.percent_predator => Role::Predator,
            None => Role::Prey,
        };
        let u: f64 = rng.gen();
        let weight = match role {
            Role::Predator => u * settings.min_growth_rate,
            Role::Prey => u * settings.max_growth_rate,
        };
        weights.insert((source, target), weight);
    }

    // Incoming aggregates per target.
    let mut predatorness = vec![0.0; n];
    let mut preyness = vec![0.0; n];
    for (&(_, target), &weight) in &weights {
        if weight > 0.0 {
            predatorness[target] += weight;
        } else {
            preyness[target] -= weight;
        }
    }
    let max_predator = predatorness
        .iter()
        .zip(&preyness)
        .map(|(pred, prey)| pred - prey)
        .fold(0.0_f64, f64::max);
    let max_prey = predatorness
        .iter()
        .zip(&preyness)
        .map(|(pred, prey)| prey - pred)
        .fold(0.0_f64, f64::max);

    let nodes = (0..n)
        .map(|i| {
            let population = settings.population.sample(rng);
            let growth_rate = growth_rate(
                rng,
                predatorness[i],
                preyness[i],
                max_predator,
                max_prey,
                settings,
            );
            SpeciesNode {
                population,
                growth_rate: Some(growth_rate),
            }
        })
        .collect();

    let interactions = weights
        .into_iter()
        .map(|((source, target), weight)| Interaction {
            source,
            target,
            weight,
        })
        .collect();

    EcosystemGraph {
        nodes,
        interactions,
    }
}

/// Role of the second direction of a pair, given the first direction's
/// weight.
fn second_direction_role<R: Rng + ?Sized>(rng: &mut R, reverse: f64, settings: &NetworkSettings) -> Role {
    let opposite = if reverse > 0.0 { Role::Predator } else { Role::Prey };
    if settings.symbiotic_percent + settings.competitive_percent <= 0.0 {
        return opposite;
    }
    let roll: f64 = rng.gen();
    if roll < settings.symbiotic_percent {
        Role::Prey
    } else if roll < settings.symbiotic_percent + settings.competitive_percent {
        Role::Predator
    } else {
        opposite
    }
}

/// Growth rate for one species from its incoming aggregates.
///
/// Net predators (more positive inflow) decline on their own and get a
/// negative rate scaled towards `min_growth_rate`; net prey grow and get a
/// positive rate scaled towards `max_growth_rate`.
fn growth_rate<R: Rng + ?Sized>(
    rng: &mut R,
    predatorness: f64,
    preyness: f64,
    max_predator: f64,
    max_prey: f64,
    settings: &NetworkSettings,
) -> f64 {
    if predatorness == 0.0 && preyness == 0.0 {
        return 0.0;
    }

    let mut diff = predatorness - preyness;
    if diff == 0.0 {
        let nudge = f64::EPSILON * predatorness.max(preyness);
        diff = if rng.gen::<bool>() { nudge } else { -nudge };
    }

    let (bound, mean) = if diff > 0.0 {
        let bound = settings.min_growth_rate;
        (bound, bound * share(diff, max_predator))
    } else {
        let bound = settings.max_growth_rate;
        (bound, bound * share(-diff, max_prey))
    };
    let sigma = (bound - mean).abs().min(mean.abs());
    sample_matching_sign(rng, mean, sigma)
}

fn share(diff: f64, max: f64) -> f64 {
    if max > 0.0 {
        (diff / max).min(1.0)
    } else {
        0.0
    }
}

/// Draws from `Normal(mean, sigma)` until the draw has the sign of `mean`.
///
/// Returns `mean` itself when `mean` or `sigma` is zero, or after
/// [`MAX_SIGN_DRAWS`] mismatches.
pub fn sample_matching_sign<R: Rng + ?Sized>(rng: &mut R, mean: f64, sigma: f64) -> f64 {
    if mean == 0.0 || sigma == 0.0 {
        return mean;
    }
    let Ok(normal) = Normal::new(mean, sigma) else {
        return mean;
    };
    for _ in 0..MAX_SIGN_DRAWS {
        let draw = normal.sample(rng);
        if draw != 0.0 && draw.signum() == mean.signum() {
            return draw;
        }
    }
    mean
}
