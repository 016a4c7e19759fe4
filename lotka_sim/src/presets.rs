//! Named sweep presets.

use crate::config::SweepConfig;
use lotka_core::{AccuracySweep, EcosystemConfig, Factor, TopologyConfig, WeightConfig};

/// Preset identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Holme-Kim networks of 10 to 625 species, full accuracy sweep
    PowerLaw,

    /// 10x10 Kleinberg lattices, full accuracy sweep
    SmallWorld,

    /// Tiny networks and short horizons for smoke runs
    Test,
}

impl Preset {
    /// Returns a list of all presets.
    pub fn all() -> Vec<Preset> {
        vec![Preset::PowerLaw, Preset::SmallWorld, Preset::Test]
    }

    /// Returns the preset name.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::PowerLaw => "powerlaw",
            Preset::SmallWorld => "small_world",
            Preset::Test => "test",
        }
    }

    /// Returns a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            Preset::PowerLaw => "Power-law cluster networks, 10-625 species, 100 accuracy variants each",
            Preset::SmallWorld => "Navigable small-world 10x10 lattices, 100 accuracy variants each",
            Preset::Test => "5-12 species, 4 accuracy variants, 5 time units; finishes in seconds",
        }
    }

    /// Builds the preset's configuration.
    pub fn config(&self) -> SweepConfig {
        match self {
            Preset::PowerLaw => SweepConfig::default(),
            Preset::SmallWorld => SweepConfig {
                ecosystem: EcosystemConfig {
                    topology: TopologyConfig::SmallWorld {
                        dim: Factor::Constant(2),
                        side_length: Factor::Constant(10),
                    },
                    ..EcosystemConfig::default()
                },
                ..SweepConfig::default()
            },
            Preset::Test => SweepConfig {
                epochs: 2,
                iterations: 3,
                threads: 2,
                ecosystem: EcosystemConfig {
                    networks_per_iteration: 1,
                    topology: TopologyConfig::PowerLawCluster {
                        species_count: Factor::range(5, 12),
                        connection_m_perc: Factor::range(0.0, 0.3),
                        connection_p: Factor::range(0.0, 1.0),
                    },
                    weights: WeightConfig::default(),
                },
                accuracy: AccuracySweep {
                    euler_step: Factor::range(0.005, 0.01),
                    extinct_if_below: Factor::range(1e-12, 1e-8),
                    max_time: 5.0,
                    target_coarse_step: 0.05,
                    variants_per_setting: 2,
                },
                ..SweepConfig::default()
            },
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "powerlaw" | "power_law" | "power-law" => Ok(Preset::PowerLaw),
            "small_world" | "smallworld" | "small-world" => Ok(Preset::SmallWorld),
            "test" => Ok(Preset::Test),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}
