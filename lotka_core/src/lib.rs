//! N-Lotka Core - Randomized Ecosystems and Population Dynamics
//!
//! This library covers the numeric heart of a sweep:
//! 1. **Generation**: random predator/prey networks whose growth rates agree
//!    with each species' role ([`EcosystemGenerator`])
//! 2. **Flattening**: graph to growth vector and coefficient matrix
//!    ([`EcosystemPopulations`])
//! 3. **Integration**: explicit Euler with coarsening, extinction and
//!    divergence bookkeeping ([`integrate`])
//!
//! Every random draw comes from a stream the caller passes in, usually one
//! obtained from a [`lotka_env::Seed`].

pub mod accuracy;
pub mod analysis;
pub mod ecosystem;
pub mod error;
pub mod export;
pub mod factor;
pub mod integrator;
pub mod matrix;
pub mod topology;
pub mod trial;

// Re-export key types for convenience
pub use accuracy::{AccuracySweep, SimulationAccuracy};
pub use analysis::TrialAnalysis;
pub use ecosystem::{
    EcosystemConfig, EcosystemGenerator, EcosystemGraph, GeneratedNetwork, NetworkSettings, TopologyConfig,
    WeightConfig,
};
pub use error::{AccuracyError, GenerateError, MatrixError};
pub use factor::Factor;
pub use integrator::{integrate, integrate_populations, Generations, IntegrationOutcome, DIVERGED};
pub use matrix::EcosystemPopulations;
pub use topology::Topology;
pub use trial::Trial;
