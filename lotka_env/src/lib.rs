//! N-Lotka Seed Hierarchy
//!
//! Every random draw in a sweep flows from one 128-bit master seed.
//!
//! # Core Concept: Derive, Never Share
//!
//! - **Master seed**: user supplied (UUID) or generated and logged
//! - **Series seed**: `master.for_series((epoch, iteration))`, a pure
//!   SHA-256 derivation, so work units can run in any order on any thread
//! - **Streams**: `series_seed.fresh_random()` hands a ChaCha8 generator to a
//!   single consumer (e.g. one iteration's network generation)
//!
//! Any trial is reproducible from the master seed and its series id alone.
//!
//! # Example
//!
//! ```
//! use lotka_env::{Seed, SeriesId};
//! use rand::Rng;
//!
//! let master: Seed = "09c158c3-18f3-40a4-80fe-2b855bff538f".parse().unwrap();
//! let mut series = master.for_series(SeriesId::new(0, 3));
//! let mut rng = series.fresh_random();
//! let _species: usize = rng.gen_range(10..=625);
//! ```

mod error;
mod seed;
mod types;

pub use error::EnvError;
pub use seed::{RandomStream, Seed, SEED_BYTES};
pub use types::SeriesId;
