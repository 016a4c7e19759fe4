//! N-Lotka Sweep Runner
//!
//! Runs large, reproducible sweeps over randomized Lotka-Volterra
//! ecosystems.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TrialScheduler                         │
//! │   Cursor (epoch, iteration) ── Mutex ──┐                     │
//! │                                        ▼                     │
//! │  ┌──────────┐  ┌──────────┐       ┌──────────┐               │
//! │  │ worker 0 │  │ worker 1 │  ...  │ worker N │ rayon pool    │
//! │  └────┬─────┘  └────┬─────┘       └────┬─────┘               │
//! │       │ build_series(master, id)       │                     │
//! │       ▼                                ▼                     │
//! │   integrate(trial) ──► TrialRecord ──► TrialSink             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each (epoch, iteration) position seeds itself from the master seed
//! alone, so results do not depend on thread count or completion order.
//!
//! # Usage
//!
//! ```no_run
//! use lotka_sim::{MemorySink, Preset, TrialScheduler};
//!
//! let config = Preset::Test.config();
//! let sink = MemorySink::new();
//! let summary = TrialScheduler::new(&config, &sink).run()?;
//! println!("{} trials", summary.trials_recorded);
//! # Ok::<(), lotka_sim::SchedulerError>(())
//! ```

pub mod config;
pub mod error;
pub mod presets;
pub mod scheduler;
pub mod series;
pub mod sink;

pub use config::{SimulateConfig, SweepConfig};
pub use error::{ConfigError, SchedulerError, SeriesError, SinkError};
pub use presets::Preset;
pub use scheduler::{RunStatus, RunSummary, StopHandle, TrialScheduler};
pub use series::build_series;
pub use sink::{JsonLinesSink, MemorySink, TrialRecord, TrialSink};
