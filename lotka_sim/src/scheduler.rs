//! Trial scheduler - runs a sweep across a fixed pool of worker threads.
//!
//! Work is handed out one (epoch, iteration) position at a time from a
//! cursor behind a single mutex. Each worker builds that position's trials,
//! integrates them in order and pushes every record into the sink, then asks
//! the cursor for the next position. The pool scope joins all workers before
//! [`TrialScheduler::run`] returns.
//!
//! Completion order across positions is unspecified; reproducibility comes
//! from the per-series seed derivation, not from scheduling.

use crate::config::SweepConfig;
use crate::error::{SchedulerError, SinkError};
use crate::series::build_series;
use crate::sink::{TrialRecord, TrialSink};
use lotka_core::integrate;
use lotka_env::{Seed, SeriesId};
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared flag asking a run to stop after in-flight trials.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Idempotent.
    pub fn request_stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("Stop requested");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every position was processed
    Completed,
    /// A stop request or sink termination cut the run short
    StoppedEarly,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub master_seed: Uuid,
    /// Positions whose trials were built
    pub positions: usize,
    /// Trials accepted by the sink
    pub trials_recorded: usize,
    /// Series that failed to build, plus trials the sink rejected or that
    /// panicked
    pub faults: usize,
    /// Trials whose integration diverged
    pub divergences: usize,
    /// Most positions in flight at once
    pub peak_concurrency: usize,
}

/// Row-major walk over `(epoch, iteration)`.
#[derive(Debug)]
struct Cursor {
    epoch: u64,
    iteration: u64,
    epochs: u64,
    iterations: u64,
}

impl Cursor {
    fn new(epochs: u64, iterations: u64) -> Self {
        Self {
            epoch: 0,
            iteration: 0,
            epochs,
            iterations,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.epoch >= self.epochs
    }

    fn next(&mut self) -> Option<SeriesId> {
        if self.is_exhausted() {
            return None;
        }
        let id = SeriesId::new(self.epoch, self.iteration);
        self.iteration += 1;
        if self.iteration >= self.iterations {
            self.iteration = 0;
            self.epoch += 1;
        }
        Some(id)
    }
}

#[derive(Debug, Default)]
struct Counters {
    positions: AtomicUsize,
    recorded: AtomicUsize,
    faults: AtomicUsize,
    divergences: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    interrupted: AtomicBool,
}

/// Control flow after one series.
enum SeriesEnd {
    Continue,
    Stop,
}

/// Runs a sweep described by a [`SweepConfig`].
pub struct TrialScheduler<'a> {
    config: &'a SweepConfig,
    master: Seed,
    sink: &'a dyn TrialSink,
    stop: StopHandle,
    include_generations: bool,
}

impl<'a> TrialScheduler<'a> {
    /// Creates a scheduler. The master seed comes from the configuration, or
    /// is generated when absent.
    pub fn new(config: &'a SweepConfig, sink: &'a dyn TrialSink) -> Self {
        let master = match config.master_seed {
            Some(uuid) => Seed::from_uuid(uuid),
            None => Seed::generate(),
        };
        Self {
            config,
            master,
            sink,
            stop: StopHandle::new(),
            include_generations: true,
        }
    }

    /// Uses an externally owned stop handle (e.g. wired to Ctrl-C).
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Whether records carry the full generation matrix.
    pub fn with_generations(mut self, include: bool) -> Self {
        self.include_generations = include;
        self
    }

    /// The master seed this run derives everything from.
    pub fn master_seed(&self) -> Uuid {
        self.master.as_uuid()
    }

    /// A handle that stops this run.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs the sweep to completion or until stopped.
    pub fn run(&self) -> Result<RunSummary, SchedulerError> {
        self.config.validate()?;
        let threads = self.config.threads;

        info!(
            master_seed = %self.master,
            epochs = self.config.epochs,
            iterations = self.config.iterations,
            threads,
            trials_per_position = self.config.trials_per_position(),
            "Starting sweep"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lotka-worker-{i}"))
            .build()
            .map_err(|e| SchedulerError::ThreadPool(e.to_string()))?;

        let cursor = Mutex::new(Cursor::new(self.config.epochs, self.config.iterations));
        let counters = Counters::default();

        pool.scope(|scope| {
            for worker in 0..threads {
                let cursor = &cursor;
                let counters = &counters;
                scope.spawn(move |_| self.worker_loop(worker, cursor, counters));
            }
        });

        self.sink.flush().map_err(SchedulerError::Flush)?;

        let exhausted = cursor
            .into_inner()
            .map(|c| c.is_exhausted())
            .unwrap_or(false);
        let status = if counters.interrupted.load(Ordering::SeqCst) || !exhausted {
            RunStatus::StoppedEarly
        } else {
            RunStatus::Completed
        };

        let summary = RunSummary {
            status,
            master_seed: self.master.as_uuid(),
            positions: counters.positions.load(Ordering::SeqCst),
            trials_recorded: counters.recorded.load(Ordering::SeqCst),
            faults: counters.faults.load(Ordering::SeqCst),
            divergences: counters.divergences.load(Ordering::SeqCst),
            peak_concurrency: counters.peak.load(Ordering::SeqCst),
        };
        info!(
            status = ?summary.status,
            positions = summary.positions,
            recorded = summary.trials_recorded,
            faults = summary.faults,
            divergences = summary.divergences,
            "Sweep finished"
        );
        Ok(summary)
    }

    fn worker_loop(&self, worker: usize, cursor: &Mutex<Cursor>, counters: &Counters) {
        debug!(worker, "Worker started");
        loop {
            if self.stop.is_stop_requested() {
                break;
            }
            let next = match cursor.lock() {
                Ok(mut cursor) => cursor.next(),
                Err(_) => {
                    error!(worker, "Cursor lock poisoned");
                    counters.interrupted.store(true, Ordering::SeqCst);
                    break;
                }
            };
            let Some(id) = next else {
                break;
            };

            let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
            counters.peak.fetch_max(active, Ordering::SeqCst);
            let end = self.run_series(id, counters);
            counters.active.fetch_sub(1, Ordering::SeqCst);

            if let SeriesEnd::Stop = end {
                break;
            }
        }
        debug!(worker, "Worker finished");
    }

    fn run_series(&self, id: SeriesId, counters: &Counters) -> SeriesEnd {
        let trials = match build_series(&self.master, id, self.config) {
            Ok(trials) => trials,
            Err(e) => {
                error!(series = %id, error = %e, "Failed to build series");
                counters.faults.fetch_add(1, Ordering::SeqCst);
                return SeriesEnd::Continue;
            }
        };
        counters.positions.fetch_add(1, Ordering::SeqCst);
        debug!(series = %id, trials = trials.len(), "Running series");

        for trial in &trials {
            if self.stop.is_stop_requested() {
                counters.interrupted.store(true, Ordering::SeqCst);
                return SeriesEnd::Stop;
            }

            let label = trial.label();
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                let generations = integrate(trial);
                if generations.is_diverged() {
                    counters.divergences.fetch_add(1, Ordering::SeqCst);
                    warn!(trial = %label, outcome = ?generations.outcome(), "Trial diverged");
                }
                let record = TrialRecord::new(trial, &generations, self.include_generations);
                self.sink.record(record)
            }));
            let result = match attempt {
                Ok(result) => result,
                Err(payload) => {
                    error!(trial = %label, panic = panic_message(payload.as_ref()), "Trial panicked");
                    counters.faults.fetch_add(1, Ordering::SeqCst);
                    continue;
                }
            };

            match result {
                Ok(()) => {
                    counters.recorded.fetch_add(1, Ordering::SeqCst);
                }
                Err(SinkError::Terminate(reason)) => {
                    warn!(trial = %label, %reason, "Sink requested termination");
                    counters.interrupted.store(true, Ordering::SeqCst);
                    self.stop.request_stop();
                    return SeriesEnd::Stop;
                }
                Err(e) => {
                    error!(trial = %label, error = %e, "Failed to record trial");
                    counters.faults.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        debug!(series = %id, "Series complete");
        SeriesEnd::Continue
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;
    use crate::sink::MemorySink;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    const MASTER: &str = "09c158c3-18f3-40a4-80fe-2b855bff538f";

    fn test_config(threads: usize) -> SweepConfig {
        Preset::Test
            .config()
            .with_seed(MASTER.parse().unwrap())
            .with_threads(threads)
    }

    /// Fails every record whose trial index is 0.
    struct FlakySink {
        inner: MemorySink,
    }

    impl TrialSink for FlakySink {
        fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
            if record.trial_index == 0 {
                return Err(SinkError::fault("disk full"));
            }
            self.inner.record(record)
        }
    }

    /// Terminates after accepting `limit` records.
    struct LimitSink {
        limit: usize,
        inner: MemorySink,
    }

    impl TrialSink for LimitSink {
        fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
            if self.inner.len() >= self.limit {
                return Err(SinkError::terminate("limit reached"));
            }
            self.inner.record(record)
        }
    }

    /// Sleeps per record and tracks how many calls overlap.
    #[derive(Default)]
    struct SlowSink {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        inner: MemorySink,
    }

    impl TrialSink for SlowSink {
        fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.record(record)
        }
    }

    /// Panics on one label, stores everything else.
    struct PanickingSink {
        label: &'static str,
        inner: MemorySink,
    }

    impl TrialSink for PanickingSink {
        fn record(&self, record: TrialRecord) -> Result<(), SinkError> {
            if record.label == self.label {
                panic!("unexpected record shape for {}", record.label);
            }
            self.inner.record(record)
        }
    }

    #[test]
    fn test_cursor_walks_row_major() {
        let mut cursor = Cursor::new(2, 3);
        let ids: Vec<_> = std::iter::from_fn(|| cursor.next()).collect();
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[2], SeriesId::new(0, 2));
        assert_eq!(ids[3], SeriesId::new(1, 0));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_full_run_counts() {
        let config = test_config(2);
        let sink = MemorySink::new();
        let summary = TrialScheduler::new(&config, &sink).run().unwrap();

        let expected = config.total_positions() as usize * config.trials_per_position();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.positions, config.total_positions() as usize);
        assert_eq!(summary.trials_recorded, expected);
        assert_eq!(summary.faults, 0);
        assert_eq!(sink.len(), expected);
        assert_eq!(summary.master_seed.to_string(), MASTER);
    }

    #[test]
    fn test_results_independent_of_thread_count() {
        let single = MemorySink::new();
        TrialScheduler::new(&test_config(1), &single).run().unwrap();
        let pooled = MemorySink::new();
        TrialScheduler::new(&test_config(3), &pooled).run().unwrap();

        let a = single.into_records();
        let b = pooled.into_records();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.label, y.label);
            assert_eq!(x.coefficients, y.coefficients);
            assert_eq!(x.generations, y.generations);
        }
    }

    #[test]
    fn test_concurrency_bounded_by_threads() {
        let config = test_config(3).with_epochs(3).with_iterations(4);
        let sink = SlowSink::default();
        let summary = TrialScheduler::new(&config, &sink).run().unwrap();

        let in_flight = sink.max_in_flight.load(Ordering::SeqCst);
        assert_eq!(summary.status, RunStatus::Completed);
        assert!(in_flight >= 1);
        assert!(in_flight <= 3, "{in_flight} sink calls overlapped with 3 threads");
        assert!(summary.peak_concurrency >= in_flight);
        assert!(summary.peak_concurrency <= 3);
        assert_eq!(sink.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_trial_is_isolated() {
        let config = test_config(2);
        let sink = PanickingSink {
            label: "0000ep-0000s-0000t",
            inner: MemorySink::new(),
        };
        let summary = TrialScheduler::new(&config, &sink).run().unwrap();

        let expected = config.total_positions() as usize * config.trials_per_position();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.faults, 1);
        assert_eq!(summary.trials_recorded, expected - 1);
        let labels: Vec<String> = sink.inner.into_records().into_iter().map(|r| r.label).collect();
        assert_eq!(labels.len(), expected - 1);
        assert!(!labels.iter().any(|l| l == "0000ep-0000s-0000t"));
        assert!(labels.iter().any(|l| l == "0000ep-0000s-0001t"));
    }

    #[test]
    fn test_panic_message_payloads() {
        let text: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bust"));
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(text.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bust");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_sink_faults_are_isolated() {
        let config = test_config(2);
        let sink = FlakySink {
            inner: MemorySink::new(),
        };
        let summary = TrialScheduler::new(&config, &sink).run().unwrap();

        let positions = config.total_positions() as usize;
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.faults, positions);
        assert_eq!(summary.trials_recorded, positions * (config.trials_per_position() - 1));
    }

    #[test]
    fn test_sink_termination_stops_early() {
        let config = test_config(1);
        let sink = LimitSink {
            limit: 3,
            inner: MemorySink::new(),
        };
        let summary = TrialScheduler::new(&config, &sink).run().unwrap();

        assert_eq!(summary.status, RunStatus::StoppedEarly);
        assert_eq!(summary.trials_recorded, 3);
        assert!(summary.positions < config.total_positions() as usize);
    }

    #[test]
    fn test_stop_before_start() {
        let config = test_config(2);
        let sink = MemorySink::new();
        let scheduler = TrialScheduler::new(&config, &sink);
        scheduler.stop_handle().request_stop();
        let summary = scheduler.run().unwrap();

        assert_eq!(summary.status, RunStatus::StoppedEarly);
        assert_eq!(summary.positions, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = test_config(0);
        let sink = MemorySink::new();
        assert!(matches!(
            TrialScheduler::new(&config, &sink).run(),
            Err(SchedulerError::Config(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_cursor_visits_each_position_once(epochs in 1u64..8, iterations in 1u64..8) {
            let mut cursor = Cursor::new(epochs, iterations);
            let ids: Vec<_> = std::iter::from_fn(|| cursor.next()).collect();
            let unique: BTreeSet<_> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len() as u64, epochs * iterations);
            prop_assert_eq!(unique.len(), ids.len());
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
