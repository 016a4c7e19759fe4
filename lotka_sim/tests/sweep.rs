//! Full sweeps through the public API.

use lotka_sim::{build_series, JsonLinesSink, MemorySink, Preset, RunStatus, SweepConfig, TrialRecord, TrialScheduler};
use lotka_env::{Seed, SeriesId};
use std::io::{BufRead, BufReader};

const MASTER: &str = "2d7f8a1e-5c3b-4e9a-8f60-71b2c4d9e0a3";

fn config() -> SweepConfig {
    Preset::Test
        .config()
        .with_seed(MASTER.parse().unwrap())
        .with_epochs(2)
        .with_iterations(2)
        .with_threads(2)
}

#[test]
fn test_sweep_records_every_trial() {
    let config = config();
    let sink = MemorySink::new();
    let summary = TrialScheduler::new(&config, &sink).run().unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    let records = sink.into_records();
    assert_eq!(records.len(), 4 * config.trials_per_position());
    assert_eq!(records[0].label, "0000ep-0000s-0000t");

    for record in &records {
        let n = record.initial_populations.len();
        assert_eq!(record.growth_rates.len(), n);
        assert_eq!(record.coefficients.len(), n);
        assert!(record.settings.is_some());
        assert_eq!(record.generations.as_ref().map(|g| g.len()), Some(n));
    }
}

#[test]
fn test_single_series_matches_sweep() {
    let config = config();
    let sink = MemorySink::new();
    TrialScheduler::new(&config, &sink).run().unwrap();
    let records = sink.into_records();

    let master: Seed = MASTER.parse().unwrap();
    let id = SeriesId::new(1, 1);
    let trials = build_series(&master, id, &config).unwrap();
    let replayed: Vec<&TrialRecord> = records.iter().filter(|r| r.series == id).collect();

    assert_eq!(replayed.len(), trials.len());
    for (trial, record) in trials.iter().zip(replayed) {
        assert_eq!(trial.label(), record.label);
        assert_eq!(trial.populations.coefficient_rows(), record.coefficients);
        assert_eq!(trial.accuracy, record.accuracy);
    }
}

#[test]
fn test_json_lines_file() {
    let path = std::env::temp_dir().join(format!("lotka-sweep-{}.jsonl", std::process::id()));
    let config = config().with_epochs(1).with_iterations(1);
    let sink = JsonLinesSink::create(&path).unwrap();
    let summary = TrialScheduler::new(&config, &sink)
        .with_generations(false)
        .run()
        .unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(lines.len(), summary.trials_recorded);
    for line in &lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.get("label").is_some());
        assert!(value.get("generations").is_none());
        assert!(value.get("outcome").is_some());
    }
}
