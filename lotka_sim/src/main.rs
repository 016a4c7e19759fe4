//! N-Lotka sweep CLI
//!
//! Run reproducible population-dynamics sweeps, or integrate a single
//! hand-written ecosystem.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lotka_core::export::{edge_rows, node_rows, write_edges_csv, write_generations_csv, write_nodes_csv};
use lotka_core::{integrate, Trial};
use lotka_sim::{
    JsonLinesSink, MemorySink, Preset, RunStatus, SimulateConfig, StopHandle, SweepConfig, TrialRecord, TrialScheduler,
    TrialSink,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

/// N-Lotka population dynamics sweeps
#[derive(Parser, Debug)]
#[command(name = "lotka-sim")]
#[command(about = "Reproducible sweeps over randomized Lotka-Volterra ecosystems", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full sweep of generated ecosystems
    Sweep(SweepArgs),

    /// Integrate one ecosystem described in a TOML file
    Simulate(SimulateArgs),

    /// List the built-in presets
    Presets,
}

#[derive(clap::Args, Debug)]
struct SweepArgs {
    /// Built-in preset (powerlaw, small_world, test)
    #[arg(short, long, conflicts_with = "config")]
    preset: Option<Preset>,

    /// TOML sweep configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Master seed; generated when absent
    #[arg(short, long)]
    seed: Option<Uuid>,

    /// Worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Number of epochs
    #[arg(long)]
    epochs: Option<u64>,

    /// Iterations per epoch
    #[arg(long)]
    iterations: Option<u64>,

    /// JSON Lines output file
    #[arg(short, long, default_value = "results.jsonl")]
    out: PathBuf,

    /// Omit generation matrices from the records
    #[arg(long)]
    no_generations: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// TOML ecosystem description
    #[arg(short, long)]
    config: PathBuf,

    /// Write the generation matrix as CSV
    #[arg(long)]
    generations: Option<PathBuf>,

    /// Write the node table as CSV
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Write the edge table as CSV
    #[arg(long)]
    edges: Option<PathBuf>,

    /// Print the trial record as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Sweep(args) => run_sweep(args),
        Command::Simulate(args) => run_simulate(args),
        Command::Presets => {
            list_presets();
            Ok(RunStatus::Completed)
        }
    };

    match result {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(RunStatus::StoppedEarly) => ExitCode::from(2),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn list_presets() {
    for preset in Preset::all() {
        println!("{:<12} {}", preset.name(), preset.description());
    }
}

fn load_sweep_config(args: &SweepArgs) -> Result<SweepConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => SweepConfig::from_toml_file(path)?,
        (None, Some(preset)) => preset.config(),
        (None, None) => SweepConfig::default(),
    };

    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    if let Some(epochs) = args.epochs {
        config = config.with_epochs(epochs);
    }
    if let Some(iterations) = args.iterations {
        config = config.with_iterations(iterations);
    }
    if config.master_seed.is_none() {
        let seed = Uuid::new_v4();
        info!(master_seed = %seed, "Generated master seed");
        config = config.with_seed(seed);
    }

    config.validate()?;
    Ok(config)
}

fn run_sweep(args: SweepArgs) -> Result<RunStatus> {
    let config = load_sweep_config(&args)?;
    let sink = JsonLinesSink::create(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let stop = StopHandle::new();
    watch_ctrl_c(stop.clone());

    let scheduler = TrialScheduler::new(&config, &sink)
        .with_stop_handle(stop)
        .with_generations(!args.no_generations);
    let summary = scheduler.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("Results written to {}", args.out.display());
        info!(
            "{} positions, {} trials recorded, {} divergences, {} faults",
            summary.positions, summary.trials_recorded, summary.divergences, summary.faults
        );
        if summary.status == RunStatus::StoppedEarly {
            warn!("Sweep stopped early; rerun with --seed {} to reproduce", summary.master_seed);
        }
    }
    Ok(summary.status)
}

fn run_simulate(args: SimulateArgs) -> Result<RunStatus> {
    let config = SimulateConfig::from_toml_file(&args.config)?;
    let populations = config.populations()?;
    let trial = Trial::standalone(populations, config.accuracy);

    info!(
        species = trial.populations.species_count(),
        raw_iterations = config.accuracy.raw_iterations(),
        coarse_iterations = config.accuracy.coarse_iterations(),
        "Integrating ecosystem"
    );
    let generations = integrate(&trial);

    if let Some(path) = &args.generations {
        write_generations_csv(&generations, create(path)?)?;
        info!("Generations written to {}", path.display());
    }
    match (&args.nodes, &args.edges) {
        (Some(nodes), Some(edges)) => {
            write_nodes_csv(&node_rows(&trial.populations), create(nodes)?)?;
            write_edges_csv(&edge_rows(&trial.populations), create(edges)?)?;
            info!("Network written to {} and {}", nodes.display(), edges.display());
        }
        (None, None) => {}
        _ => bail!("--nodes and --edges must be given together"),
    }

    let sink = MemorySink::new();
    sink.record(TrialRecord::new(&trial, &generations, true))?;
    let records = sink.into_records();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        info!(outcome = ?generations.outcome(), "Integration finished");
        if let Some(analysis) = records.first().and_then(|r| r.analysis.as_ref()) {
            info!(survivors = analysis.survivors, "Survivors at final step");
        }
    }
    Ok(RunStatus::Completed)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Requests a graceful stop on the first Ctrl-C.
fn watch_ctrl_c(stop: StopHandle) {
    let spawned = std::thread::Builder::new()
        .name("lotka-ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "Ctrl-C handler unavailable");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Ctrl-C received, finishing in-flight trials");
                    stop.request_stop();
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start Ctrl-C watcher");
    }
}
