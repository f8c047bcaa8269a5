//! # `mcrsat`
//!
//! Solves a multiple courier routing instance with the SAT encoding and
//! writes the result record as JSON.

use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc},
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use mcrsat::{
    events::{Event, EventSink, LogSink, Phase},
    instance::Instance,
    model::ModelOptions,
    solve::{self, SolveOptions, Strategy},
};
use mcrsat_tools::{utils, Solver};

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SearchStrategy {
    /// Ask for a better solution than the best one so far
    Linear,
    /// Bisect between the lower bound and the best solution so far
    Binary,
}

impl From<SearchStrategy> for Strategy {
    fn from(value: SearchStrategy) -> Self {
        match value {
            SearchStrategy::Linear => Strategy::Linear,
            SearchStrategy::Binary => Strategy::Binary,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The instance file
    instance: PathBuf,
    /// The time limit in seconds, covering encoding and solving
    #[arg(short, long, default_value_t = 300)]
    timeout: u64,
    /// How to search for the optimum
    #[arg(long, value_enum, default_value_t = SearchStrategy::Linear)]
    strategy: SearchStrategy,
    /// Keep only one direction of every route if the distance matrix is
    /// symmetric
    #[arg(long)]
    symmetry_breaking: bool,
    /// Allow couriers that deliver nothing
    #[arg(long)]
    allow_empty_routes: bool,
    /// Where to write the JSON result record. Writes to `stdout` if not
    /// given.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Log more, can be repeated
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logging(args.verbose);

    let start = Instant::now();
    let inst = Instance::from_path(&args.instance)
        .with_context(|| format!("error parsing instance {}", args.instance.display()))?;
    LogSink.record(Event {
        phase: Phase::Parse,
        elapsed: start.elapsed(),
        n_vars: 0,
        n_clauses: 0,
        detail: format!(
            "{} couriers, {} items",
            inst.n_couriers(),
            inst.n_items()
        ),
    });

    let abort = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&abort))
            .context("failed to register signal handler")?;
    }

    let opts = SolveOptions {
        timeout: Duration::from_secs(args.timeout),
        strategy: args.strategy.into(),
        model: ModelOptions {
            symmetry_breaking: args.symmetry_breaking,
            allow_empty_routes: args.allow_empty_routes,
        },
        abort,
    };
    let outcome = solve::solve::<Solver>(&inst, &opts, &mut LogSink)?;
    log::info!(
        "{} after {:.3}s wall clock, {:.3}s cpu",
        outcome.status,
        outcome.elapsed.as_secs_f64(),
        outcome.cpu_time.as_secs_f64()
    );
    match outcome.solution() {
        Ok(sol) => log::info!("best solution\n{sol}"),
        Err(err) => log::warn!("{err}"),
    }
    eprintln!("s {}", outcome.status);

    utils::write_record(&outcome.record(), args.output.as_deref())
}
