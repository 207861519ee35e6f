// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulate a ring of nodes monitored for deadlock.
//!
//! See `lib.rs` for details.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::process::ExitCode;

use clap::Parser;
use ringlock_engine::engine::Engine;
use ringlock_engine::sim_error;
use ringlock_engine::time::PS_PER_MS;
use ringlock_engine::types::SimError;
use ringlock_platform::Platform;
use ringlock_platform::random::{RandomLogger, random_ring};
use ringlock_track::builder::{TrackerConfig, TrackersConfig, setup_trackers};
use ringlock_track::{Track, info, warn};
use sim_deadlock::summary::write_summary;

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Ring deadlock simulation")]
struct Cli {
    /// Platform configuration file (YAML).
    #[arg(long, conflicts_with = "random_nodes")]
    config: Option<PathBuf>,

    /// Simulate a random ring of this many nodes instead of a configuration
    /// file.
    #[arg(long)]
    random_nodes: Option<usize>,

    /// Seed used to generate the random ring.
    #[arg(long, default_value = "1234")]
    seed: u64,

    /// Smallest queue size of a random ring.
    #[arg(long, default_value = "80")]
    queue_min: usize,

    /// Largest queue size of a random ring.
    #[arg(long, default_value = "120")]
    queue_max: usize,

    /// Shortest node tick period of a random ring, in milliseconds.
    #[arg(long, default_value = "2")]
    tick_min_ms: u64,

    /// Longest node tick period of a random ring, in milliseconds.
    #[arg(long, default_value = "5")]
    tick_max_ms: u64,

    /// Probability that a node of a random ring generates a message each tick.
    #[arg(long, default_value = "0.9")]
    message_gen: f64,

    /// Do not monitor a random ring with a deadlock logger.
    #[arg(long)]
    no_logger: bool,

    /// Simulated milliseconds after which the run stops.
    #[arg(long, default_value = "10000")]
    run_ms: u64,

    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// Write log messages to this file.
    #[arg(long)]
    log_file: Option<String>,

    /// Level of log message to write to `--log-file`.
    #[arg(long, default_value = "Debug")]
    log_file_level: log::Level,

    /// Write the logger history to this file as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn setup_all_trackers(args: &Cli) -> Result<Rc<dyn Track>, SimError> {
    let config = TrackersConfig {
        stdout: TrackerConfig {
            enable: args.stdout,
            level: args.stdout_level,
            filter_regex: &args.stdout_filter_regex,
            file: None,
        },
        log_file: TrackerConfig {
            enable: args.log_file.is_some(),
            level: args.log_file_level,
            filter_regex: "",
            file: args.log_file.as_deref(),
        },
    };
    setup_trackers(&config).map_err(|e| SimError(e.to_string()))
}

fn build_platform(args: &Cli, engine: &mut Engine) -> Result<Platform, SimError> {
    if let Some(path) = &args.config {
        return Platform::from_file(engine, path);
    }
    let Some(num_nodes) = args.random_nodes else {
        return sim_error!("One of --config or --random-nodes is required");
    };

    let logger = (!args.no_logger).then(RandomLogger::default);
    let cfg = random_ring(
        num_nodes,
        args.queue_min..=args.queue_max,
        args.tick_min_ms..=args.tick_max_ms,
        args.message_gen,
        args.seed,
        logger,
    )?;
    Platform::build(engine, &cfg)
}

fn write_csv(platform: &Platform, path: &Path) -> Result<(), SimError> {
    let Some(logger) = platform.logger() else {
        return sim_error!("--csv requires a platform with a logger");
    };
    let file = fs::File::create(path)
        .map_err(|e| SimError(format!("Failed to create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    logger
        .write_history_csv(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|e| SimError(format!("Failed to write {}: {e}", path.display())))
}

fn main() -> Result<ExitCode, SimError> {
    let args = Cli::parse();

    let tracker = setup_all_trackers(&args)?;
    let mut engine = Engine::new(&tracker);
    let platform = build_platform(&args, &mut engine)?;

    let top = engine.top().clone();
    info!(top ; "Platform built and connected\n{platform}");

    let deadlocked = platform.run(&mut engine, args.run_ms * PS_PER_MS)?;
    if deadlocked {
        warn!(top ; "Deadlock declared at {}ps", engine.time_now_ps());
    }

    if let Some(path) = &args.csv {
        write_csv(&platform, path)?;
    }
    write_summary(&mut io::stdout().lock(), &platform, engine.time_now_ps())
        .map_err(|e| SimError(format!("Failed to write summary: {e}")))?;

    tracker.shutdown();
    if deadlocked {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
