#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a tile map and prints it.

mod catalog;
mod trace;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tile_collapse_core::{DiscardTrace, TileCatalog, TraceSink};
use tile_collapse_rendering::{render_glyphs, render_names};
use tile_collapse_system_solver::{Config, RunController};
use tracing_subscriber::EnvFilter;

use self::trace::{LoggingTrace, TRACE_TARGET};

/// Generates a tile map by wave function collapse.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of columns to generate.
    #[arg(long, default_value_t = 20)]
    width: u32,
    /// Number of rows to generate.
    #[arg(long, default_value_t = 10)]
    height: u32,
    /// Seed for the random stream. Drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Restarts allowed after a contradiction.
    #[arg(long, default_value_t = 20)]
    max_retries: u32,
    /// TOML file declaring `[[tiles]]`. Uses the built-in terrain otherwise.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,
    /// How the resolved map is printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Initials)]
    format: OutputFormat,
    /// Logs every collapse, narrowing and contradiction.
    #[arg(long)]
    trace: bool,
}

/// Presentation of the resolved map on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One glyph per cell.
    Initials,
    /// Full tile names in padded columns.
    Names,
    /// Rows of tile names as JSON.
    Json,
}

/// Entry point for the tile collapse command-line interface.
fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.trace);

    match run(&args) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Generation failed: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(trace: bool) {
    let default_directive = if trace {
        format!("warn,{TRACE_TARGET}=debug")
    } else {
        "warn".to_owned()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<String> {
    let definitions = match &args.catalog {
        Some(path) => catalog::load(path)?,
        None => catalog::builtin()?,
    };
    let catalog = TileCatalog::new(definitions).context("tile catalog rejected")?;
    let config = Config::new(args.width, args.height, args.max_retries);
    let mut controller = RunController::new(catalog.clone(), config)?;

    let seed = args.seed.unwrap_or_else(|| {
        let seed = rand::random();
        eprintln!("seed: {seed}");
        seed
    });

    let mut logging;
    let mut discard = DiscardTrace;
    let sink: &mut dyn TraceSink = if args.trace {
        logging = LoggingTrace::new(catalog.clone());
        &mut logging
    } else {
        &mut discard
    };

    let generation = controller.run_seeded(seed, sink)?;
    tracing::info!(seed, attempts = generation.attempts, "generation finished");

    match args.format {
        OutputFormat::Initials => Ok(render_glyphs(&generation.map, &catalog)),
        OutputFormat::Names => Ok(render_names(&generation.map, &catalog)),
        OutputFormat::Json => {
            let names = generation.map.names(&catalog);
            let json =
                serde_json::to_string_pretty(&names).context("failed to encode map as json")?;
            Ok(format!("{json}\n"))
        }
    }
}
