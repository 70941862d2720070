//! Memory bridge command-line driver.
//!
//! This binary drives a bridge session from the command line. It provides:
//! 1. **Smoke run:** Issue a write/read pattern, tick until every read completes, check each
//!    returned value against a shadow copy of the writes, and print statistics.
//! 2. **Config dump:** Print the resolved configuration and the clock ratios it yields.

mod smoke;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use membridge_core::config::{Config, ConfigLoader, JsonConfigLoader};
use membridge_core::{BridgeError, Session};
use tracing_subscriber::EnvFilter;

type CliResult = Result<ExitCode, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "membridge",
    author,
    version,
    about = "Cycle-stepped bridge between a memory request driver and a DRAM timing model",
    long_about = "Drive a bridge session from the command line.\n\nConfiguration is JSON; every field is optional.\n\nExamples:\n  membridge smoke --config configs/dram.json\n  membridge smoke --requests 512 --max-inflight 16\n  membridge config --config configs/dram.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue writes and reads through a fresh session and verify the returned data.
    Smoke {
        /// JSON configuration file (built-in defaults if omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of requests to issue.
        #[arg(short = 'n', long, default_value_t = 128)]
        requests: usize,

        /// Give up after this many cycles.
        #[arg(long, default_value_t = 50_000)]
        max_cycles: u64,

        /// Maximum reads in flight at once.
        #[arg(long, default_value_t = 64)]
        max_inflight: usize,

        /// Address stride between requests, in bytes.
        #[arg(long, default_value_t = 64)]
        stride: u64,

        /// Report a stall after this many consecutive rejected cycles.
        #[arg(long, default_value_t = 10_000)]
        stall_limit: u64,
    },

    /// Print the resolved configuration as JSON.
    Config {
        /// JSON configuration file (built-in defaults if omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Smoke {
            config,
            requests,
            max_cycles,
            max_inflight,
            stride,
            stall_limit,
        } => {
            let plan = smoke::Plan {
                requests,
                max_cycles,
                max_inflight,
                stride,
                stall_limit,
            };
            run_smoke(config.as_ref(), &plan)
        }
        Commands::Config { config } => run_config(config.as_ref()),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Loads `path` if given, otherwise returns the built-in defaults.
fn load_config(path: Option<&PathBuf>) -> Result<Config, BridgeError> {
    match path {
        Some(path) => Ok(JsonConfigLoader.load(path)?),
        None => Ok(Config::default()),
    }
}

fn run_smoke(path: Option<&PathBuf>, plan: &smoke::Plan) -> CliResult {
    let config = load_config(path)?;
    smoke::run(&config, plan)
}

/// Prints the configuration as pretty JSON followed by the clock ratios a session would use.
fn run_config(path: Option<&PathBuf>) -> CliResult {
    let config = load_config(path)?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");

    let session = Session::from_config(&config)?;
    let (frontend, engine) = session.clock_ratios();
    println!("clock ratios: frontend {frontend}, timing engine {engine}");
    let _ = session.finalize();
    Ok(ExitCode::SUCCESS)
}
