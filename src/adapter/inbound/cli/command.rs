//! Command-line interface definitions.
//!
//! Defines the CLI structure for the scoreline application using `clap`.
//! The CLI replaces the administrative trigger: it activates events and
//! markets, runs a simulation session, lists active events and seeds demo
//! reference data.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live sports event simulator and coefficient publisher
#[derive(Parser, Debug)]
#[command(name = "scoreline")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file of whichever subcommand was given.
    #[must_use]
    pub fn config_path(&self) -> &PathBuf {
        match &self.command {
            Commands::Run(args) => &args.config.config,
            Commands::Events(args) | Commands::Seed(args) => &args.config,
        }
    }
}

/// Top-level subcommands for the scoreline CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Activate events and markets, then run one simulation session
    Run(RunArgs),

    /// List events currently marked active
    Events(ConfigPathArg),

    /// Load the demo catalog into an empty reference store
    Seed(ConfigPathArg),
}

/// Shared argument for commands that only need a configuration path.
#[derive(Parser, Debug, Clone)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
///
/// Without `--events` and `--markets` the session runs over whatever the
/// reference store already marks active.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Event codes to activate (comma-separated)
    #[arg(long, value_delimiter = ',', requires = "markets")]
    pub events: Vec<String>,

    /// Market codes to activate (comma-separated)
    #[arg(long, value_delimiter = ',', requires = "events")]
    pub markets: Vec<String>,

    /// Session length in seconds (overrides config)
    #[arg(long)]
    pub duration: Option<u64>,

    /// RNG seed for a reproducible run (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,
}
