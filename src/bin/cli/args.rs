//! CLI Argument Structures and Configuration
//!
//! This module contains all CLI argument definitions, command structures,
//! and configuration enums used by the livemeasure binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Incremental live measure recomputation
#[derive(Parser)]
#[command(name = "livemeasure")]
#[command(version = VERSION)]
#[command(about = "📊 livemeasure - Incremental live measure recomputation")]
#[command(long_about = "
Recompute quality measures and quality gate status for the components
touched by new issue data, reading and writing a JSON or YAML dataset.

Common Usage:

  # Recompute after issues changed on two files
  livemeasure recompute --dataset data.json --touched F1 --touched F2

  # Persist the changed measures back into the dataset
  livemeasure recompute --dataset data.yaml --touched F1 --write-back

  # Machine readable change events
  livemeasure recompute --dataset data.json --touched F1 --format json

  # Inspect the formula catalog
  livemeasure formulas
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recompute live measures for touched components
    Recompute(RecomputeArgs),

    /// List the formula catalog in execution order
    Formulas,

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Validate a livemeasure configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args)]
pub struct RecomputeArgs {
    /// Dataset file (.json, .yaml or .yml)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Uuid of a touched component (repeatable)
    #[arg(long, required = true, num_args = 1..)]
    pub touched: Vec<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write changed measures back into the dataset file
    #[arg(long)]
    pub write_back: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Configuration file to validate
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Change events as JSON
    Json,
    /// Tables for the terminal
    Pretty,
}
