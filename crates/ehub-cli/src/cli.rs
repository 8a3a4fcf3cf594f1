use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ehub", author, version, about = "Energy hub MILP builder", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.ehub/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a case file and print every diagnostic
    Validate {
        /// Path to the JSON case file
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// Print nodes, technologies, demand and networks of a case
    Topology {
        /// Path to the JSON case file
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
    },
    /// Construct the optimization model and print its statistics
    Build {
        /// Path to the JSON case file
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Save the constructed hub to this snapshot file
        #[arg(long, value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
        /// Objective to minimise (cost, emissions, pareto)
        #[arg(long)]
        objective: Option<String>,
        /// Fallback big-M constant for disjunction rows without bounds
        #[arg(long)]
        big_m: Option<f64>,
    },
    /// Solve a case (or a saved snapshot) and export the results
    Solve {
        /// Path to the JSON case file
        #[arg(
            value_hint = ValueHint::FilePath,
            required_unless_present = "snapshot",
            conflicts_with = "snapshot"
        )]
        case: Option<PathBuf>,
        /// Load a previously built hub instead of a case file
        #[arg(long, value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Solver backend (clarabel, highs)
        #[arg(long)]
        solver: Option<String>,
        /// Directory for the per-node CSV tables
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
