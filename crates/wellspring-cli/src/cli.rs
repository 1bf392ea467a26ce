//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wellspring_core::WellbeingMetric;

/// Wellspring - See how spending moves with wellbeing
#[derive(Parser)]
#[command(name = "wellspring")]
#[command(about = "Correlate spending with wellbeing and test what-if scenarios", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Analysis config file (defaults to the user config, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input files shared by every data command
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Transactions CSV (date,category,amount)
    #[arg(short, long)]
    pub transactions: PathBuf,

    /// Wellbeing check-ins CSV (date,overall,sleep,activity,social,diet,stress)
    #[arg(short, long)]
    pub wellbeing: PathBuf,

    /// Income CSV (date,amount); enables the savings rate metric
    #[arg(long)]
    pub income: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis: correlations, models, predictions and suggested scenarios
    Analyze {
        #[command(flatten)]
        data: DataArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the strongest spending / wellbeing correlations
    Correlations {
        #[command(flatten)]
        data: DataArgs,

        /// Number of correlations to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Predict a wellbeing metric for a spending profile
    ///
    /// Starts from the average week; each --set overrides one metric.
    Predict {
        #[command(flatten)]
        data: DataArgs,

        /// Wellbeing metric: overall, sleep, activity, social, diet, stress
        #[arg(short, long)]
        metric: WellbeingMetric,

        /// Financial metric override, e.g. --set entertainment=120
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a what-if change against the average week
    Scenario {
        #[command(flatten)]
        data: DataArgs,

        /// Scenario name
        #[arg(short, long, default_value = "Custom scenario")]
        name: String,

        /// Change to a financial metric, e.g. --delta shopping=-40
        #[arg(long = "delta", value_name = "NAME=VALUE", allow_hyphen_values = true)]
        deltas: Vec<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective analysis configuration
    Config,
}
