//! Wellspring CLI - Spending and wellbeing analyzer
//!
//! Usage:
//!   wellspring analyze -t tx.csv -w checkins.csv          Full report
//!   wellspring correlations -t tx.csv -w checkins.csv     Ranked correlations
//!   wellspring predict -t ... -w ... --metric stress      Predict one metric
//!   wellspring scenario -t ... -w ... --delta food=-50    What-if scenario
//!   wellspring config                                     Effective config

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { data, json } => commands::cmd_analyze(&config, &data, json),
        Commands::Correlations { data, top, json } => {
            commands::cmd_correlations(&config, &data, top, json)
        }
        Commands::Predict {
            data,
            metric,
            set,
            json,
        } => commands::cmd_predict(&config, &data, metric, &set, json),
        Commands::Scenario {
            data,
            name,
            deltas,
            json,
        } => commands::cmd_scenario(&config, &data, &name, &deltas, json),
        Commands::Config => commands::cmd_config(cli.config.as_deref()),
    }
}
