//! Shared utilities for data commands
//!
//! This module contains:
//! - `load_config` - Resolve and load the analysis config
//! - `load_inputs` - Read the CSV files named on the command line
//! - `parse_assignments` - Parse `name=value` pairs into a financial vector

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use wellspring_core::analysis::{AnalysisInput, CorrelationEngine};
use wellspring_core::import::{parse_income, parse_transactions, parse_wellbeing};
use wellspring_core::models::{FinancialVector, WeeklyDataPoint};
use wellspring_core::{AnalysisConfig, IncomeRecord, Transaction, WellbeingRecord};

use crate::cli::DataArgs;

/// Load config from `--config`, the user config file or the built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let (config, source) =
        AnalysisConfig::load(path).context("Failed to load analysis config")?;
    debug!(source = %source, "Loaded analysis config");
    Ok(config)
}

/// Parsed contents of the input files
#[derive(Debug)]
pub struct Inputs {
    pub transactions: Vec<Transaction>,
    pub wellbeing: Vec<WellbeingRecord>,
    pub income: Option<Vec<IncomeRecord>>,
}

impl Inputs {
    pub fn as_input(&self) -> AnalysisInput<'_> {
        let input = AnalysisInput::new(&self.transactions, &self.wellbeing);
        match &self.income {
            Some(income) => input.with_income(income),
            None => input,
        }
    }
}

pub fn load_inputs(data: &DataArgs) -> Result<Inputs> {
    let transactions = parse_transactions(open(&data.transactions)?)
        .with_context(|| format!("Failed to read transactions from {}", data.transactions.display()))?;
    let wellbeing = parse_wellbeing(open(&data.wellbeing)?)
        .with_context(|| format!("Failed to read check-ins from {}", data.wellbeing.display()))?;
    let income = match &data.income {
        Some(path) => Some(
            parse_income(open(path)?)
                .with_context(|| format!("Failed to read income from {}", path.display()))?,
        ),
        None => None,
    };

    info!(
        transactions = transactions.len(),
        check_ins = wellbeing.len(),
        income = income.as_ref().map_or(0, Vec::len),
        "Loaded input files"
    );

    Ok(Inputs {
        transactions,
        wellbeing,
        income,
    })
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Parse `name=value` pairs. Later pairs for the same name win.
pub fn parse_assignments(pairs: &[String]) -> Result<FinancialVector> {
    let mut vector = FinancialVector::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Expected NAME=VALUE, got '{}'", pair);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Missing metric name in '{}'", pair);
        }
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid number in '{}'", pair))?;
        if !value.is_finite() {
            bail!("Invalid number in '{}'", pair);
        }
        vector.set(name, value);
    }
    Ok(vector)
}

/// Fail when `vector` names a financial metric the data does not carry
pub fn check_metric_names(vector: &FinancialVector, points: &[WeeklyDataPoint]) -> Result<()> {
    let known = CorrelationEngine::financial_metrics(points);
    for (name, _) in vector.iter() {
        if !known.contains(name) {
            bail!(
                "Unknown financial metric '{}'. Available: {}",
                name,
                known.join(", ")
            );
        }
    }
    Ok(())
}
