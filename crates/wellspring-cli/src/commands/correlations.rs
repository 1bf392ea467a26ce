//! Ranked correlation table

use anyhow::{Context, Result};
use wellspring_core::analysis::{top_n, WellbeingAnalyzer};
use wellspring_core::{AnalysisConfig, CorrelationResult};

use super::{load_inputs, signed, truncate};
use crate::cli::DataArgs;

pub fn cmd_correlations(
    config: &AnalysisConfig,
    data: &DataArgs,
    top: usize,
    json: bool,
) -> Result<()> {
    let inputs = load_inputs(data)?;
    let analyzer = WellbeingAnalyzer::new(config.clone());
    let points = analyzer.aggregate(&inputs.as_input());
    let results = top_n(&analyzer.correlate(&points), top);

    if json {
        let output =
            serde_json::to_string_pretty(&results).context("Failed to serialize correlations")?;
        println!("{}", output);
        return Ok(());
    }

    println!();
    println!(
        "🔗 Top {} correlations over {} weeks (|r| >= {:.2})",
        results.len(),
        points.len(),
        config.correlation.min_abs_r
    );
    println!("   ─────────────────────────────────────────────────────────────");
    if results.is_empty() {
        println!("   No correlations above the noise floor yet.");
    } else {
        print_correlation_rows(&results);
    }
    println!();

    Ok(())
}

/// One line per correlation, e.g.
/// `entertainment      overall wellbeing  +0.93  strong   positive  more spend, better  high confidence, 11 weeks`
pub fn print_correlation_rows(results: &[CorrelationResult]) {
    for result in results {
        let effect = if result.is_beneficial() {
            "more spend, better"
        } else {
            "more spend, worse"
        };
        println!(
            "   {:<18} {:<18} {}  {:<8} {:<8}  {:<18}  {} confidence, {} weeks",
            truncate(&result.financial_metric, 18),
            result.wellbeing_metric.label(),
            signed(result.coefficient),
            result.strength.as_str(),
            result.direction.as_str(),
            effect,
            result.confidence,
            result.sample_size
        );
    }
}
