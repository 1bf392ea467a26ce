//! Full analysis report

use anyhow::{Context, Result};
use wellspring_core::analysis::{AnalysisReport, WellbeingAnalyzer};
use wellspring_core::{AnalysisConfig, ModelStatus};

use super::correlations::print_correlation_rows;
use super::{load_inputs, signed};
use crate::cli::DataArgs;

/// Correlations shown in the text report
const REPORT_CORRELATIONS: usize = 10;

pub fn cmd_analyze(config: &AnalysisConfig, data: &DataArgs, json: bool) -> Result<()> {
    let inputs = load_inputs(data)?;
    let analyzer = WellbeingAnalyzer::new(config.clone());
    let report = analyzer.analyze(&inputs.as_input(), &[]);

    if json {
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", output);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

pub fn print_report(report: &AnalysisReport) {
    println!();
    println!("📊 Wellspring Analysis");
    println!("   ─────────────────────────────────────────────────────────────");

    match (report.first_week, report.last_week) {
        (Some(first), Some(last)) => {
            println!(
                "   Weeks analyzed: {} ({} to {})",
                report.weeks_analyzed, first, last
            );
            if let (Some(start), Some(end)) = (first.start_date(), last.start_date()) {
                println!("   Week starts:    {} to {}", start, end);
            }
        }
        _ => {
            println!("   No week has both transactions and check-ins yet.");
            println!();
            return;
        }
    }

    println!();
    println!("🔗 Strongest correlations");
    if report.correlations.is_empty() {
        println!("   None above the noise floor yet.");
    } else {
        let shown = &report.correlations[..report.correlations.len().min(REPORT_CORRELATIONS)];
        print_correlation_rows(shown);
        if report.correlations.len() > shown.len() {
            println!(
                "   ... and {} more (wellspring correlations --top N)",
                report.correlations.len() - shown.len()
            );
        }
    }

    println!();
    println!("🧮 Models");
    for (metric, status) in &report.models {
        match status {
            ModelStatus::Trained(model) => println!(
                "   {:<18} R² {:.2}  on {}",
                metric.label(),
                model.r_squared,
                model.predictors.join(", ")
            ),
            ModelStatus::Unavailable { reason } => {
                println!("   {:<18} ⏳ {}", metric.label(), reason)
            }
        }
    }

    if !report.predictions.is_empty() {
        println!();
        match report.last_week {
            Some(week) => println!("🔮 Predictions for {}", week),
            None => println!("🔮 Predictions"),
        }
        for (metric, prediction) in &report.predictions {
            let flag = if prediction.is_out_of_range() {
                "  ⚠️  outside the 1-10 scale"
            } else {
                ""
            };
            println!(
                "   {:<18} {:>5.2}  ({} confidence){}",
                metric.label(),
                prediction.predicted,
                prediction.confidence,
                flag
            );
        }
    }

    if !report.scenarios.is_empty() {
        println!();
        println!("💡 What if...");
        for outcome in &report.scenarios {
            let dominant = outcome
                .dominant_metric
                .and_then(|m| outcome.predicted_deltas.get(&m).map(|d| (m, *d)));
            match dominant {
                Some((metric, delta)) => println!(
                    "   {:<40} {} {}",
                    outcome.name,
                    metric.label(),
                    signed(delta)
                ),
                None => println!("   {}", outcome.name),
            }
            println!("      {}", outcome.recommendation);
        }
    }

    println!();
}
