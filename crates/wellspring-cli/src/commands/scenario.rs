//! What-if scenario

use anyhow::{bail, Context, Result};
use wellspring_core::analysis::WellbeingAnalyzer;
use wellspring_core::{AnalysisConfig, ScenarioSpec};

use super::{check_metric_names, load_inputs, parse_assignments, signed};
use crate::cli::DataArgs;

pub fn cmd_scenario(
    config: &AnalysisConfig,
    data: &DataArgs,
    name: &str,
    deltas: &[String],
    json: bool,
) -> Result<()> {
    let deltas = parse_assignments(deltas)?;
    if deltas.is_empty() {
        bail!("At least one --delta NAME=VALUE is required");
    }

    let inputs = load_inputs(data)?;
    let analyzer = WellbeingAnalyzer::new(config.clone());
    let points = analyzer.aggregate(&inputs.as_input());
    check_metric_names(&deltas, &points)?;

    let spec = ScenarioSpec {
        name: name.to_string(),
        deltas,
    };
    let report = analyzer.analyze_points(&points, std::slice::from_ref(&spec));
    let Some(outcome) = report.scenarios.first() else {
        bail!("Scenario produced no outcome");
    };

    if json {
        let output =
            serde_json::to_string_pretty(outcome).context("Failed to serialize scenario")?;
        println!("{}", output);
        return Ok(());
    }

    println!();
    println!("💡 {}", outcome.name);
    println!("   ─────────────────────────────────────────────────────────────");
    for (metric, delta) in outcome.deltas.iter() {
        println!(
            "   {:<20} {:>10.2} -> {:>10.2}",
            metric,
            report.baseline.get(metric),
            report.baseline.get(metric) + delta
        );
    }
    println!();

    if outcome.predicted_deltas.is_empty() {
        println!("   No trained models yet ({} weeks of data).", report.weeks_analyzed);
    }
    for (metric, delta) in &outcome.predicted_deltas {
        let marker = if outcome.dominant_metric == Some(*metric) {
            "◀"
        } else {
            ""
        };
        println!("   {:<20} {} {}", metric.label(), signed(*delta), marker);
    }
    println!();
    println!("   {}", outcome.recommendation);
    println!();

    Ok(())
}
