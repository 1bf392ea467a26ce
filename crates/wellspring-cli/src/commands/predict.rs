//! Single-metric prediction

use anyhow::{bail, Context, Result};
use wellspring_core::analysis::WellbeingAnalyzer;
use wellspring_core::models::FinancialVector;
use wellspring_core::{AnalysisConfig, ModelStatus, WellbeingMetric};

use super::{check_metric_names, load_inputs, parse_assignments, signed};
use crate::cli::DataArgs;

pub fn cmd_predict(
    config: &AnalysisConfig,
    data: &DataArgs,
    metric: WellbeingMetric,
    set: &[String],
    json: bool,
) -> Result<()> {
    let overrides = parse_assignments(set)?;

    let inputs = load_inputs(data)?;
    let analyzer = WellbeingAnalyzer::new(config.clone());
    let points = analyzer.aggregate(&inputs.as_input());
    check_metric_names(&overrides, &points)?;

    let correlations = analyzer.correlate(&points);
    let model = match analyzer.train_metric(&points, &correlations, metric) {
        ModelStatus::Trained(model) => model,
        ModelStatus::Unavailable { reason } => {
            bail!("Cannot predict {}: {}", metric.label(), reason)
        }
    };

    let mut vector = FinancialVector::mean_of(&points);
    for (name, value) in overrides.iter() {
        vector.set(name.clone(), *value);
    }
    let prediction = wellspring_core::analysis::predict(&model, &vector);

    if json {
        let output =
            serde_json::to_string_pretty(&prediction).context("Failed to serialize prediction")?;
        println!("{}", output);
        return Ok(());
    }

    println!();
    println!("🔮 Predicted {}: {:.2}", metric.label(), prediction.predicted);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Confidence: {} (R² {:.2} over {} weeks)",
        prediction.confidence, model.r_squared, model.sample_size
    );
    if prediction.is_out_of_range() {
        println!("   ⚠️  Outside the 1-10 rating scale; the inputs are far from the history");
    }
    println!();
    println!("   {:<20} {:>10} {:>8} {:>7}", "Predictor", "Value", "Impact", "Share");
    for contribution in &prediction.contributions {
        println!(
            "   {:<20} {:>10.2} {:>8} {:>6.1}%",
            contribution.predictor,
            contribution.value,
            signed(contribution.impact),
            contribution.percent_contribution
        );
    }
    println!("   {:<20} {:>10} {:>8}", "intercept", "", signed(model.intercept));
    println!();

    Ok(())
}
