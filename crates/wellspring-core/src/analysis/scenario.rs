//! What-if scenarios over trained models

use std::collections::BTreeMap;

use crate::models::{FinancialVector, WellbeingMetric};

use super::predictor::predict;
use super::types::{RegressionModel, ScenarioOutcome, ScenarioSpec};

/// Predicted changes smaller than this (in rating points) are reported as negligible
const NEGLIGIBLE_CHANGE: f64 = 0.01;

/// Evaluate one scenario against every available model.
///
/// For each model the predicted delta is
/// `predict(baseline + deltas) - predict(baseline)`.
pub fn run_scenario(
    models: &BTreeMap<WellbeingMetric, RegressionModel>,
    baseline: &FinancialVector,
    spec: &ScenarioSpec,
) -> ScenarioOutcome {
    let adjusted = baseline.apply(&spec.deltas);

    let predicted_deltas: BTreeMap<WellbeingMetric, f64> = models
        .iter()
        .map(|(metric, model)| {
            let before = predict(model, baseline).predicted;
            let after = predict(model, &adjusted).predicted;
            (*metric, after - before)
        })
        .collect();

    let mut dominant: Option<(WellbeingMetric, f64)> = None;
    for (metric, delta) in &predicted_deltas {
        if dominant.map_or(true, |(_, best)| delta.abs() > best.abs()) {
            dominant = Some((*metric, *delta));
        }
    }

    ScenarioOutcome {
        name: spec.name.clone(),
        deltas: spec.deltas.clone(),
        recommendation: recommendation(&spec.name, dominant),
        dominant_metric: dominant.map(|(metric, _)| metric),
        predicted_deltas,
    }
}

/// Evaluate several scenarios, preserving their order
pub fn run_scenarios(
    models: &BTreeMap<WellbeingMetric, RegressionModel>,
    baseline: &FinancialVector,
    specs: &[ScenarioSpec],
) -> Vec<ScenarioOutcome> {
    specs
        .iter()
        .map(|spec| run_scenario(models, baseline, spec))
        .collect()
}

/// "Reduce X by 20%" / "Increase X by 20%" for every predictor the models use.
///
/// Predictors with a zero baseline have nothing to scale and are skipped.
pub fn suggest_scenarios(
    models: &BTreeMap<WellbeingMetric, RegressionModel>,
    baseline: &FinancialVector,
    fraction: f64,
) -> Vec<ScenarioSpec> {
    let mut predictors: Vec<&str> = Vec::new();
    for model in models.values() {
        for name in &model.predictors {
            if !predictors.contains(&name.as_str()) {
                predictors.push(name.as_str());
            }
        }
    }

    let percent = fraction * 100.0;
    let mut specs = Vec::new();
    for name in predictors {
        let current = baseline.get(name);
        if current == 0.0 {
            continue;
        }
        let change = current * fraction;
        specs.push(
            ScenarioSpec::new(format!("Reduce {} by {:.0}%", name, percent))
                .with_delta(name, -change),
        );
        specs.push(
            ScenarioSpec::new(format!("Increase {} by {:.0}%", name, percent))
                .with_delta(name, change),
        );
    }
    specs
}

fn recommendation(name: &str, dominant: Option<(WellbeingMetric, f64)>) -> String {
    let Some((metric, delta)) = dominant else {
        return format!(
            "{}: no trained models are available yet, so this change cannot be evaluated.",
            name
        );
    };

    if delta.abs() < NEGLIGIBLE_CHANGE {
        return format!(
            "{}: no meaningful change in wellbeing is predicted.",
            name
        );
    }

    let movement = if delta > 0.0 { "rise" } else { "fall" };
    if metric.polarity().improvement(delta) > 0.0 {
        format!(
            "Recommended: {} is predicted to improve {} ({} to {} by {:.2} points).",
            name,
            metric.label(),
            metric.label(),
            movement,
            delta.abs()
        )
    } else {
        format!(
            "Not recommended: {} is predicted to worsen {} ({} to {} by {:.2} points).",
            name,
            metric.label(),
            metric.label(),
            movement,
            delta.abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> BTreeMap<WellbeingMetric, RegressionModel> {
        let mut models = BTreeMap::new();
        models.insert(
            WellbeingMetric::OverallWellbeing,
            RegressionModel::from_parts(
                WellbeingMetric::OverallWellbeing,
                5.0,
                vec![("entertainment".into(), 0.02), ("food".into(), -0.005)],
                0.75,
            ),
        );
        models.insert(
            WellbeingMetric::StressLevel,
            RegressionModel::from_parts(
                WellbeingMetric::StressLevel,
                4.0,
                vec![("shopping".into(), 0.03)],
                0.5,
            ),
        );
        models
    }

    fn baseline() -> FinancialVector {
        FinancialVector::new()
            .with("entertainment", 80.0)
            .with("food", 120.0)
            .with("shopping", 60.0)
    }

    #[test]
    fn test_identity_scenario_is_zero() {
        let outcome = run_scenario(&models(), &baseline(), &ScenarioSpec::new("Nothing changes"));

        assert_eq!(outcome.predicted_deltas.len(), 2);
        assert!(outcome.predicted_deltas.values().all(|d| *d == 0.0));
        assert!(outcome.recommendation.contains("no meaningful change"));
    }

    #[test]
    fn test_inverse_scenarios_have_inverse_deltas() {
        let up = ScenarioSpec::new("up")
            .with_delta("entertainment", 40.0)
            .with_delta("shopping", -20.0);
        let down = ScenarioSpec::new("down")
            .with_delta("entertainment", -40.0)
            .with_delta("shopping", 20.0);

        let outcomes = run_scenarios(&models(), &baseline(), &[up, down]);
        for metric in outcomes[0].predicted_deltas.keys() {
            let a = outcomes[0].predicted_deltas[metric];
            let b = outcomes[1].predicted_deltas[metric];
            assert!((a + b).abs() < 1e-9, "{}: {} vs {}", metric, a, b);
        }
    }

    #[test]
    fn test_dominant_metric_and_polarity() {
        // Less shopping lowers stress by 1.5 points, the largest change
        let spec = ScenarioSpec::new("Cut shopping")
            .with_delta("shopping", -50.0)
            .with_delta("entertainment", 10.0);
        let outcome = run_scenario(&models(), &baseline(), &spec);

        assert_eq!(outcome.dominant_metric, Some(WellbeingMetric::StressLevel));
        assert!((outcome.predicted_deltas[&WellbeingMetric::StressLevel] + 1.5).abs() < 1e-9);
        assert!((outcome.predicted_deltas[&WellbeingMetric::OverallWellbeing] - 0.2).abs() < 1e-9);
        assert!(outcome.recommendation.starts_with("Recommended"));
        assert!(outcome.recommendation.contains("stress level to fall by 1.50"));
    }

    #[test]
    fn test_worsening_scenario() {
        let spec = ScenarioSpec::new("Skip fun").with_delta("entertainment", -80.0);
        let outcome = run_scenario(&models(), &baseline(), &spec);

        assert_eq!(
            outcome.dominant_metric,
            Some(WellbeingMetric::OverallWellbeing)
        );
        assert!(outcome.recommendation.starts_with("Not recommended"));
    }

    #[test]
    fn test_no_models() {
        let spec = ScenarioSpec::new("Anything").with_delta("food", 10.0);
        let outcome = run_scenario(&BTreeMap::new(), &baseline(), &spec);

        assert!(outcome.predicted_deltas.is_empty());
        assert_eq!(outcome.dominant_metric, None);
        assert!(outcome.recommendation.contains("no trained models"));
    }

    #[test]
    fn test_suggested_scenarios() {
        let mut baseline = baseline();
        baseline.set("food", 0.0);
        let specs = suggest_scenarios(&models(), &baseline, 0.2);

        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Reduce entertainment by 20%",
                "Increase entertainment by 20%",
                "Reduce shopping by 20%",
                "Increase shopping by 20%",
            ]
        );
        assert!((specs[0].deltas.get("entertainment") + 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let spec = ScenarioSpec::new("mix")
            .with_delta("food", -30.0)
            .with_delta("shopping", 15.0);
        let first = run_scenario(&models(), &baseline(), &spec);
        let second = run_scenario(&models(), &baseline(), &spec);
        assert_eq!(first, second);
    }
}
