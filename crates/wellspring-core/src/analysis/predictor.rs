//! Applying a trained model to a financial vector

use crate::models::FinancialVector;

use super::types::{Confidence, Contribution, Prediction, RegressionModel};

/// Confidence label from a model's R²: > 0.7 high, > 0.4 moderate, else low
pub fn confidence_from_r_squared(r_squared: f64) -> Confidence {
    if r_squared > 0.7 {
        Confidence::High
    } else if r_squared > 0.4 {
        Confidence::Moderate
    } else {
        Confidence::Low
    }
}

/// Predict the model's target for a financial vector.
///
/// Only the model's predictors are read; other keys are ignored and missing
/// ones count as zero. The predicted value is not clamped to the rating scale.
pub fn predict(model: &RegressionModel, vector: &FinancialVector) -> Prediction {
    let mut contributions: Vec<Contribution> = model
        .terms()
        .map(|(predictor, coefficient)| {
            let value = vector.get(predictor);
            Contribution {
                predictor: predictor.to_string(),
                value,
                impact: coefficient * value,
                percent_contribution: 0.0,
            }
        })
        .collect();

    let predicted = model.intercept + contributions.iter().map(|c| c.impact).sum::<f64>();

    let total_impact: f64 = contributions.iter().map(|c| c.impact.abs()).sum();
    if total_impact > 0.0 {
        for contribution in &mut contributions {
            contribution.percent_contribution = contribution.impact.abs() / total_impact * 100.0;
        }
    }

    contributions.sort_by(|a, b| {
        b.impact
            .abs()
            .total_cmp(&a.impact.abs())
            .then_with(|| a.predictor.cmp(&b.predictor))
    });

    Prediction {
        target: model.target,
        predicted,
        confidence: confidence_from_r_squared(model.r_squared),
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WellbeingMetric;

    fn model(terms: &[(&str, f64)], intercept: f64, r_squared: f64) -> RegressionModel {
        RegressionModel::from_parts(
            WellbeingMetric::OverallWellbeing,
            intercept,
            terms.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            r_squared,
        )
    }

    #[test]
    fn test_single_predictor_prediction() {
        let model = model(&[("entertainment", 0.02)], 6.0, 0.8);
        let vector = FinancialVector::new().with("entertainment", 50.0);

        let prediction = predict(&model, &vector);
        assert!((prediction.predicted - 7.0).abs() < 1e-12);
        assert_eq!(prediction.confidence, Confidence::High);
        assert_eq!(prediction.contributions.len(), 1);
        assert_eq!(prediction.contributions[0].predictor, "entertainment");
        assert!((prediction.contributions[0].percent_contribution - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_extra_keys_ignored_and_missing_default_to_zero() {
        let model = model(&[("food", -0.01), ("transport", 0.03)], 5.0, 0.5);
        let vector = FinancialVector::new()
            .with("food", 100.0)
            .with("shopping", 1000.0);

        let prediction = predict(&model, &vector);
        assert!((prediction.predicted - 4.0).abs() < 1e-12);
        assert_eq!(prediction.confidence, Confidence::Moderate);

        let transport = prediction
            .contributions
            .iter()
            .find(|c| c.predictor == "transport")
            .unwrap();
        assert_eq!(transport.value, 0.0);
        assert_eq!(transport.percent_contribution, 0.0);
    }

    #[test]
    fn test_contributions_ranked_by_magnitude() {
        let model = model(&[("a", 0.1), ("b", -0.5), ("c", 0.2)], 3.0, 0.3);
        let vector = FinancialVector::new()
            .with("a", 10.0)
            .with("b", 4.0)
            .with("c", 5.0);

        // impacts: a = 1.0, b = -2.0, c = 1.0
        let prediction = predict(&model, &vector);
        let order: Vec<&str> = prediction
            .contributions
            .iter()
            .map(|c| c.predictor.as_str())
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert!((prediction.contributions[0].percent_contribution - 50.0).abs() < 1e-9);
        assert!((prediction.contributions[1].percent_contribution - 25.0).abs() < 1e-9);
        assert_eq!(prediction.confidence, Confidence::Low);
    }

    #[test]
    fn test_all_zero_contributions() {
        let model = model(&[("a", 0.1), ("b", 0.2)], 6.5, 0.9);
        let prediction = predict(&model, &FinancialVector::new());

        assert_eq!(prediction.predicted, 6.5);
        assert!(prediction
            .contributions
            .iter()
            .all(|c| c.percent_contribution == 0.0));
    }

    #[test]
    fn test_prediction_not_clamped() {
        let model = model(&[("shopping", 0.05)], 6.0, 0.6);
        let prediction = predict(&model, &FinancialVector::new().with("shopping", 200.0));

        assert!((prediction.predicted - 16.0).abs() < 1e-12);
        assert!(prediction.is_out_of_range());
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence_from_r_squared(0.71), Confidence::High);
        assert_eq!(confidence_from_r_squared(0.7), Confidence::Moderate);
        assert_eq!(confidence_from_r_squared(0.41), Confidence::Moderate);
        assert_eq!(confidence_from_r_squared(0.4), Confidence::Low);
    }
}
