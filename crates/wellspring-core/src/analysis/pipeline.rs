//! End-to-end analysis run
//!
//! Chains aggregation, correlation, training, prediction and scenarios for
//! one set of inputs. A metric that cannot be modeled degrades to
//! [`ModelStatus::Unavailable`] without affecting the others.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::models::{
    FinancialVector, IncomeRecord, Transaction, WeekKey, WeeklyDataPoint, WellbeingMetric,
    WellbeingRecord,
};

use super::aggregate::WeeklyAggregator;
use super::correlation::{rank, top_predictors, CorrelationEngine};
use super::regression::RegressionTrainer;
use super::scenario::{run_scenarios, suggest_scenarios};
use super::types::{
    CorrelationResult, ModelStatus, Prediction, RegressionModel, ScenarioOutcome, ScenarioSpec,
    UnavailableReason,
};

/// Raw inputs for one run (one user, one date range)
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub transactions: &'a [Transaction],
    pub wellbeing: &'a [WellbeingRecord],
    pub income: Option<&'a [IncomeRecord]>,
}

impl<'a> AnalysisInput<'a> {
    pub fn new(transactions: &'a [Transaction], wellbeing: &'a [WellbeingRecord]) -> Self {
        Self {
            transactions,
            wellbeing,
            income: None,
        }
    }

    pub fn with_income(mut self, income: &'a [IncomeRecord]) -> Self {
        self.income = Some(income);
        self
    }
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub first_week: Option<WeekKey>,
    pub last_week: Option<WeekKey>,
    pub weeks_analyzed: usize,
    /// Ranked strongest first
    pub correlations: Vec<CorrelationResult>,
    pub models: BTreeMap<WellbeingMetric, ModelStatus>,
    /// Predictions for the most recent week, for trained models only
    pub predictions: BTreeMap<WellbeingMetric, Prediction>,
    /// Mean week used as the scenario baseline
    pub baseline: FinancialVector,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl AnalysisReport {
    /// Trained models keyed by target metric
    pub fn trained_models(&self) -> BTreeMap<WellbeingMetric, RegressionModel> {
        trained(&self.models)
    }
}

/// Stateless analysis service built from a configuration
#[derive(Debug, Clone)]
pub struct WellbeingAnalyzer {
    config: AnalysisConfig,
    correlations: CorrelationEngine,
    trainer: RegressionTrainer,
}

impl Default for WellbeingAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl WellbeingAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            correlations: CorrelationEngine::new(config.correlation.clone()),
            trainer: RegressionTrainer::new(config.regression.clone()),
            config,
        }
    }

    /// Weekly series for the inputs
    pub fn aggregate(&self, input: &AnalysisInput<'_>) -> Vec<WeeklyDataPoint> {
        WeeklyAggregator::new(&self.config).aggregate(
            input.transactions,
            input.wellbeing,
            input.income,
        )
    }

    /// All correlations above the floor, strongest first
    pub fn correlate(&self, points: &[WeeklyDataPoint]) -> Vec<CorrelationResult> {
        let mut results = self.correlations.correlate_all(points);
        rank(&mut results);
        results
    }

    /// Train one model per wellbeing metric on its top correlates.
    ///
    /// Predictors are the strongest correlates for the metric, skipping any
    /// that are collinear with a stronger one, up to `max_predictors`.
    pub fn train_models(
        &self,
        points: &[WeeklyDataPoint],
        correlations: &[CorrelationResult],
    ) -> BTreeMap<WellbeingMetric, ModelStatus> {
        WellbeingMetric::all()
            .iter()
            .map(|&metric| (metric, self.train_metric(points, correlations, metric)))
            .collect()
    }

    /// Train the model for a single metric
    pub fn train_metric(
        &self,
        points: &[WeeklyDataPoint],
        correlations: &[CorrelationResult],
        metric: WellbeingMetric,
    ) -> ModelStatus {
        let candidates = top_predictors(correlations, metric, correlations.len());
        let predictors = self.trainer.select_independent(
            points,
            &candidates,
            self.config.regression.max_predictors,
        );
        if predictors.is_empty() {
            debug!(target_metric = metric.as_str(), "No correlated predictors");
            return ModelStatus::Unavailable {
                reason: UnavailableReason::NoSignificantCorrelations,
            };
        }

        match self.trainer.train(points, metric, &predictors) {
            Ok(model) => ModelStatus::Trained(model),
            Err(e) => {
                debug!(
                    target_metric = metric.as_str(),
                    error = %e,
                    "Model unavailable"
                );
                ModelStatus::Unavailable { reason: e.into() }
            }
        }
    }

    /// Run the full pipeline.
    ///
    /// When `scenarios` is empty, suggested scenarios are generated from the
    /// predictors of the trained models.
    pub fn analyze(&self, input: &AnalysisInput<'_>, scenarios: &[ScenarioSpec]) -> AnalysisReport {
        let points = self.aggregate(input);
        self.analyze_points(&points, scenarios)
    }

    /// Run the pipeline on an already aggregated series
    pub fn analyze_points(
        &self,
        points: &[WeeklyDataPoint],
        scenarios: &[ScenarioSpec],
    ) -> AnalysisReport {
        let correlations = self.correlate(points);
        let models = self.train_models(points, &correlations);
        let trained_models = trained(&models);

        let predictions = match points.last() {
            Some(latest) => {
                let vector = FinancialVector::from_point(latest);
                models
                    .iter()
                    .filter_map(|(metric, status)| {
                        status.predict(&vector).map(|p| (*metric, p))
                    })
                    .collect()
            }
            None => BTreeMap::new(),
        };

        let baseline = FinancialVector::mean_of(points);
        let scenario_outcomes = if scenarios.is_empty() {
            let suggested = suggest_scenarios(
                &trained_models,
                &baseline,
                self.config.scenario.suggestion_fraction,
            );
            run_scenarios(&trained_models, &baseline, &suggested)
        } else {
            run_scenarios(&trained_models, &baseline, scenarios)
        };

        info!(
            weeks = points.len(),
            correlations = correlations.len(),
            models = trained_models.len(),
            scenarios = scenario_outcomes.len(),
            "Analysis complete"
        );

        AnalysisReport {
            first_week: points.first().map(|p| p.week),
            last_week: points.last().map(|p| p.week),
            weeks_analyzed: points.len(),
            correlations,
            models,
            predictions,
            baseline,
            scenarios: scenario_outcomes,
        }
    }
}

fn trained(
    models: &BTreeMap<WellbeingMetric, ModelStatus>,
) -> BTreeMap<WellbeingMetric, RegressionModel> {
    models
        .iter()
        .filter_map(|(metric, status)| status.model().map(|m| (*metric, m.clone())))
        .collect()
}
