//! Core types for the analysis pipeline

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{FinancialVector, WellbeingMetric};

/// Magnitude class of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// Fixed thresholds: |r| < 0.3 weak, < 0.6 moderate, otherwise strong
    pub fn from_r(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < 0.3 {
            Strength::Weak
        } else if magnitude < 0.6 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sign of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r < 0.0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence label shared by correlations (sample size) and predictions (R²)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Moderate => "moderate",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Correlation between one financial metric and one wellbeing metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub financial_metric: String,
    pub wellbeing_metric: WellbeingMetric,
    /// Pearson r, always within [-1, 1]
    pub coefficient: f64,
    pub strength: Strength,
    pub direction: Direction,
    /// Number of weeks the coefficient was computed over
    pub sample_size: usize,
    pub confidence: Confidence,
}

impl CorrelationResult {
    /// Whether more of this spending goes with a better outcome,
    /// taking the wellbeing metric's polarity into account
    pub fn is_beneficial(&self) -> bool {
        self.wellbeing_metric
            .polarity()
            .improvement(self.coefficient)
            > 0.0
    }
}

/// Ordinary least squares model for one wellbeing metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    pub target: WellbeingMetric,
    /// Predictor names, in fitting order
    pub predictors: Vec<String>,
    /// One coefficient per predictor, same order as `predictors`
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub r_squared: f64,
    /// `None` when there are no residual degrees of freedom
    pub adjusted_r_squared: Option<f64>,
    /// Residual sum of squares on the training data
    pub ss_residual: f64,
    /// Weeks the model was trained on
    pub sample_size: usize,
}

impl RegressionModel {
    /// Build a model from known parameters (no training data)
    pub fn from_parts(
        target: WellbeingMetric,
        intercept: f64,
        terms: Vec<(String, f64)>,
        r_squared: f64,
    ) -> Self {
        let (predictors, coefficients) = terms.into_iter().unzip();
        Self {
            target,
            predictors,
            coefficients,
            intercept,
            r_squared,
            adjusted_r_squared: None,
            ss_residual: 0.0,
            sample_size: 0,
        }
    }

    /// Coefficient for a predictor, if the model uses it
    pub fn coefficient(&self, predictor: &str) -> Option<f64> {
        self.predictors
            .iter()
            .position(|p| p == predictor)
            .map(|i| self.coefficients[i])
    }

    /// (predictor, coefficient) pairs in fitting order
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.predictors
            .iter()
            .map(String::as_str)
            .zip(self.coefficients.iter().copied())
    }
}

/// Why a model could not be trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Not enough weeks for the number of predictors
    InsufficientData { required: usize, available: usize },
    /// No financial metric correlated above the noise floor
    NoSignificantCorrelations,
    /// Constant target or collinear predictors
    DegenerateInput { detail: String },
    /// A predictor name the data does not carry
    InvalidMetric { detail: String },
}

impl From<Error> for UnavailableReason {
    fn from(err: Error) -> Self {
        match err {
            Error::InsufficientData {
                required,
                available,
            } => Self::InsufficientData {
                required,
                available,
            },
            Error::InvalidMetric(detail) => Self::InvalidMetric { detail },
            other => Self::DegenerateInput {
                detail: other.to_string(),
            },
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "not enough data yet ({} of {} weeks needed)",
                available, required
            ),
            Self::NoSignificantCorrelations => {
                write!(f, "no spending pattern correlates with this metric yet")
            }
            Self::DegenerateInput { detail } => write!(f, "data too uniform to model: {}", detail),
            Self::InvalidMetric { detail } => write!(f, "{}", detail),
        }
    }
}

/// A trained model, or the displayable reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelStatus {
    Trained(RegressionModel),
    Unavailable { reason: UnavailableReason },
}

impl ModelStatus {
    pub fn model(&self) -> Option<&RegressionModel> {
        match self {
            ModelStatus::Trained(model) => Some(model),
            ModelStatus::Unavailable { .. } => None,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self, ModelStatus::Trained(_))
    }

    /// Predict with the model when there is one; `None` means unavailable
    pub fn predict(&self, vector: &FinancialVector) -> Option<Prediction> {
        self.model()
            .map(|model| super::predictor::predict(model, vector))
    }
}

/// Share of a prediction attributable to one predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub predictor: String,
    /// Input value the prediction used (0 when absent from the vector)
    pub value: f64,
    /// `coefficient * value`
    pub impact: f64,
    /// `|impact| / sum(|impact|) * 100`
    pub percent_contribution: f64,
}

/// Output of applying a model to a financial vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub target: WellbeingMetric,
    /// Not clamped; see [`Prediction::is_out_of_range`]
    pub predicted: f64,
    pub confidence: Confidence,
    /// Ranked by |impact|, largest first
    pub contributions: Vec<Contribution>,
}

impl Prediction {
    /// Whether the prediction left the [1, 10] rating scale
    pub fn is_out_of_range(&self) -> bool {
        !(1.0..=10.0).contains(&self.predicted)
    }
}

/// A named hypothetical change to spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    /// Change per financial metric; unspecified metrics are unchanged
    pub deltas: FinancialVector,
}

impl ScenarioSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deltas: FinancialVector::new(),
        }
    }

    pub fn with_delta(mut self, metric: impl Into<String>, delta: f64) -> Self {
        self.deltas.set(metric, delta);
        self
    }
}

/// Predicted wellbeing response to a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub deltas: FinancialVector,
    /// Predicted raw change per modeled wellbeing metric
    pub predicted_deltas: BTreeMap<WellbeingMetric, f64>,
    /// Metric with the largest absolute predicted change
    pub dominant_metric: Option<WellbeingMetric>,
    pub recommendation: String,
}
