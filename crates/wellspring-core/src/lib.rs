//! Wellspring Core Library
//!
//! Shared functionality for the Wellspring spending / wellbeing tool:
//! - Domain models for transactions, check-ins and weekly aggregates
//! - CSV import for transactions, wellbeing check-ins and income
//! - Analysis configuration (category rules, thresholds)
//! - Correlation, regression, prediction and what-if scenarios

pub mod analysis;
pub mod config;
pub mod error;
pub mod import;
pub mod models;

pub use analysis::{
    AnalysisInput, AnalysisReport, Confidence, Contribution, CorrelationEngine,
    CorrelationResult, Direction, ModelStatus, Prediction, RegressionModel, RegressionTrainer,
    ScenarioOutcome, ScenarioSpec, Strength, UnavailableReason, WeeklyAggregator,
    WellbeingAnalyzer,
};
pub use config::{AnalysisConfig, CategoryRule, ConfigSource, PatternType};
pub use error::{Error, Result};
pub use models::{
    FinancialAggregate, FinancialVector, IncomeRecord, Polarity, Transaction, WeekKey,
    WeeklyDataPoint, WellbeingAggregate, WellbeingMetric, WellbeingRecord,
};
