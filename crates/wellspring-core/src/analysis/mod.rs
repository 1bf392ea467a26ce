//! Spending / wellbeing analysis
//!
//! Turns raw transactions and daily check-ins into weekly series, finds the
//! spending metrics that move with each wellbeing metric, fits small linear
//! models on them and answers what-if questions.
//!
//! ## Stages
//!
//! - **Aggregate** - one [`WeeklyDataPoint`](crate::models::WeeklyDataPoint) per ISO week
//! - **Correlate** - Pearson r for every (financial, wellbeing) metric pair
//! - **Train** - OLS model per wellbeing metric on its top correlates
//! - **Predict** - apply a model to a financial vector
//! - **Scenario** - compare predictions for baseline and baseline + deltas
//!
//! Every stage is a pure function of its inputs. Nothing here does I/O.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wellspring_core::analysis::{AnalysisInput, WellbeingAnalyzer};
//!
//! let analyzer = WellbeingAnalyzer::new(config);
//! let report = analyzer.analyze(&AnalysisInput::new(&transactions, &checkins), &[]);
//! ```

pub mod aggregate;
pub mod correlation;
pub mod pipeline;
pub mod predictor;
pub mod regression;
pub mod scenario;
pub mod stats;
pub mod types;

pub use aggregate::WeeklyAggregator;
pub use correlation::{rank, top_n, top_predictors, CorrelationEngine};
pub use pipeline::{AnalysisInput, AnalysisReport, WellbeingAnalyzer};
pub use predictor::{confidence_from_r_squared, predict};
pub use regression::RegressionTrainer;
pub use scenario::{run_scenario, run_scenarios, suggest_scenarios};
pub use types::{
    Confidence, Contribution, CorrelationResult, Direction, ModelStatus, Prediction,
    RegressionModel, ScenarioOutcome, ScenarioSpec, Strength, UnavailableReason,
};
