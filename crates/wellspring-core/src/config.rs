//! Analysis configuration
//!
//! Thresholds and the category vocabulary used by the analysis pipeline.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/wellspring/config/analysis.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Every field is optional in the file; anything missing keeps its default.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RESERVED_METRICS;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analysis.toml");

/// Categories used when the caller supplies none
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "entertainment",
    "food",
    "shopping",
    "self-care",
    "transport",
    "other",
];

/// How a category rule matches a transaction's category string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Exact string match (case-insensitive)
    Exact,
    /// Case-insensitive substring match (supports | for OR)
    Contains,
    /// Regular expression match
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contains" => Ok(Self::Contains),
            "regex" => Ok(Self::Regex),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// A named spending category and the rule that selects its transactions
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub pattern: String,
    pub pattern_type: PatternType,
    regex: Option<Regex>,
}

impl CategoryRule {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        pattern_type: PatternType,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let regex = match pattern_type {
            PatternType::Regex => Some(Regex::new(&format!("(?i){}", pattern))?),
            _ => None,
        };
        Ok(Self {
            name: name.into(),
            pattern,
            pattern_type,
            regex,
        })
    }

    /// Rule matching a category string equal to `name`
    pub fn exact(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            pattern: name.clone(),
            name,
            pattern_type: PatternType::Exact,
            regex: None,
        }
    }

    /// Check whether a transaction category belongs to this rule
    pub fn matches(&self, category: &str) -> bool {
        let category = category.trim();
        match self.pattern_type {
            PatternType::Exact => category.eq_ignore_ascii_case(self.pattern.trim()),
            PatternType::Contains => {
                let upper = category.to_uppercase();
                self.pattern
                    .split('|')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .any(|p| upper.contains(&p.to_uppercase()))
            }
            PatternType::Regex => self
                .regex
                .as_ref()
                .is_some_and(|re| re.is_match(category)),
        }
    }
}

/// Weekly aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationConfig {
    /// `k` in `mean + k * stddev` for anomalous transactions
    pub anomaly_std_devs: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            anomaly_std_devs: 2.0,
        }
    }
}

/// Correlation engine settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationConfig {
    /// Results with |r| below this are dropped as noise
    pub min_abs_r: f64,
    /// Sample sizes below this are always low confidence
    pub low_confidence_below: usize,
    /// Sample sizes at or above this are high confidence
    pub high_confidence_from: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_abs_r: 0.2,
            low_confidence_below: 5,
            high_confidence_from: 10,
        }
    }
}

/// Regression trainer settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionConfig {
    /// Number of top-correlated financial metrics used as predictors
    pub max_predictors: usize,
    /// Residual degrees of freedom required beyond the fitted parameters.
    /// 1 means `weeks >= predictors + 2`.
    pub min_residual_dof: usize,
    /// Relative column norm below which the design matrix is rank deficient
    pub collinearity_tolerance: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            max_predictors: 3,
            min_residual_dof: 1,
            collinearity_tolerance: 1e-8,
        }
    }
}

/// What-if scenario settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioConfig {
    /// Relative change used for suggested scenarios (0.2 = +/-20%)
    pub suggestion_fraction: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            suggestion_fraction: 0.2,
        }
    }
}

/// Full analysis configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub categories: Vec<CategoryRule>,
    pub aggregation: AggregationConfig,
    pub correlation: CorrelationConfig,
    pub regression: RegressionConfig,
    pub scenario: ScenarioConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|name| CategoryRule::exact(*name))
                .collect(),
            aggregation: AggregationConfig::default(),
            correlation: CorrelationConfig::default(),
            regression: RegressionConfig::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => write!(f, "built-in defaults"),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration (explicit path or override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), "Loaded analysis config override");
                Ok((Self::from_toml(&content)?, ConfigSource::File(path)))
            }
            None => Ok((Self::from_toml(DEFAULT_CONFIG)?, ConfigSource::Embedded)),
        }
    }

    /// Parse config from TOML content, filling gaps with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(aggregation) = raw.aggregation {
            if let Some(k) = aggregation.anomaly_std_devs {
                config.aggregation.anomaly_std_devs = k;
            }
        }

        if let Some(correlation) = raw.correlation {
            if let Some(min_abs_r) = correlation.min_abs_r {
                config.correlation.min_abs_r = min_abs_r;
            }
            if let Some(low) = correlation.low_confidence_below {
                config.correlation.low_confidence_below = low;
            }
            if let Some(high) = correlation.high_confidence_from {
                config.correlation.high_confidence_from = high;
            }
        }

        if let Some(regression) = raw.regression {
            if let Some(max_predictors) = regression.max_predictors {
                config.regression.max_predictors = max_predictors;
            }
            if let Some(dof) = regression.min_residual_dof {
                config.regression.min_residual_dof = dof;
            }
            if let Some(tolerance) = regression.collinearity_tolerance {
                config.regression.collinearity_tolerance = tolerance;
            }
        }

        if let Some(scenario) = raw.scenario {
            if let Some(fraction) = scenario.suggestion_fraction {
                config.scenario.suggestion_fraction = fraction;
            }
        }

        if let Some(categories) = raw.categories {
            config.categories = categories
                .into_iter()
                .map(|raw| {
                    let pattern_type = match raw.match_type.as_deref() {
                        Some(s) => s.parse::<PatternType>().map_err(Error::Config)?,
                        None => PatternType::Exact,
                    };
                    let pattern = raw.pattern.unwrap_or_else(|| raw.name.clone());
                    CategoryRule::new(raw.name, pattern, pattern_type)
                })
                .collect::<Result<Vec<_>>>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.categories {
            let name = rule.name.trim();
            if name.is_empty() {
                return Err(Error::Config("Category name cannot be empty".into()));
            }
            if RESERVED_METRICS.contains(&name) {
                return Err(Error::Config(format!(
                    "Category name '{}' is reserved for a built-in metric",
                    name
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(Error::Config(format!("Duplicate category: {}", name)));
            }
        }

        if !(self.aggregation.anomaly_std_devs >= 0.0) {
            return Err(Error::Config(
                "aggregation.anomaly_std_devs must be >= 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.correlation.min_abs_r) {
            return Err(Error::Config(
                "correlation.min_abs_r must be within [0, 1]".into(),
            ));
        }
        if self.correlation.high_confidence_from < self.correlation.low_confidence_below {
            return Err(Error::Config(
                "correlation.high_confidence_from must be >= low_confidence_below".into(),
            ));
        }
        if self.regression.max_predictors == 0 {
            return Err(Error::Config("regression.max_predictors must be >= 1".into()));
        }
        if self.regression.min_residual_dof == 0 {
            return Err(Error::Config(
                "regression.min_residual_dof must be >= 1 (weeks >= predictors + 2)".into(),
            ));
        }
        if !(self.regression.collinearity_tolerance > 0.0) {
            return Err(Error::Config(
                "regression.collinearity_tolerance must be > 0".into(),
            ));
        }
        if !(self.scenario.suggestion_fraction > 0.0) {
            return Err(Error::Config(
                "scenario.suggestion_fraction must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Names of the configured categories, in rule order
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|r| r.name.clone()).collect()
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("wellspring").join("config").join("analysis.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    aggregation: Option<RawAggregation>,
    correlation: Option<RawCorrelation>,
    regression: Option<RawRegression>,
    scenario: Option<RawScenario>,
    categories: Option<Vec<RawCategory>>,
}

#[derive(Debug, Deserialize)]
struct RawAggregation {
    anomaly_std_devs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCorrelation {
    min_abs_r: Option<f64>,
    low_confidence_below: Option<usize>,
    high_confidence_from: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawRegression {
    max_predictors: Option<usize>,
    min_residual_dof: Option<usize>,
    collinearity_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawScenario {
    suggestion_fraction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    name: String,
    pattern: Option<String>,
    #[serde(rename = "match")]
    match_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = AnalysisConfig::from_toml(DEFAULT_CONFIG).unwrap();
        let defaults = AnalysisConfig::default();

        assert_eq!(config.category_names(), defaults.category_names());
        assert_eq!(config.aggregation, defaults.aggregation);
        assert_eq!(config.correlation, defaults.correlation);
        assert_eq!(config.regression, defaults.regression);
        assert_eq!(config.scenario, defaults.scenario);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            [correlation]
            min_abs_r = 0.35
            "#,
        )
        .unwrap();

        assert_eq!(config.correlation.min_abs_r, 0.35);
        assert_eq!(config.correlation.low_confidence_below, 5);
        assert_eq!(config.regression.max_predictors, 3);
        assert_eq!(config.categories.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_custom_categories() {
        let config = AnalysisConfig::from_toml(
            r#"
            [[categories]]
            name = "dining"
            pattern = "restaurant|takeout"
            match = "contains"

            [[categories]]
            name = "travel"
            pattern = "^(flight|hotel)"
            match = "regex"
            "#,
        )
        .unwrap();

        assert_eq!(config.category_names(), vec!["dining", "travel"]);
        assert!(config.categories[0].matches("Takeout"));
        assert!(!config.categories[0].matches("groceries"));
        assert!(config.categories[1].matches("Hotel stay"));
        assert!(!config.categories[1].matches("airport hotel"));
    }

    #[test]
    fn test_rejects_reserved_and_duplicate_names() {
        let reserved = AnalysisConfig::from_toml(
            r#"
            [[categories]]
            name = "total_spending"
            "#,
        );
        assert!(matches!(reserved, Err(Error::Config(_))));

        let duplicate = AnalysisConfig::from_toml(
            r#"
            [[categories]]
            name = "food"
            [[categories]]
            name = "food"
            "#,
        );
        assert!(matches!(duplicate, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_invalid_regex() {
        let result = AnalysisConfig::from_toml(
            r#"
            [[categories]]
            name = "broken"
            pattern = "(unclosed"
            match = "regex"
            "#,
        );
        assert!(matches!(result, Err(Error::Regex(_))));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let result = AnalysisConfig::from_toml(
            r#"
            [regression]
            max_predictors = 0
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));

        // Zero residual dof would let a model interpolate p + 1 weeks exactly
        let result = AnalysisConfig::from_toml(
            r#"
            [regression]
            min_residual_dof = 0
            "#,
        );
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("min_residual_dof"), "{}", msg),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_exact_rule_is_case_insensitive() {
        let rule = CategoryRule::exact("self-care");
        assert!(rule.matches("Self-Care"));
        assert!(rule.matches(" self-care "));
        assert!(!rule.matches("self care"));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "[aggregation]\nanomaly_std_devs = 3.0\n").unwrap();

        let (config, source) = AnalysisConfig::load(Some(&path)).unwrap();
        assert_eq!(config.aggregation.anomaly_std_devs, 3.0);
        assert_eq!(source, ConfigSource::File(path));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = AnalysisConfig::load(Some(Path::new("/nonexistent/analysis.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
