//! Domain models for Wellspring

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Financial metric: sum of every transaction in the week
pub const TOTAL_SPENDING: &str = "total_spending";
/// Financial metric: sum of transactions that are outliers for their category
pub const ANOMALY_SPENDING: &str = "anomaly_spending";
/// Financial metric: (income - spending) / income, only when income is known
pub const SAVINGS_RATE: &str = "savings_rate";

/// Metric names that configured categories may not shadow
pub const RESERVED_METRICS: &[&str] = &[TOTAL_SPENDING, ANOMALY_SPENDING, SAVINGS_RATE];

/// A single spending transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Free-form category from the upstream ledger (e.g. "Food", "self-care")
    pub category: String,
    /// Non-negative amount spent
    pub amount: f64,
}

impl Transaction {
    pub fn new(date: NaiveDate, category: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            category: category.into(),
            amount,
        }
    }
}

/// An income entry, used only for the savings rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub date: NaiveDate,
    pub amount: f64,
}

/// One daily wellbeing check-in. Every metric is in `[1, 10]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellbeingRecord {
    pub date: NaiveDate,
    pub overall_wellbeing: u8,
    pub sleep_quality: u8,
    pub physical_activity: u8,
    pub social_time: u8,
    pub diet_quality: u8,
    /// Lower is better, see [`WellbeingMetric::polarity`]
    pub stress_level: u8,
}

impl WellbeingRecord {
    /// Raw value of a metric on this record
    pub fn value(&self, metric: WellbeingMetric) -> u8 {
        match metric {
            WellbeingMetric::OverallWellbeing => self.overall_wellbeing,
            WellbeingMetric::SleepQuality => self.sleep_quality,
            WellbeingMetric::PhysicalActivity => self.physical_activity,
            WellbeingMetric::SocialTime => self.social_time,
            WellbeingMetric::DietQuality => self.diet_quality,
            WellbeingMetric::StressLevel => self.stress_level,
        }
    }
}

/// Whether a higher raw value is a better or a worse outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Convert a raw change into a change in outcome quality.
    /// Positive means the outcome got better.
    pub fn improvement(&self, raw_delta: f64) -> f64 {
        match self {
            Self::HigherIsBetter => raw_delta,
            Self::LowerIsBetter => -raw_delta,
        }
    }
}

/// The six tracked wellbeing metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellbeingMetric {
    OverallWellbeing,
    SleepQuality,
    PhysicalActivity,
    SocialTime,
    DietQuality,
    StressLevel,
}

impl WellbeingMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverallWellbeing => "overall_wellbeing",
            Self::SleepQuality => "sleep_quality",
            Self::PhysicalActivity => "physical_activity",
            Self::SocialTime => "social_time",
            Self::DietQuality => "diet_quality",
            Self::StressLevel => "stress_level",
        }
    }

    /// Human-readable label for recommendations and tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::OverallWellbeing => "overall wellbeing",
            Self::SleepQuality => "sleep quality",
            Self::PhysicalActivity => "physical activity",
            Self::SocialTime => "social time",
            Self::DietQuality => "diet quality",
            Self::StressLevel => "stress level",
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            Self::StressLevel => Polarity::LowerIsBetter,
            _ => Polarity::HigherIsBetter,
        }
    }

    /// All metrics in display order
    pub fn all() -> &'static [WellbeingMetric] {
        &[
            Self::OverallWellbeing,
            Self::SleepQuality,
            Self::PhysicalActivity,
            Self::SocialTime,
            Self::DietQuality,
            Self::StressLevel,
        ]
    }
}

impl std::str::FromStr for WellbeingMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "overall_wellbeing" | "overall" | "wellbeing" => Ok(Self::OverallWellbeing),
            "sleep_quality" | "sleep" => Ok(Self::SleepQuality),
            "physical_activity" | "activity" => Ok(Self::PhysicalActivity),
            "social_time" | "social" => Ok(Self::SocialTime),
            "diet_quality" | "diet" => Ok(Self::DietQuality),
            "stress_level" | "stress" => Ok(Self::StressLevel),
            _ => Err(format!("Unknown wellbeing metric: {}", s)),
        }
    }
}

impl std::fmt::Display for WellbeingMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ISO-8601 week (Monday start)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Monday of this week
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
    }
}

impl std::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Spending side of a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAggregate {
    pub total_spending: f64,
    /// Subtotal per configured category (every configured category is present)
    pub categories: BTreeMap<String, f64>,
    pub anomaly_spending: f64,
    pub savings_rate: Option<f64>,
    pub transaction_count: usize,
}

impl FinancialAggregate {
    /// Look up a financial metric by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            TOTAL_SPENDING => Some(self.total_spending),
            ANOMALY_SPENDING => Some(self.anomaly_spending),
            SAVINGS_RATE => self.savings_rate,
            _ => self.categories.get(name).copied(),
        }
    }

    /// Names of every metric this aggregate carries a value for
    pub fn metric_names(&self) -> Vec<String> {
        let mut names = vec![TOTAL_SPENDING.to_string()];
        names.extend(self.categories.keys().cloned());
        names.push(ANOMALY_SPENDING.to_string());
        if self.savings_rate.is_some() {
            names.push(SAVINGS_RATE.to_string());
        }
        names
    }
}

/// Wellbeing side of a week: mean of each metric over the week's check-ins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellbeingAggregate {
    pub overall_wellbeing: f64,
    pub sleep_quality: f64,
    pub physical_activity: f64,
    pub social_time: f64,
    pub diet_quality: f64,
    pub stress_level: f64,
    pub record_count: usize,
}

impl WellbeingAggregate {
    pub fn get(&self, metric: WellbeingMetric) -> f64 {
        match metric {
            WellbeingMetric::OverallWellbeing => self.overall_wellbeing,
            WellbeingMetric::SleepQuality => self.sleep_quality,
            WellbeingMetric::PhysicalActivity => self.physical_activity,
            WellbeingMetric::SocialTime => self.social_time,
            WellbeingMetric::DietQuality => self.diet_quality,
            WellbeingMetric::StressLevel => self.stress_level,
        }
    }
}

/// One aggregated week combining spending with mean wellbeing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDataPoint {
    pub week: WeekKey,
    pub financial: FinancialAggregate,
    pub wellbeing: WellbeingAggregate,
}

/// Mapping of financial metric name to value.
///
/// Missing metrics read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialVector(BTreeMap<String, f64>);

impl FinancialVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Vector of every metric available on a week
    pub fn from_point(point: &WeeklyDataPoint) -> Self {
        let mut vector = Self::new();
        for name in point.financial.metric_names() {
            if let Some(value) = point.financial.metric(&name) {
                vector.set(name, value);
            }
        }
        vector
    }

    /// Per-metric mean over a series, i.e. the "typical week".
    ///
    /// A metric missing from some weeks is averaged over the weeks that have it.
    pub fn mean_of(points: &[WeeklyDataPoint]) -> Self {
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for point in points {
            for (name, value) in FinancialVector::from_point(point).0 {
                let entry = sums.entry(name).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        Self(
            sums.into_iter()
                .map(|(name, (sum, count))| (name, sum / count as f64))
                .collect(),
        )
    }

    /// Component-wise `self + deltas`
    pub fn apply(&self, deltas: &FinancialVector) -> Self {
        let mut result = self.clone();
        for (name, delta) in deltas.iter() {
            let current = result.get(name);
            result.set(name.clone(), current + delta);
        }
        result
    }
}

impl FromIterator<(String, f64)> for FinancialVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wellbeing_metric_from_str() {
        assert_eq!(
            "sleep".parse::<WellbeingMetric>().unwrap(),
            WellbeingMetric::SleepQuality
        );
        assert_eq!(
            "Stress-Level".parse::<WellbeingMetric>().unwrap(),
            WellbeingMetric::StressLevel
        );
        assert!("happiness".parse::<WellbeingMetric>().is_err());
    }

    #[test]
    fn test_wellbeing_metric_serde() {
        let json = serde_json::to_string(&WellbeingMetric::DietQuality).unwrap();
        assert_eq!(json, r#""diet_quality""#);
    }

    #[test]
    fn test_polarity() {
        assert_eq!(
            WellbeingMetric::StressLevel.polarity(),
            Polarity::LowerIsBetter
        );
        for metric in WellbeingMetric::all() {
            if *metric != WellbeingMetric::StressLevel {
                assert_eq!(metric.polarity(), Polarity::HigherIsBetter);
            }
        }
        // Stress going down by one point is a one point improvement
        assert_eq!(Polarity::LowerIsBetter.improvement(-1.0), 1.0);
        assert_eq!(Polarity::HigherIsBetter.improvement(-1.0), -1.0);
    }

    #[test]
    fn test_week_key() {
        // 2024-01-01 is a Monday in ISO week 1
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(WeekKey::from_date(monday), WeekKey::from_date(sunday));
        assert_eq!(WeekKey::from_date(sunday).start_date(), Some(monday));
        assert_eq!(WeekKey::from_date(monday).to_string(), "2024-W01");

        // 2021-01-01 belongs to ISO week 53 of 2020
        let new_year = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(WeekKey::from_date(new_year), WeekKey { year: 2020, week: 53 });
    }

    #[test]
    fn test_financial_vector_apply() {
        let baseline = FinancialVector::new()
            .with("food", 100.0)
            .with("entertainment", 50.0);
        let deltas = FinancialVector::new()
            .with("entertainment", -20.0)
            .with("transport", 10.0);

        let result = baseline.apply(&deltas);
        assert_eq!(result.get("food"), 100.0);
        assert_eq!(result.get("entertainment"), 30.0);
        assert_eq!(result.get("transport"), 10.0);
        assert_eq!(result.get("missing"), 0.0);
    }
}
