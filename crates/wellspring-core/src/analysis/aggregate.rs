//! Weekly aggregation of raw transactions and check-ins

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::config::{AnalysisConfig, CategoryRule};
use crate::models::{
    FinancialAggregate, IncomeRecord, Transaction, WeekKey, WeeklyDataPoint, WellbeingAggregate,
    WellbeingMetric, WellbeingRecord,
};

use super::stats;

/// Groups records into ISO weeks and summarises each week
pub struct WeeklyAggregator<'a> {
    categories: &'a [CategoryRule],
    anomaly_std_devs: f64,
}

#[derive(Default)]
struct WeekBucket<'r> {
    transactions: Vec<&'r Transaction>,
    records: Vec<&'r WellbeingRecord>,
    income: f64,
}

impl<'a> WeeklyAggregator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self::with_categories(&config.categories, config.aggregation.anomaly_std_devs)
    }

    pub fn with_categories(categories: &'a [CategoryRule], anomaly_std_devs: f64) -> Self {
        Self {
            categories,
            anomaly_std_devs,
        }
    }

    /// Build one data point per week that has both spending and check-ins.
    ///
    /// Weeks with only one side are dropped, never interpolated. Multiple
    /// check-ins on the same day all count toward the weekly mean. The
    /// savings rate is only computed when `income` is supplied.
    pub fn aggregate(
        &self,
        transactions: &[Transaction],
        wellbeing: &[WellbeingRecord],
        income: Option<&[IncomeRecord]>,
    ) -> Vec<WeeklyDataPoint> {
        let thresholds = self.anomaly_thresholds(transactions);

        let mut weeks: BTreeMap<WeekKey, WeekBucket<'_>> = BTreeMap::new();
        for tx in transactions {
            weeks
                .entry(WeekKey::from_date(tx.date))
                .or_default()
                .transactions
                .push(tx);
        }
        for record in wellbeing {
            weeks
                .entry(WeekKey::from_date(record.date))
                .or_default()
                .records
                .push(record);
        }
        if let Some(income) = income {
            for entry in income {
                weeks
                    .entry(WeekKey::from_date(entry.date))
                    .or_default()
                    .income += entry.amount;
            }
        }

        let total_weeks = weeks.len();
        let points: Vec<WeeklyDataPoint> = weeks
            .into_iter()
            .filter(|(_, bucket)| !bucket.transactions.is_empty() && !bucket.records.is_empty())
            .map(|(week, bucket)| WeeklyDataPoint {
                week,
                financial: self.financial_aggregate(&bucket, &thresholds, income.is_some()),
                wellbeing: wellbeing_aggregate(&bucket.records),
            })
            .collect();

        debug!(
            weeks = points.len(),
            dropped = total_weeks - points.len(),
            "Aggregated weekly data points"
        );

        points
    }

    /// Per transaction category: amount above which a transaction is anomalous
    fn anomaly_thresholds(&self, transactions: &[Transaction]) -> HashMap<String, f64> {
        let mut amounts: HashMap<String, Vec<f64>> = HashMap::new();
        for tx in transactions {
            amounts
                .entry(normalize_category(&tx.category))
                .or_default()
                .push(tx.amount);
        }

        amounts
            .into_iter()
            .filter_map(|(category, values)| {
                let mean = stats::mean(&values)?;
                let std_dev = stats::std_dev(&values)?;
                Some((category, mean + self.anomaly_std_devs * std_dev))
            })
            .collect()
    }

    fn financial_aggregate(
        &self,
        bucket: &WeekBucket<'_>,
        thresholds: &HashMap<String, f64>,
        income_supplied: bool,
    ) -> FinancialAggregate {
        let mut categories: BTreeMap<String, f64> = self
            .categories
            .iter()
            .map(|rule| (rule.name.clone(), 0.0))
            .collect();

        let mut total_spending = 0.0;
        let mut anomaly_spending = 0.0;

        for tx in &bucket.transactions {
            total_spending += tx.amount;

            if let Some(rule) = self.categories.iter().find(|r| r.matches(&tx.category)) {
                if let Some(subtotal) = categories.get_mut(&rule.name) {
                    *subtotal += tx.amount;
                }
            }

            let is_anomaly = thresholds
                .get(&normalize_category(&tx.category))
                .is_some_and(|threshold| tx.amount > *threshold);
            if is_anomaly {
                anomaly_spending += tx.amount;
            }
        }

        let savings_rate = if income_supplied && bucket.income > 0.0 {
            Some((bucket.income - total_spending) / bucket.income)
        } else {
            None
        };

        FinancialAggregate {
            total_spending,
            categories,
            anomaly_spending,
            savings_rate,
            transaction_count: bucket.transactions.len(),
        }
    }
}

fn wellbeing_aggregate(records: &[&WellbeingRecord]) -> WellbeingAggregate {
    let count = records.len() as f64;
    let mean_of = |metric: WellbeingMetric| {
        records
            .iter()
            .map(|r| f64::from(r.value(metric)))
            .sum::<f64>()
            / count
    };

    WellbeingAggregate {
        overall_wellbeing: mean_of(WellbeingMetric::OverallWellbeing),
        sleep_quality: mean_of(WellbeingMetric::SleepQuality),
        physical_activity: mean_of(WellbeingMetric::PhysicalActivity),
        social_time: mean_of(WellbeingMetric::SocialTime),
        diet_quality: mean_of(WellbeingMetric::DietQuality),
        stress_level: mean_of(WellbeingMetric::StressLevel),
        record_count: records.len(),
    }
}

fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternType;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn checkin(date: NaiveDate, overall: u8, stress: u8) -> WellbeingRecord {
        WellbeingRecord {
            date,
            overall_wellbeing: overall,
            sleep_quality: 5,
            physical_activity: 5,
            social_time: 5,
            diet_quality: 5,
            stress_level: stress,
        }
    }

    #[test]
    fn test_empty_input() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);
        assert!(aggregator.aggregate(&[], &[], None).is_empty());
    }

    #[test]
    fn test_groups_by_iso_week_in_order() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);

        // Week of 2024-01-08 listed before week of 2024-01-01
        let transactions = vec![
            Transaction::new(date(2024, 1, 9), "food", 30.0),
            Transaction::new(date(2024, 1, 1), "food", 10.0),
            Transaction::new(date(2024, 1, 7), "Entertainment", 20.0),
        ];
        let checkins = vec![
            checkin(date(2024, 1, 10), 8, 3),
            checkin(date(2024, 1, 2), 6, 5),
        ];

        let points = aggregator.aggregate(&transactions, &checkins, None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].week.to_string(), "2024-W01");
        assert_eq!(points[1].week.to_string(), "2024-W02");

        assert_eq!(points[0].financial.total_spending, 30.0);
        assert_eq!(points[0].financial.categories["food"], 10.0);
        assert_eq!(points[0].financial.categories["entertainment"], 20.0);
        assert_eq!(points[0].financial.categories["shopping"], 0.0);
        assert_eq!(points[0].financial.transaction_count, 2);
        assert_eq!(points[1].financial.total_spending, 30.0);
    }

    #[test]
    fn test_drops_weeks_missing_either_side() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);

        let transactions = vec![
            Transaction::new(date(2024, 1, 1), "food", 10.0),
            Transaction::new(date(2024, 1, 15), "food", 10.0),
        ];
        let checkins = vec![
            checkin(date(2024, 1, 2), 6, 5),
            checkin(date(2024, 1, 9), 7, 5),
        ];

        let points = aggregator.aggregate(&transactions, &checkins, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].week.week, 1);
    }

    #[test]
    fn test_same_day_checkins_are_averaged() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);

        let transactions = vec![Transaction::new(date(2024, 1, 1), "food", 10.0)];
        let checkins = vec![
            checkin(date(2024, 1, 3), 4, 8),
            checkin(date(2024, 1, 3), 8, 2),
            checkin(date(2024, 1, 4), 9, 2),
        ];

        let points = aggregator.aggregate(&transactions, &checkins, None);
        assert_eq!(points[0].wellbeing.record_count, 3);
        assert_eq!(points[0].wellbeing.overall_wellbeing, 7.0);
        assert_eq!(points[0].wellbeing.stress_level, 4.0);
    }

    #[test]
    fn test_anomaly_spending_uses_full_history() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);

        // Ten ordinary $20 food purchases across two weeks, then one $200 splurge.
        // mean = 36.36, population stddev = 51.7, threshold = 139.8
        let mut transactions = Vec::new();
        for day in 1..=10 {
            transactions.push(Transaction::new(date(2024, 1, day), "food", 20.0));
        }
        transactions.push(Transaction::new(date(2024, 1, 11), "food", 200.0));
        // A single large purchase in its own category is never anomalous
        transactions.push(Transaction::new(date(2024, 1, 2), "shopping", 500.0));

        let checkins = vec![
            checkin(date(2024, 1, 3), 6, 5),
            checkin(date(2024, 1, 10), 6, 5),
        ];

        let points = aggregator.aggregate(&transactions, &checkins, None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].financial.anomaly_spending, 0.0);
        assert_eq!(points[1].financial.anomaly_spending, 200.0);
    }

    #[test]
    fn test_savings_rate_only_with_income() {
        let config = AnalysisConfig::default();
        let aggregator = WeeklyAggregator::new(&config);

        let transactions = vec![Transaction::new(date(2024, 1, 1), "food", 250.0)];
        let checkins = vec![checkin(date(2024, 1, 2), 6, 5)];
        let income = vec![IncomeRecord {
            date: date(2024, 1, 5),
            amount: 1000.0,
        }];

        let without = aggregator.aggregate(&transactions, &checkins, None);
        assert_eq!(without[0].financial.savings_rate, None);

        let with = aggregator.aggregate(&transactions, &checkins, Some(&income));
        assert_eq!(with[0].financial.savings_rate, Some(0.75));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            CategoryRule::new("dining", "restaurant|cafe", PatternType::Contains).unwrap(),
            CategoryRule::new("food", "food|restaurant", PatternType::Contains).unwrap(),
        ];
        let aggregator = WeeklyAggregator::with_categories(&rules, 2.0);

        let transactions = vec![
            Transaction::new(date(2024, 1, 1), "Restaurant", 40.0),
            Transaction::new(date(2024, 1, 1), "Food - groceries", 60.0),
            Transaction::new(date(2024, 1, 1), "Fuel", 15.0),
        ];
        let checkins = vec![checkin(date(2024, 1, 1), 6, 5)];

        let points = aggregator.aggregate(&transactions, &checkins, None);
        let financial = &points[0].financial;
        assert_eq!(financial.categories["dining"], 40.0);
        assert_eq!(financial.categories["food"], 60.0);
        // Unmatched spending still counts toward the total
        assert_eq!(financial.total_spending, 115.0);
    }
}
