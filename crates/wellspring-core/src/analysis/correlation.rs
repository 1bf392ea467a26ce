//! Correlation between spending metrics and wellbeing metrics

use tracing::debug;

use crate::config::CorrelationConfig;
use crate::error::{Error, Result};
use crate::models::{WeeklyDataPoint, WellbeingMetric, SAVINGS_RATE};

use super::stats;
use super::types::{Confidence, CorrelationResult, Direction, Strength};

/// Computes and classifies Pearson correlations over a weekly series
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Financial metrics present in every week of the series.
    ///
    /// The savings rate only qualifies when income was known for every week.
    pub fn financial_metrics(points: &[WeeklyDataPoint]) -> Vec<String> {
        let Some(first) = points.first() else {
            return Vec::new();
        };
        first
            .financial
            .metric_names()
            .into_iter()
            .filter(|name| points.iter().all(|p| p.financial.metric(name).is_some()))
            .collect()
    }

    /// Correlate every (financial, wellbeing) pair.
    ///
    /// Pairs with a constant series are left out, as are results under the
    /// configured |r| floor. Output is in metric order; use [`rank`] or
    /// [`top_n`] to order by strength.
    pub fn correlate_all(&self, points: &[WeeklyDataPoint]) -> Vec<CorrelationResult> {
        let mut results = Vec::new();
        let mut degenerate = 0usize;
        let mut below_floor = 0usize;

        for financial in Self::financial_metrics(points) {
            let Some(x) = financial_series(points, &financial) else {
                continue;
            };
            for &metric in WellbeingMetric::all() {
                let y = wellbeing_series(points, metric);
                match self.measure(&financial, metric, &x, &y) {
                    Some(result) if result.coefficient.abs() >= self.config.min_abs_r => {
                        results.push(result)
                    }
                    Some(_) => below_floor += 1,
                    None => degenerate += 1,
                }
            }
        }

        debug!(
            weeks = points.len(),
            kept = results.len(),
            degenerate,
            below_floor,
            "Correlation analysis complete"
        );

        results
    }

    /// Correlate a single pair without applying the noise floor.
    ///
    /// `Ok(None)` means the pair is degenerate. An unknown financial metric
    /// name is an error, except on an empty series: the known names come
    /// from the weeks themselves, so with no weeks the name is not checked
    /// and the result is `Ok(None)`.
    pub fn correlate_pair(
        &self,
        points: &[WeeklyDataPoint],
        financial: &str,
        wellbeing: WellbeingMetric,
    ) -> Result<Option<CorrelationResult>> {
        if points.is_empty() {
            return Ok(None);
        }
        let known = Self::financial_metrics(points);
        if !known.iter().any(|m| m == financial) {
            if financial == SAVINGS_RATE {
                // Known metric, just not available for every week
                return Ok(None);
            }
            return Err(Error::InvalidMetric(format!(
                "Unknown financial metric: {}",
                financial
            )));
        }

        let Some(x) = financial_series(points, financial) else {
            return Ok(None);
        };
        let y = wellbeing_series(points, wellbeing);
        Ok(self.measure(financial, wellbeing, &x, &y))
    }

    fn measure(
        &self,
        financial: &str,
        wellbeing: WellbeingMetric,
        x: &[f64],
        y: &[f64],
    ) -> Option<CorrelationResult> {
        let r = stats::pearson(x, y)?;
        Some(CorrelationResult {
            financial_metric: financial.to_string(),
            wellbeing_metric: wellbeing,
            coefficient: r,
            strength: Strength::from_r(r),
            direction: Direction::from_r(r),
            sample_size: x.len(),
            confidence: self.confidence_for(x.len()),
        })
    }

    /// Sample-size confidence; small samples are low regardless of |r|
    pub fn confidence_for(&self, sample_size: usize) -> Confidence {
        if sample_size < self.config.low_confidence_below {
            Confidence::Low
        } else if sample_size >= self.config.high_confidence_from {
            Confidence::High
        } else {
            Confidence::Moderate
        }
    }
}

/// Values of one financial metric across the series, if every week has it
pub fn financial_series(points: &[WeeklyDataPoint], name: &str) -> Option<Vec<f64>> {
    points.iter().map(|p| p.financial.metric(name)).collect()
}

/// Weekly means of one wellbeing metric
pub fn wellbeing_series(points: &[WeeklyDataPoint], metric: WellbeingMetric) -> Vec<f64> {
    points.iter().map(|p| p.wellbeing.get(metric)).collect()
}

/// Sort by |r| descending; ties by financial metric name, then wellbeing metric
pub fn rank(results: &mut [CorrelationResult]) {
    results.sort_by(|a, b| {
        b.coefficient
            .abs()
            .total_cmp(&a.coefficient.abs())
            .then_with(|| a.financial_metric.cmp(&b.financial_metric))
            .then_with(|| a.wellbeing_metric.cmp(&b.wellbeing_metric))
    });
}

/// The `n` strongest correlations
pub fn top_n(results: &[CorrelationResult], n: usize) -> Vec<CorrelationResult> {
    let mut ranked = results.to_vec();
    rank(&mut ranked);
    ranked.truncate(n);
    ranked
}

/// Financial metrics most strongly correlated with one wellbeing metric
pub fn top_predictors(
    results: &[CorrelationResult],
    metric: WellbeingMetric,
    n: usize,
) -> Vec<String> {
    let mut for_metric: Vec<CorrelationResult> = results
        .iter()
        .filter(|r| r.wellbeing_metric == metric)
        .cloned()
        .collect();
    rank(&mut for_metric);
    for_metric
        .into_iter()
        .take(n)
        .map(|r| r.financial_metric)
        .collect()
}
