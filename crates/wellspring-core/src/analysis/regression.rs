//! Ordinary least squares training

use tracing::debug;

use crate::config::RegressionConfig;
use crate::error::{Error, Result};
use crate::models::{WeeklyDataPoint, WellbeingMetric};

use super::correlation::{financial_series, wellbeing_series, CorrelationEngine};
use super::stats;
use super::types::RegressionModel;

/// Fits `target = intercept + sum(coefficient_i * predictor_i)` over a weekly series
#[derive(Debug, Clone)]
pub struct RegressionTrainer {
    config: RegressionConfig,
}

impl Default for RegressionTrainer {
    fn default() -> Self {
        Self::new(RegressionConfig::default())
    }
}

impl RegressionTrainer {
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Weeks required to train on `predictors` predictors
    pub fn required_samples(&self, predictors: usize) -> usize {
        predictors + 1 + self.config.min_residual_dof
    }

    /// Train a model for `target` on the named financial predictors.
    ///
    /// Errors (never panics) with:
    /// - `InvalidMetric` when `predictors` is empty or names a metric the
    ///   series does not carry for every week
    /// - `InsufficientData` when there are too few weeks
    /// - `DegenerateInput` when the target is constant or the predictors
    ///   are collinear
    pub fn train(
        &self,
        points: &[WeeklyDataPoint],
        target: WellbeingMetric,
        predictors: &[String],
    ) -> Result<RegressionModel> {
        if predictors.is_empty() {
            return Err(Error::InvalidMetric(
                "At least one predictor is required".into(),
            ));
        }

        let n = points.len();
        let required = self.required_samples(predictors.len());
        if n < required {
            return Err(Error::InsufficientData {
                required,
                available: n,
            });
        }

        let known = CorrelationEngine::financial_metrics(points);
        let columns = predictors
            .iter()
            .map(|name| {
                if !known.contains(name) {
                    return Err(Error::InvalidMetric(format!(
                        "Unknown financial metric: {}",
                        name
                    )));
                }
                financial_series(points, name).ok_or_else(|| {
                    Error::InvalidMetric(format!("Metric {} missing for some weeks", name))
                })
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let y = wellbeing_series(points, target);
        if stats::is_constant(&y) {
            return Err(Error::DegenerateInput(format!(
                "{} has zero variance",
                target
            )));
        }

        let design = design_matrix(n, &columns);

        let beta = solve_least_squares(
            design.clone(),
            y.clone(),
            self.config.collinearity_tolerance,
        )?;

        let ss_residual: f64 = design
            .iter()
            .zip(&y)
            .map(|(row, actual)| {
                let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
                (actual - fitted).powi(2)
            })
            .sum();
        let ss_total = stats::sum_of_squares(&y);
        let r_squared = 1.0 - ss_residual / ss_total;

        let p = predictors.len();
        let adjusted_r_squared = if n > p + 1 {
            Some(1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / (n - p - 1) as f64)
        } else {
            None
        };

        debug!(
            target = target.as_str(),
            predictors = ?predictors,
            weeks = n,
            r_squared,
            "Trained regression model"
        );

        Ok(RegressionModel {
            target,
            predictors: predictors.to_vec(),
            coefficients: beta[1..].to_vec(),
            intercept: beta[0],
            r_squared,
            adjusted_r_squared,
            ss_residual,
            sample_size: n,
        })
    }

    /// Pick up to `limit` candidates, in order, skipping any whose column is
    /// a linear combination of the intercept and the ones already picked.
    ///
    /// Candidates missing from some weeks are skipped as well.
    pub fn select_independent(
        &self,
        points: &[WeeklyDataPoint],
        candidates: &[String],
        limit: usize,
    ) -> Vec<String> {
        let mut selected = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for name in candidates {
            if selected.len() >= limit {
                break;
            }
            let Some(column) = financial_series(points, name) else {
                continue;
            };
            columns.push(column);

            let design = design_matrix(points.len(), &columns);
            let probe = vec![0.0; points.len()];
            if solve_least_squares(design, probe, self.config.collinearity_tolerance).is_ok() {
                selected.push(name.clone());
            } else {
                debug!(predictor = %name, "Skipping dependent predictor");
                columns.pop();
            }
        }

        selected
    }
}

/// Intercept column followed by one column per predictor, row-major
fn design_matrix(rows: usize, columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|i| {
            let mut row = Vec::with_capacity(columns.len() + 1);
            row.push(1.0);
            row.extend(columns.iter().map(|col| col[i]));
            row
        })
        .collect()
}

/// Solve `min |A x - b|` by Householder QR.
///
/// `a` is row-major with at least as many rows as columns. A column whose
/// norm after removing the earlier columns falls to `tolerance` times its
/// original norm makes the matrix rank deficient.
fn solve_least_squares(mut a: Vec<Vec<f64>>, mut b: Vec<f64>, tolerance: f64) -> Result<Vec<f64>> {
    let m = a.len();
    let k = a.first().map_or(0, Vec::len);
    if m < k {
        return Err(Error::InsufficientData {
            required: k,
            available: m,
        });
    }

    let original_norms: Vec<f64> = (0..k)
        .map(|j| a.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt())
        .collect();

    for j in 0..k {
        let norm = (j..m).map(|i| a[i][j] * a[i][j]).sum::<f64>().sqrt();
        if norm == 0.0 || norm <= tolerance * original_norms[j] {
            return Err(Error::DegenerateInput(format!(
                "design matrix is rank deficient (column {} is collinear)",
                j
            )));
        }

        // Reflect onto -sign(a_jj) * norm to avoid cancellation
        let alpha = if a[j][j] > 0.0 { -norm } else { norm };
        let mut v: Vec<f64> = (j..m).map(|i| a[i][j]).collect();
        v[0] -= alpha;
        let v_norm_sq: f64 = v.iter().map(|x| x * x).sum();

        for col in j..k {
            let dot: f64 = v.iter().enumerate().map(|(t, vi)| vi * a[j + t][col]).sum();
            let factor = 2.0 * dot / v_norm_sq;
            for (t, vi) in v.iter().enumerate() {
                a[j + t][col] -= factor * vi;
            }
        }

        let dot: f64 = v.iter().enumerate().map(|(t, vi)| vi * b[j + t]).sum();
        let factor = 2.0 * dot / v_norm_sq;
        for (t, vi) in v.iter().enumerate() {
            b[j + t] -= factor * vi;
        }
    }

    // Back substitution on the upper triangle
    let mut x = vec![0.0; k];
    for j in (0..k).rev() {
        let tail: f64 = ((j + 1)..k).map(|c| a[j][c] * x[c]).sum();
        x[j] = (b[j] - tail) / a[j][j];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(Error::DegenerateInput(
            "least squares solution is not finite".into(),
        ))
    }
}
