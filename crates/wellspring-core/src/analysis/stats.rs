//! Small descriptive statistics helpers

/// Relative standard deviation below which a series counts as constant.
/// Means like 19/3 repeated do not cancel exactly, so exact zero is too strict.
const ZERO_VARIANCE_RELATIVE: f64 = 1e-10;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` for an empty slice
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sum of squared deviations from the mean
pub fn sum_of_squares(values: &[f64]) -> f64 {
    match mean(values) {
        Some(avg) => values.iter().map(|v| (v - avg).powi(2)).sum(),
        None => 0.0,
    }
}

/// Whether a series has (numerically) zero variance
pub fn is_constant(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
    let variance = sum_of_squares(values) / values.len() as f64;
    variance.sqrt() <= ZERO_VARIANCE_RELATIVE * scale
}

/// Pearson correlation coefficient.
///
/// Returns `None` when the series differ in length, have fewer than two
/// points, or either one has zero variance. The result is always finite and
/// within `[-1, 1]`.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || is_constant(x) || is_constant(y) {
        return None;
    }

    let mx = mean(x)?;
    let my = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];

        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_series() {
        let x = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&x, &[5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &x), None);

        // Repeated non-terminating means must still count as constant
        let third = 19.0 / 3.0;
        assert!(is_constant(&[third; 7]));
        assert_eq!(pearson(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], &[third; 7]), None);
    }

    #[test]
    fn test_pearson_length_mismatch_and_short() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[], &[]), None);
    }

    #[test]
    fn test_pearson_symmetric_and_bounded_on_random_series() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..500 {
            let n = rng.random_range(2..40);
            let x: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..500.0)).collect();
            let y: Vec<f64> = (0..n).map(|_| rng.random_range(1.0..10.0)).collect();

            let Some(r) = pearson(&x, &y) else {
                continue;
            };
            assert!(r.is_finite());
            assert!((-1.0..=1.0).contains(&r), "r out of range: {}", r);
            assert_eq!(pearson(&y, &x), Some(r));
        }
    }
}
