//! Small descriptive statistics shared by the absorbance and calibration code.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1). Zero for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Counts values whose modified z-score (median/MAD based) exceeds `threshold`.
///
/// Returns 0 when the MAD vanishes, since every value then sits on the median
/// or the spread is too small to judge.
pub fn count_mad_outliers(values: &[f64], threshold: f64) -> usize {
    if values.len() < 3 {
        return 0;
    }
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    if mad <= f64::EPSILON {
        return 0;
    }
    deviations
        .iter()
        .filter(|&&d| 0.6745 * d / mad > threshold)
        .count()
}

/// Two-sided 95% Student t critical value for `dof` degrees of freedom.
///
/// Falls back to the normal quantile for `dof == 0` and for `dof > 30`.
pub fn t_critical_95(dof: usize) -> f64 {
    const TABLE: [f64; 30] = [
        12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228,
        2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086,
        2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
    ];
    match dof {
        1..=30 => TABLE[dof - 1],
        _ => 1.96,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(sample_std_dev(&values), 2.138089935, epsilon = 1e-6);
        assert_eq!(sample_std_dev(&[1.0]), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_mad_outliers() {
        let values = [0.50, 0.51, 0.49, 0.50, 0.52, 0.95];
        assert_eq!(count_mad_outliers(&values, 3.5), 1);
        assert_eq!(count_mad_outliers(&[0.5, 0.5, 0.5, 0.5], 3.5), 0);
    }

    #[test]
    fn test_t_critical_fallbacks() {
        assert_relative_eq!(t_critical_95(2), 4.303);
        assert_relative_eq!(t_critical_95(0), 1.96);
        assert_relative_eq!(t_critical_95(120), 1.96);
    }
}
