use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::models::{CorrelationResult, Descriptive, LinearFit, TTestResult};

/// Compute the mean of a slice (no NaN handling).
pub fn mean(xs: &[f64]) -> f64 {
    let mut sum = 0.0;
    for &v in xs {
        sum += v;
    }
    sum / (xs.len() as f64)
}

/// Sample variance (ddof = 1). NaN below two observations.
pub fn sample_variance(xs: &[f64], mean: f64) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mut ss = 0.0;
    for &v in xs {
        let d = v - mean;
        ss += d * d;
    }

    ss / ((n - 1) as f64)
}

pub fn sample_sd(xs: &[f64]) -> f64 {
    sample_variance(xs, mean(xs)).sqrt()
}

pub fn describe(xs: &[f64]) -> Option<Descriptive> {
    if xs.is_empty() {
        return None;
    }

    let mean = mean(xs);
    let sd = sample_variance(xs, mean).sqrt();
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Descriptive {
        n: xs.len(),
        mean,
        sd,
        min,
        max,
    })
}

/// Keep only the positions where both series have a value.
pub fn pairwise_complete(xs: &[Option<f64>], ys: &[Option<f64>]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

/// Pearson correlation over complete pairs. None below two pairs or when
/// either series is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();
    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    Some(sxy / (sxx * syy).sqrt())
}

/// Fisher-transform confidence interval for a Pearson coefficient.
/// Requires at least four pairs.
pub fn pearson_ci(r: f64, n: usize, confidence: f64) -> Option<(f64, f64)> {
    if n < 4 {
        return None;
    }

    let z = r.atanh();
    let se = 1.0 / ((n as f64) - 3.0).sqrt();
    let normal = Normal::new(0.0, 1.0).ok()?;
    let q = normal.inverse_cdf(0.5 + confidence / 2.0);

    Some(((z - q * se).tanh(), (z + q * se).tanh()))
}

pub fn correlate(pairs: &[(f64, f64)]) -> Option<CorrelationResult> {
    let r = pearson(pairs)?;
    Some(CorrelationResult {
        r,
        n: pairs.len(),
        ci: pearson_ci(r, pairs.len(), 0.95),
    })
}

/// Ordinary least squares fit of y on x.
pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<LinearFit> {
    if pairs.len() < 2 {
        return None;
    }

    let xs: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();
    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Welch's two-sample t-test with a two-sided p-value from the Student's t
/// distribution at the Welch-Satterthwaite degrees of freedom. Requires two
/// observations per group and a nonzero standard error.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TTestResult> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let mean_a = mean(a);
    let mean_b = mean(b);
    let var_a = sample_variance(a, mean_a);
    let var_b = sample_variance(b, mean_b);
    let n_a = a.len() as f64;
    let n_b = b.len() as f64;

    let se_sq = var_a / n_a + var_b / n_b;
    if se_sq == 0.0 {
        return None;
    }

    let t = (mean_a - mean_b) / se_sq.sqrt();
    let df = se_sq * se_sq
        / ((var_a / n_a).powi(2) / (n_a - 1.0) + (var_b / n_b).powi(2) / (n_b - 1.0));

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = 2.0 * dist.cdf(-t.abs());

    Some(TTestResult {
        t,
        df,
        p_value,
        mean_a,
        mean_b,
        n_a: a.len(),
        n_b: b.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_sd_match_hand_computation() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        let expected_sd = (32.0f64 / 7.0).sqrt();
        assert!((sample_sd(&xs) - expected_sd).abs() < 1e-12);
    }

    #[test]
    fn describe_reports_range_and_count() {
        let d = describe(&[0.1, 0.5, 0.3]).unwrap();
        assert_eq!(d.n, 3);
        assert!((d.min - 0.1).abs() < 1e-12);
        assert!((d.max - 0.5).abs() < 1e-12);
        assert!((d.mean - 0.3).abs() < 1e-12);
    }

    #[test]
    fn describe_is_empty_for_no_data() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn pairwise_complete_drops_missing_positions() {
        let xs = [Some(1.0), None, Some(3.0)];
        let ys = [Some(2.0), Some(5.0), None];
        assert_eq!(pairwise_complete(&xs, &ys), vec![(1.0, 2.0)]);
    }

    #[test]
    fn pearson_of_exact_line_is_one() {
        let pairs: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let r = pearson(&pairs).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_matches_known_value() {
        let pairs = vec![(1.0, 2.0), (2.0, 1.0), (3.0, 4.0), (4.0, 3.0), (5.0, 5.0)];
        let r = pearson(&pairs).unwrap();
        assert!((r - 0.8).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_undefined_for_constant_series() {
        let pairs = vec![(1.0, 2.0), (1.0, 3.0), (1.0, 4.0)];
        assert!(pearson(&pairs).is_none());
    }

    #[test]
    fn confidence_interval_brackets_the_coefficient() {
        let (low, high) = pearson_ci(0.8, 20, 0.95).unwrap();
        assert!(low < 0.8 && 0.8 < high);
        assert!((-1.0..=1.0).contains(&low));
        assert!((-1.0..=1.0).contains(&high));
    }

    #[test]
    fn confidence_interval_needs_four_pairs() {
        assert!(pearson_ci(0.5, 3, 0.95).is_none());
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let pairs: Vec<(f64, f64)> = (0..8).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let fit = linear_fit(&pairs).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn welch_is_null_for_identical_groups() {
        let a = [0.1, 0.2, 0.3, 0.4];
        let result = welch_t_test(&a, &a).unwrap();
        assert!(result.t.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn welch_matches_reference_case() {
        // scipy.stats.ttest_ind(a, b, equal_var=False)
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let result = welch_t_test(&a, &b).unwrap();
        assert!((result.t - (-1.8973665961010275)).abs() < 1e-9);
        assert!((result.df - 5.882352941176471).abs() < 1e-9);
        assert!((result.p_value - 0.10753119493062714).abs() < 1e-6);
    }

    #[test]
    fn welch_needs_two_observations_per_group() {
        assert!(welch_t_test(&[1.0], &[2.0, 3.0]).is_none());
    }
}
