//! Rank-based comparisons: Mann-Whitney U and percentile ranks.
//!
//! The U test uses midranks for ties and the tie-corrected normal
//! approximation with a continuity correction, which matches standard
//! statistical software on the sample sizes this toolchain sees (tens to
//! a few thousand observations). Percentile ranks use the "mean"
//! convention: observations equal to the score count half.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::StatsError;

/// Result of a two-sided Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyTest {
    /// U statistic of the first sample.
    pub u: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Midranks (1-based, ties averaged) for the concatenation of both
/// samples.
#[allow(clippy::cast_precision_loss)]
fn midranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Average of 1-based ranks i+1 ..= j+1.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Two-sided Mann-Whitney U test comparing `first` against `second`.
///
/// # Errors
///
/// Returns [`StatsError::EmptyGroup`] when either sample is empty.
#[allow(clippy::cast_precision_loss)]
pub fn mann_whitney_u(first: &[f64], second: &[f64]) -> Result<MannWhitneyTest, StatsError> {
    if first.is_empty() || second.is_empty() {
        return Err(StatsError::EmptyGroup);
    }

    let n1 = first.len() as f64;
    let n2 = second.len() as f64;
    let n = n1 + n2;

    let combined: Vec<f64> = first.iter().chain(second.iter()).copied().collect();
    let ranks = midranks(&combined);

    let r1: f64 = ranks[..first.len()].iter().sum();
    let u = r1 - n1 * (n1 + 1.0) / 2.0;

    // Tie correction: sum of t^3 - t over tie groups.
    let mut sorted = combined.clone();
    sorted.sort_by(f64::total_cmp);
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        tie_term += t.powi(3) - t;
        i = j + 1;
    }

    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    // Every observation identical: no evidence either way.
    if sigma_sq <= 0.0 {
        return Ok(MannWhitneyTest { u, p_value: 1.0 });
    }

    let z = ((u - mu).abs() - 0.5).max(0.0) / sigma_sq.sqrt();
    let p_value = Normal::new(0.0, 1.0)
        .map_or(f64::NAN, |normal| 2.0 * (1.0 - normal.cdf(z)))
        .min(1.0);

    Ok(MannWhitneyTest { u, p_value })
}

/// Percentile rank of `score` within `distribution`, in `[0, 100]`,
/// counting equal observations half ("mean" convention).
///
/// # Errors
///
/// Returns [`StatsError::EmptyNullDistribution`] for an empty
/// distribution.
#[allow(clippy::cast_precision_loss)]
pub fn percentile_of_score(distribution: &[f64], score: f64) -> Result<f64, StatsError> {
    if distribution.is_empty() {
        return Err(StatsError::EmptyNullDistribution);
    }
    let below = distribution.iter().filter(|&&v| v < score).count() as f64;
    let equal = distribution.iter().filter(|&&v| v == score).count() as f64;
    Ok((below + equal / 2.0) / distribution.len() as f64 * 100.0)
}

/// Empirical upper-tail p-value of `observed` against a null
/// distribution: `1 - percentile/100`.
///
/// # Errors
///
/// Returns [`StatsError::EmptyNullDistribution`] for an empty
/// distribution; a rank against zero samples is meaningless and callers
/// must not coerce it to a number.
pub fn empirical_p_value(distribution: &[f64], observed: f64) -> Result<f64, StatsError> {
    Ok(1.0 - percentile_of_score(distribution, observed)? / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_samples_are_null() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let result = mann_whitney_u(&a, &a).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-9);
        // U equals its mean n1*n2/2 for identical samples.
        assert!((result.u - 32.0).abs() < 1e-9);
    }

    #[test]
    fn separated_samples_give_small_p() {
        let low: Vec<f64> = (0..20).map(f64::from).collect();
        let high: Vec<f64> = (100..120).map(f64::from).collect();
        let result = mann_whitney_u(&low, &high).unwrap();
        assert!(result.p_value < 1e-6);
        assert!(result.u.abs() < 1e-9);
    }

    #[test]
    fn u_statistics_are_complementary() {
        let a = [1.0, 4.0, 2.5, 7.0, 3.0];
        let b = [2.0, 5.0, 6.0, 8.0];
        let ab = mann_whitney_u(&a, &b).unwrap();
        let ba = mann_whitney_u(&b, &a).unwrap();
        let n1n2 = (a.len() * b.len()) as f64;
        assert!((ab.u + ba.u - n1n2).abs() < 1e-9);
        assert!((ab.p_value - ba.p_value).abs() < 1e-9);
    }

    #[test]
    fn empty_group_is_an_error() {
        assert_eq!(
            mann_whitney_u(&[], &[1.0]).unwrap_err(),
            StatsError::EmptyGroup
        );
        assert_eq!(
            mann_whitney_u(&[1.0], &[]).unwrap_err(),
            StatsError::EmptyGroup
        );
    }

    #[test]
    fn constant_data_is_null() {
        let a = [5.0; 10];
        let b = [5.0; 10];
        let result = mann_whitney_u(&a, &b).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn midranks_average_ties() {
        let ranks = midranks(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn percentile_mean_convention() {
        let dist = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile_of_score(&dist, 2.0).unwrap() - 37.5).abs() < 1e-9);
        assert!((percentile_of_score(&dist, 0.0).unwrap()).abs() < 1e-9);
        assert!((percentile_of_score(&dist, 5.0).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empirical_p_complements_percentile() {
        let dist = [1.0, 2.0, 3.0, 4.0];
        assert!((empirical_p_value(&dist, 5.0).unwrap()).abs() < 1e-9);
        assert!((empirical_p_value(&dist, 0.0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_distribution_is_an_error() {
        assert_eq!(
            empirical_p_value(&[], 1.0).unwrap_err(),
            StatsError::EmptyNullDistribution
        );
    }
}
