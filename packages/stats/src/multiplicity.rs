//! Multiple-testing correction for the sliding-window reports.

/// Benjamini-Hochberg p-value threshold at false-discovery rate `alpha`.
///
/// Returns the largest p-value `p_(i)` (sorted ascending) satisfying
/// `p_(i) <= (i / m) * alpha`, or `0.0` when no p-value passes. NaN
/// entries (windows where the test was undefined) are excluded from the
/// ranking rather than counted as tests.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn benjamini_hochberg_threshold(p_values: &[f64], alpha: f64) -> f64 {
    let mut sorted: Vec<f64> = p_values.iter().copied().filter(|p| !p.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);

    let m = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .filter(|(i, p)| **p <= (*i as f64 + 1.0) / m * alpha)
        .map(|(_, p)| *p)
        .fold(0.0, f64::max)
}
