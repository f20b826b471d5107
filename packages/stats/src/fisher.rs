//! Fisher's exact test and the conditional odds ratio for 2x2 tables.
//!
//! The test conditions on both margins: cell `a` follows a (noncentral)
//! hypergeometric distribution, and everything here is computed from its
//! log-space weight vector. The reported odds ratio is the conditional
//! maximum-likelihood estimate (the `psi` whose noncentral mean equals
//! the observed cell), not the cross-product ratio, with a Cornfield
//! exact confidence interval obtained by inverting the tail
//! probabilities.
//!
//! Tables with a zero cell (but positive margins) switch to the
//! Haldane-Anscombe convention for the odds ratio and its interval:
//! 0.5 is added to every cell and a log-odds normal interval is used.
//! The p-value stays exact in both regimes.

use epi_zone_models::ContingencyTable;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::factorial::ln_binomial;

use crate::StatsError;

/// Confidence level for the odds-ratio interval.
const CONFIDENCE: f64 = 0.95;

/// Relative tolerance when comparing hypergeometric probabilities for
/// the two-sided tail sum.
const PMF_RELATIVE_EPS: f64 = 1e-7;

/// Result of the exact association test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactTestResult {
    /// Two-sided exact p-value.
    pub p_value: f64,
    /// Conditional maximum-likelihood odds ratio (Haldane-Anscombe
    /// estimate for zero-cell tables). May be `f64::INFINITY`.
    pub odds_ratio: f64,
    /// Lower bound of the 95% confidence interval.
    pub ci_lower: f64,
    /// Upper bound of the 95% confidence interval. May be `f64::INFINITY`.
    pub ci_upper: f64,
}

/// The conditional distribution of cell `a` given both margins.
///
/// Support runs over the feasible values of `a`; `ln_coeffs[i]` is the
/// log hypergeometric coefficient for `x = x_min + i`. Multiplying the
/// coefficients by `psi^x` yields Fisher's noncentral hypergeometric
/// weights.
struct Conditional {
    x_min: u64,
    ln_coeffs: Vec<f64>,
}

#[allow(clippy::cast_precision_loss)]
impl Conditional {
    fn new(table: &ContingencyTable) -> Self {
        let n1 = table.treatment_total();
        let n2 = table.control_total();
        let k = table.inside_total();

        let x_min = k.saturating_sub(n2);
        let x_max = n1.min(k);

        let ln_coeffs = (x_min..=x_max)
            .map(|x| ln_binomial(n1, x) + ln_binomial(n2, k - x))
            .collect();

        Self { x_min, ln_coeffs }
    }

    /// Normalized weights at log odds ratio `ln_psi`.
    fn weights(&self, ln_psi: f64) -> Vec<f64> {
        let ln_weights: Vec<f64> = self
            .ln_coeffs
            .iter()
            .enumerate()
            .map(|(i, &ln_c)| {
                let x = (self.x_min + i as u64) as f64;
                ln_psi.mul_add(x, ln_c)
            })
            .collect();
        let max = ln_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let unnormalized: Vec<f64> = ln_weights.iter().map(|&lw| (lw - max).exp()).collect();
        let total: f64 = unnormalized.iter().sum();
        unnormalized.iter().map(|w| w / total).collect()
    }

    fn mean(&self, ln_psi: f64) -> f64 {
        self.weights(ln_psi)
            .iter()
            .enumerate()
            .map(|(i, w)| (self.x_min + i as u64) as f64 * w)
            .sum()
    }

    /// `P(X >= x0)` under `ln_psi`.
    fn tail_ge(&self, x0: u64, ln_psi: f64) -> f64 {
        self.weights(ln_psi)
            .iter()
            .enumerate()
            .filter(|(i, _)| self.x_min + *i as u64 >= x0)
            .map(|(_, w)| w)
            .sum()
    }

    /// `P(X <= x0)` under `ln_psi`.
    fn tail_le(&self, x0: u64, ln_psi: f64) -> f64 {
        self.weights(ln_psi)
            .iter()
            .enumerate()
            .filter(|(i, _)| self.x_min + *i as u64 <= x0)
            .map(|(_, w)| w)
            .sum()
    }
}

/// Bisection over `ln_psi` for a function increasing in `ln_psi`.
///
/// Returns the odds ratio (not its log). Falls back to the boundary value
/// when the root lies outside the search interval.
fn solve_increasing(f: impl Fn(f64) -> f64, lo_value: f64, hi_value: f64) -> f64 {
    let mut lo = -50.0_f64;
    let mut hi = 50.0_f64;
    if f(lo) > 0.0 {
        return lo_value;
    }
    if f(hi) < 0.0 {
        return hi_value;
    }
    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        if f(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    ((lo + hi) / 2.0).exp()
}

fn standard_normal_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |n| n.inverse_cdf(p))
}

/// Two-sided Fisher exact test with a conditional odds ratio and 95%
/// confidence interval.
///
/// # Errors
///
/// Returns [`StatsError::InsufficientData`] when any margin of the table
/// is zero; the conditional distribution is degenerate there and the
/// test is undefined.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn exact_association_test(table: &ContingencyTable) -> Result<ExactTestResult, StatsError> {
    if table.has_zero_margin() {
        return Err(StatsError::InsufficientData {
            a: table.a,
            b: table.b,
            c: table.c,
            d: table.d,
        });
    }

    let cond = Conditional::new(table);
    let a = table.a;
    let idx = (a - cond.x_min) as usize;

    // Two-sided p: total probability of all tables no more likely than
    // the observed one, at psi = 1.
    let pmf = cond.weights(0.0);
    let threshold = pmf[idx] * (1.0 + PMF_RELATIVE_EPS);
    let p_value = pmf
        .iter()
        .filter(|&&w| w <= threshold)
        .sum::<f64>()
        .min(1.0);

    let (odds_ratio, ci_lower, ci_upper) = if table.has_zero_cell() {
        haldane_anscombe(table)
    } else {
        let alpha = (1.0 - CONFIDENCE) / 2.0;
        let target = a as f64;
        let or = solve_increasing(|t| cond.mean(t) - target, 0.0, f64::INFINITY);
        // P(X >= a) grows with psi, P(X <= a) shrinks; inverting each
        // tail at alpha/2 gives the exact interval.
        let lower = solve_increasing(|t| cond.tail_ge(a, t) - alpha, 0.0, f64::INFINITY);
        let upper = solve_increasing(|t| alpha - cond.tail_le(a, t), 0.0, f64::INFINITY);
        (or, lower, upper)
    };

    Ok(ExactTestResult {
        p_value,
        odds_ratio,
        ci_lower,
        ci_upper,
    })
}

/// Haldane-Anscombe adjusted odds ratio and log-normal interval for
/// tables with a zero cell.
#[allow(clippy::cast_precision_loss)]
fn haldane_anscombe(table: &ContingencyTable) -> (f64, f64, f64) {
    let a = table.a as f64 + 0.5;
    let b = table.b as f64 + 0.5;
    let c = table.c as f64 + 0.5;
    let d = table.d as f64 + 0.5;

    let or = (a * d) / (b * c);
    let se = (1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d).sqrt();
    let z = standard_normal_quantile(1.0 - (1.0 - CONFIDENCE) / 2.0);

    let lower = z.mul_add(-se, or.ln()).exp();
    let upper = z.mul_add(se, or.ln()).exp();
    (or, lower, upper)
}
