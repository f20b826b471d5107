//! Cases-prevented estimation from a 2x2 table.
//!
//! Uses the proportion-based method: the control zone's inside
//! proportion is applied to the treatment column to get the count
//! expected under no intervention effect, and the shortfall of the
//! observed count against that expectation is the estimate of cases
//! prevented. A 95% Clopper-Pearson interval on the control proportion
//! propagates linearly to the expected count and to the estimate.
//!
//! When there are no control cases at all the proportion is undefined;
//! every field of the result is NaN. Callers must treat NaN as "not
//! estimable", which is distinct from a computed zero effect.

use epi_zone_models::ContingencyTable;
use statrs::distribution::{Beta, ContinuousCDF};

/// Cases-prevented estimate with its confidence bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CasesPrevented {
    /// Observed proportion of control cases inside the control zone.
    pub p_control: f64,
    /// Expected treatment-zone count under no effect.
    pub expected_treatment: f64,
    /// Lower 95% bound on the expected count.
    pub expected_lower: f64,
    /// Upper 95% bound on the expected count.
    pub expected_upper: f64,
    /// Estimated cases prevented (expected minus observed `a`).
    pub prevented: f64,
    /// Lower 95% bound on cases prevented.
    pub prevented_lower: f64,
    /// Upper 95% bound on cases prevented.
    pub prevented_upper: f64,
}

impl CasesPrevented {
    /// Whether the estimate is undefined (no control cases in the window).
    #[must_use]
    pub fn is_estimable(&self) -> bool {
        !self.prevented.is_nan()
    }

    const fn not_estimable() -> Self {
        Self {
            p_control: f64::NAN,
            expected_treatment: f64::NAN,
            expected_lower: f64::NAN,
            expected_upper: f64::NAN,
            prevented: f64::NAN,
            prevented_lower: f64::NAN,
            prevented_upper: f64::NAN,
        }
    }
}

fn beta_quantile(shape_a: f64, shape_b: f64, p: f64) -> f64 {
    Beta::new(shape_a, shape_b).map_or(f64::NAN, |beta| beta.inverse_cdf(p))
}

/// Exact (Clopper-Pearson) 95% interval for a binomial proportion with
/// `successes` out of `trials`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn clopper_pearson(successes: u64, trials: u64) -> (f64, f64) {
    let k = successes as f64;
    let n = trials as f64;

    let lower = if successes == 0 {
        0.0
    } else {
        beta_quantile(k, n - k + 1.0, 0.025)
    };
    let upper = if successes == trials {
        1.0
    } else {
        beta_quantile(k + 1.0, n - k, 0.975)
    };
    (lower, upper)
}

/// Estimates cases prevented in the treatment zone.
///
/// Returns a NaN-filled result (never an error) when the control column
/// is empty; see the module docs for the contract.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn estimate_cases_prevented(table: &ContingencyTable) -> CasesPrevented {
    let total_control = table.control_total();
    if total_control == 0 {
        return CasesPrevented::not_estimable();
    }

    let total_treatment = table.treatment_total() as f64;
    let observed = table.a as f64;

    let p_control = table.b as f64 / total_control as f64;
    let expected_treatment = p_control * total_treatment;

    let (p_lower, p_upper) = clopper_pearson(table.b, total_control);
    let expected_lower = p_lower * total_treatment;
    let expected_upper = p_upper * total_treatment;

    CasesPrevented {
        p_control,
        expected_treatment,
        expected_lower,
        expected_upper,
        prevented: expected_treatment - observed,
        prevented_lower: expected_lower - observed,
        prevented_upper: expected_upper - observed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_control_cases_is_not_estimable() {
        let table = ContingencyTable::new(3, 0, 5, 0);
        let est = estimate_cases_prevented(&table);
        assert!(!est.is_estimable());
        assert!(est.prevented.is_nan());
        assert!(est.expected_treatment.is_nan());
    }

    #[test]
    fn balanced_table_prevents_nothing() {
        let table = ContingencyTable::new(10, 10, 10, 10);
        let est = estimate_cases_prevented(&table);
        assert!((est.p_control - 0.5).abs() < 1e-12);
        assert!((est.expected_treatment - 10.0).abs() < 1e-12);
        assert!(est.prevented.abs() < 1e-12);
    }

    #[test]
    fn shortfall_counts_as_prevented() {
        // Control: 8/16 inside. Expected treatment inside = 0.5 * 12 = 6,
        // observed 2, so 4 prevented.
        let table = ContingencyTable::new(2, 8, 10, 8);
        let est = estimate_cases_prevented(&table);
        assert!((est.prevented - 4.0).abs() < 1e-12);
        assert!(est.prevented_lower < est.prevented);
        assert!(est.prevented_upper > est.prevented);
    }

    #[test]
    fn clopper_pearson_degenerate_bounds() {
        let (lo, hi) = clopper_pearson(0, 10);
        assert!(lo.abs() < 1e-12);
        assert!(hi > 0.0 && hi < 1.0);

        let (lo, hi) = clopper_pearson(10, 10);
        assert!(lo > 0.0 && lo < 1.0);
        assert!((hi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clopper_pearson_brackets_proportion() {
        let (lo, hi) = clopper_pearson(8, 16);
        assert!(lo < 0.5 && hi > 0.5);
        // Known textbook values for 8/16 at 95%: roughly (0.247, 0.753).
        assert!((lo - 0.247).abs() < 0.01, "got {lo}");
        assert!((hi - 0.753).abs() < 0.01, "got {hi}");
    }
}
