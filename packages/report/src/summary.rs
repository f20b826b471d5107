//! Human-readable summaries printed by the CLI.
//!
//! The wording follows the write-ups the field team publishes from, so
//! the printed block can be pasted into analysis notes unchanged.

use epi_zone_models::ContingencyTable;
use epi_zone_stats::fisher::ExactTestResult;
use epi_zone_stats::prevented::CasesPrevented;
use epi_zone_stats::ranks::MannWhitneyTest;

/// Formats the full exact-test summary block.
#[must_use]
pub fn exact_test_summary(
    table: &ContingencyTable,
    test: &ExactTestResult,
    prevented: &CasesPrevented,
) -> String {
    let mut out = String::new();

    out.push_str("Fisher's Exact Test Results:\n");
    out.push_str("----------------------------------------------------\n");
    out.push_str(&format!("Cases Inside Treatment Zone: {}\n", table.a));
    out.push_str(&format!("Cases Outside Treatment Zone: {}\n", table.c));
    out.push_str(&format!("Cases Inside Control Zone: {}\n", table.b));
    out.push_str(&format!("Cases Outside Control Zone: {}\n", table.d));
    out.push_str(&format!("Total Unique Cases in Window: {}\n", table.total()));
    out.push_str("----------------------------------------------------\n");
    out.push_str(&format!(
        "Odds Ratio: {:.3} (95% CI: {:.3} - {:.3})\n",
        test.odds_ratio, test.ci_lower, test.ci_upper
    ));
    out.push_str(&format!("P-value: {:.5}\n", test.p_value));

    if prevented.is_estimable() {
        out.push_str(&format!(
            "Cases Prevented: {:.1} (95% CI: {:.1} - {:.1})\n",
            prevented.prevented, prevented.prevented_lower, prevented.prevented_upper
        ));
    } else {
        out.push_str("Cases Prevented: not estimable (no control cases in window)\n");
    }

    out.push_str(&format!("Interpretation: {}\n", interpretation(test)));

    if prevented.is_estimable() {
        out.push_str(&format!(
            "If the intervention had no effect, we would expect approximately \
             {:.1} cases in the treatment zone (95% CI: {:.1} - {:.1}), but only \
             {} cases occurred. This suggests that approximately {:.1} cases were \
             prevented due to the intervention (95% CI: {:.1} - {:.1}).\n",
            prevented.expected_treatment,
            prevented.expected_lower,
            prevented.expected_upper,
            table.a,
            prevented.prevented,
            prevented.prevented_lower,
            prevented.prevented_upper,
        ));
    }

    out
}

fn interpretation(test: &ExactTestResult) -> String {
    if test.odds_ratio < 1.0 {
        format!(
            "Cases inside the treatment zone are approximately {:.1}% less likely \
             to occur within the window compared to control.",
            100.0 * (1.0 - test.odds_ratio)
        )
    } else {
        format!(
            "Cases inside the treatment zone are approximately {:.1}% more likely \
             to occur within the window compared to control.",
            100.0 * (test.odds_ratio - 1.0)
        )
    }
}

/// Formats the Mann-Whitney proximity comparison summary.
#[must_use]
pub fn mann_whitney_summary(
    test: &MannWhitneyTest,
    mean_within: f64,
    mean_outside: f64,
) -> String {
    let mut out = String::new();
    out.push_str("Summary Statistics:\n");
    out.push_str(&format!(
        "Within Window Mean Proximity (km): {mean_within:.4}\n"
    ));
    out.push_str(&format!(
        "Outside Window Mean Proximity (km): {mean_outside:.4}\n"
    ));
    out.push_str(&format!(
        "Mean Difference (km): {:.4}\n",
        mean_within - mean_outside
    ));
    out.push_str(&format!("Mann-Whitney U Statistic: {:.1}\n", test.u));
    out.push_str(&format!("P-value: {:.5}\n", test.p_value));
    out
}

/// Formats the randomization test summary.
#[must_use]
pub fn randomization_summary(
    observed: &MannWhitneyTest,
    empirical_p: Option<f64>,
    n_kept: usize,
    n_requested: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Actual Mann-Whitney U Statistic: {:.1}\n",
        observed.u
    ));
    out.push_str(&format!("Actual P-value: {:.5}\n", observed.p_value));
    match empirical_p {
        Some(p) => out.push_str(&format!(
            "Empirical P-value ({n_kept}/{n_requested} permutations): {p:.5}\n"
        )),
        None => out.push_str(
            "Empirical P-value: not computable (empty null distribution)\n",
        ),
    }
    out
}

#[cfg(test)]
mod tests {
    use epi_zone_stats::fisher::exact_association_test;
    use epi_zone_stats::prevented::estimate_cases_prevented;

    use super::*;

    #[test]
    fn summary_reports_all_four_cells() {
        let table = ContingencyTable::new(2, 8, 10, 8);
        let test = exact_association_test(&table).unwrap();
        let prevented = estimate_cases_prevented(&table);
        let text = exact_test_summary(&table, &test, &prevented);
        assert!(text.contains("Cases Inside Treatment Zone: 2"));
        assert!(text.contains("Cases Outside Treatment Zone: 10"));
        assert!(text.contains("Cases Inside Control Zone: 8"));
        assert!(text.contains("Cases Outside Control Zone: 8"));
        assert!(text.contains("Total Unique Cases in Window: 28"));
        assert!(text.contains("Cases Prevented: 4.0"));
    }

    #[test]
    fn protective_effect_reads_less_likely() {
        let table = ContingencyTable::new(2, 12, 14, 3);
        let test = exact_association_test(&table).unwrap();
        let prevented = estimate_cases_prevented(&table);
        let text = exact_test_summary(&table, &test, &prevented);
        assert!(text.contains("less likely"));
    }

    #[test]
    fn unestimable_effect_is_called_out() {
        let table = ContingencyTable::new(3, 0, 5, 0);
        let test = ExactTestResult {
            p_value: 1.0,
            odds_ratio: 1.0,
            ci_lower: 0.5,
            ci_upper: 2.0,
        };
        let prevented = estimate_cases_prevented(&table);
        let text = exact_test_summary(&table, &test, &prevented);
        assert!(text.contains("not estimable"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn randomization_summary_without_distribution() {
        let observed = MannWhitneyTest {
            u: 402.0,
            p_value: 0.714,
        };
        let text = randomization_summary(&observed, None, 0, 0);
        assert!(text.contains("not computable"));
    }
}
