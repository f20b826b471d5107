//! Empirical p-value reports from wide randomization tables.
//!
//! Each row of the input table carries the observed treatment and
//! control statistics plus the same statistic recomputed under many
//! randomizations. The empirical p-value is one minus the percentile
//! rank of the observed value within that row's randomized replicates.

use epi_zone_models::report::PvalueRow;
use epi_zone_stats::ranks::empirical_p_value;

/// A row of observed statistics with its randomized replicates.
pub struct RandomizedRow<'a> {
    /// Row label carried into the report.
    pub label: &'a str,
    /// Observed treatment statistic, if present.
    pub treatment: Option<f64>,
    /// Observed control statistic, if present.
    pub control: Option<f64>,
    /// Randomized replicates; missing cells already removed.
    pub replicates: &'a [f64],
}

/// Computes the empirical p-value report.
///
/// Rows where the observed value is missing, or where every replicate
/// cell was missing, get `None` for the affected p-value; they are
/// reported rather than dropped so the output stays aligned with the
/// input rows.
#[must_use]
pub fn pvalue_report(rows: &[RandomizedRow<'_>]) -> Vec<PvalueRow> {
    rows.iter()
        .map(|row| {
            let rank = |observed: Option<f64>| {
                observed.and_then(|value| empirical_p_value(row.replicates, value).ok())
            };
            PvalueRow {
                label: row.label.to_string(),
                treatment_p: rank(row.treatment),
                control_p: rank(row.control),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_above_all_replicates_has_zero_p() {
        let replicates = [1.0, 2.0, 3.0, 4.0];
        let rows = [RandomizedRow {
            label: "13.04.2024",
            treatment: Some(10.0),
            control: Some(0.0),
            replicates: &replicates,
        }];
        let report = pvalue_report(&rows);
        assert!((report[0].treatment_p.unwrap()).abs() < 1e-9);
        assert!((report[0].control_p.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_observed_value_gives_none() {
        let replicates = [1.0, 2.0];
        let rows = [RandomizedRow {
            label: "x",
            treatment: None,
            control: Some(1.5),
            replicates: &replicates,
        }];
        let report = pvalue_report(&rows);
        assert!(report[0].treatment_p.is_none());
        assert_eq!(report[0].control_p, Some(0.5));
    }

    #[test]
    fn empty_replicates_give_none_not_a_rank() {
        let rows = [RandomizedRow {
            label: "x",
            treatment: Some(1.0),
            control: Some(2.0),
            replicates: &[],
        }];
        let report = pvalue_report(&rows);
        assert!(report[0].treatment_p.is_none());
        assert!(report[0].control_p.is_none());
    }

    #[test]
    fn output_stays_aligned_with_input() {
        let replicates = [1.0];
        let rows = [
            RandomizedRow {
                label: "a",
                treatment: Some(1.0),
                control: None,
                replicates: &replicates,
            },
            RandomizedRow {
                label: "b",
                treatment: None,
                control: None,
                replicates: &[],
            },
        ];
        let report = pvalue_report(&rows);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].label, "a");
        assert_eq!(report[1].label, "b");
    }
}
