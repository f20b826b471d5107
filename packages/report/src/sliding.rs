//! Sliding-window exact-test reports.
//!
//! Classifies the cases once, then slides a fixed-width window across
//! the case timespan, building a contingency table and running the
//! exact test in each position. Windows where the table is empty or has
//! a zero margin produce rows with missing statistics rather than
//! aborting the sweep: a gap in the series is information, a crashed
//! report is not.

use chrono::DateTime;
use epi_zone_models::report::WindowRow;
use epi_zone_models::{
    Case, ClassifiedCase, ContingencyTable, Site, SiteGroup, TimeWindow, ZoneConfig,
};
use epi_zone_stats::classify::classify_cases;
use epi_zone_stats::contingency::build_contingency_table;
use epi_zone_stats::fisher::exact_association_test;
use epi_zone_stats::StatsError;

use crate::ReportError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Sweep parameters for a sliding-window report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindowParams {
    /// Window width in days.
    pub window_days: i64,
    /// Step between consecutive window starts, in days.
    pub step_days: i64,
}

impl Default for SlidingWindowParams {
    fn default() -> Self {
        Self {
            window_days: 70,
            step_days: 1,
        }
    }
}

fn window_label(start_unix: i64) -> String {
    DateTime::from_timestamp(start_unix, 0)
        .map_or_else(|| start_unix.to_string(), |dt| dt.format("%d.%m.%Y").to_string())
}

/// Counts per window cell even when the full table is rejected: rows
/// for degenerate windows still report what was observed.
fn window_counts(classified: &[ClassifiedCase], window: TimeWindow) -> ContingencyTable {
    let mut table = ContingencyTable::new(0, 0, 0, 0);
    for cc in classified
        .iter()
        .filter(|cc| window.contains(cc.case.event_time))
    {
        match (cc.nearest_group, cc.inside_zone) {
            (SiteGroup::Treatment, true) => table.a += 1,
            (SiteGroup::Control, true) => table.b += 1,
            (SiteGroup::Treatment, false) => table.c += 1,
            (SiteGroup::Control, false) => table.d += 1,
        }
    }
    table
}

/// Runs the exact test over every window position across the case
/// timespan.
///
/// # Errors
///
/// Returns [`StatsError`] (via [`ReportError::Stats`]) when
/// classification fails — empty site groups or non-finite coordinates.
/// Per-window statistical failures are folded into the rows as missing
/// values instead.
pub fn sliding_window_report(
    cases: &[Case],
    treatment_sites: &[Site],
    control_sites: &[Site],
    config: &ZoneConfig,
    params: &SlidingWindowParams,
) -> Result<Vec<WindowRow>, ReportError> {
    let classified = classify_cases(cases, treatment_sites, control_sites, config)?;

    let Some(first) = cases.iter().map(|c| c.event_time).min() else {
        return Ok(Vec::new());
    };
    let last = cases.iter().map(|c| c.event_time).max().unwrap_or(first);

    let width = params.window_days.max(1) * SECONDS_PER_DAY;
    let step = params.step_days.max(1) * SECONDS_PER_DAY;

    let mut rows = Vec::new();
    let mut start = first;
    while start <= last {
        let window = TimeWindow::new(start, start + width - 1);
        let counts = window_counts(&classified, window);

        let (p_value, odds_ratio) = match build_contingency_table(&classified, window)
            .and_then(|table| exact_association_test(&table))
        {
            Ok(result) => (Some(result.p_value), Some(result.odds_ratio)),
            Err(
                StatsError::EmptyWindow { .. } | StatsError::InsufficientData { .. },
            ) => (None, None),
            Err(other) => return Err(other.into()),
        };

        rows.push(WindowRow {
            label: window_label(start),
            in_treatment: counts.a,
            in_control: counts.b,
            total: counts.total(),
            p_value,
            odds_ratio,
        });

        start += step;
    }

    log::info!(
        "sliding window sweep: {} window(s), {} with a defined test",
        rows.len(),
        rows.iter().filter(|r| r.p_value.is_some()).count()
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use epi_zone_models::DistanceModel;

    use super::*;

    fn config() -> ZoneConfig {
        ZoneConfig {
            zone_radius_km: 0.8,
            distance_model: DistanceModel::FlatEarth,
        }
    }

    // Two clusters: near the treatment site and near the control site,
    // with some cases outside both zones.
    fn fixture() -> (Vec<Case>, Vec<Site>, Vec<Site>) {
        let treatment = vec![Site { lat: 0.0, lon: 0.0 }];
        let control = vec![Site { lat: 0.0, lon: 1.0 }];
        let day = 86_400;
        let mut cases = Vec::new();
        for i in 0..10_i64 {
            cases.push(Case {
                lat: 0.0,
                lon: 0.001,
                event_time: i * day,
            });
            cases.push(Case {
                lat: 0.0,
                lon: 0.999,
                event_time: i * day,
            });
            cases.push(Case {
                lat: 0.3,
                lon: 0.0,
                event_time: i * day,
            });
            cases.push(Case {
                lat: 0.3,
                lon: 1.0,
                event_time: i * day,
            });
        }
        (cases, treatment, control)
    }

    #[test]
    fn one_row_per_step() {
        let (cases, treatment, control) = fixture();
        let params = SlidingWindowParams {
            window_days: 3,
            step_days: 2,
        };
        let rows =
            sliding_window_report(&cases, &treatment, &control, &config(), &params).unwrap();
        // Timespan is 9 days; starts at day 0, 2, 4, 6, 8.
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn full_width_window_sees_every_case() {
        let (cases, treatment, control) = fixture();
        let params = SlidingWindowParams {
            window_days: 30,
            step_days: 30,
        };
        let rows =
            sliding_window_report(&cases, &treatment, &control, &config(), &params).unwrap();
        assert_eq!(rows[0].total, cases.len() as u64);
        assert_eq!(rows[0].in_treatment, 10);
        assert_eq!(rows[0].in_control, 10);
        assert!(rows[0].p_value.is_some());
    }

    #[test]
    fn empty_case_list_gives_empty_report() {
        let (_, treatment, control) = fixture();
        let rows = sliding_window_report(
            &[],
            &treatment,
            &control,
            &config(),
            &SlidingWindowParams::default(),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn degenerate_window_yields_missing_statistics() {
        // Only inside-zone cases: zero outside margin in every window.
        let treatment = vec![Site { lat: 0.0, lon: 0.0 }];
        let control = vec![Site { lat: 0.0, lon: 1.0 }];
        let cases = vec![
            Case {
                lat: 0.0,
                lon: 0.001,
                event_time: 0,
            },
            Case {
                lat: 0.0,
                lon: 0.999,
                event_time: 0,
            },
        ];
        let rows = sliding_window_report(
            &cases,
            &treatment,
            &control,
            &config(),
            &SlidingWindowParams::default(),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total, 2);
        assert!(rows[0].p_value.is_none());
        assert!(rows[0].odds_ratio.is_none());
    }

    #[test]
    fn empty_sites_fail_the_sweep() {
        let (cases, treatment, _) = fixture();
        assert!(sliding_window_report(
            &cases,
            &treatment,
            &[],
            &config(),
            &SlidingWindowParams::default(),
        )
        .is_err());
    }

    #[test]
    fn labels_are_day_first_dates() {
        let (cases, treatment, control) = fixture();
        let rows = sliding_window_report(
            &cases,
            &treatment,
            &control,
            &config(),
            &SlidingWindowParams::default(),
        )
        .unwrap();
        assert_eq!(rows[0].label, "01.01.1970");
    }
}
