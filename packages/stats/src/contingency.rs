//! Contingency table construction over a time window.

use epi_zone_models::{ClassifiedCase, ContingencyTable, SiteGroup, TimeWindow};

use crate::StatsError;

/// Builds the 2x2 group-by-zone table from classified cases whose event
/// time falls inside `window` (bounds inclusive).
///
/// Idempotent: re-filtering the same window produces the same table.
///
/// # Errors
///
/// Returns [`StatsError::EmptyWindow`] when no cases fall in the window,
/// or [`StatsError::InsufficientData`] when any row or column margin of
/// the resulting table is zero (the exact test is undefined there).
pub fn build_contingency_table(
    classified: &[ClassifiedCase],
    window: TimeWindow,
) -> Result<ContingencyTable, StatsError> {
    let mut table = ContingencyTable::new(0, 0, 0, 0);
    let mut in_window = 0_u64;

    for cc in classified
        .iter()
        .filter(|cc| window.contains(cc.case.event_time))
    {
        in_window += 1;
        match (cc.nearest_group, cc.inside_zone) {
            (SiteGroup::Treatment, true) => table.a += 1,
            (SiteGroup::Control, true) => table.b += 1,
            (SiteGroup::Treatment, false) => table.c += 1,
            (SiteGroup::Control, false) => table.d += 1,
        }
    }

    if in_window == 0 {
        return Err(StatsError::EmptyWindow {
            start: window.start,
            end: window.end,
        });
    }

    debug_assert_eq!(table.total(), in_window);

    if table.has_zero_margin() {
        return Err(StatsError::InsufficientData {
            a: table.a,
            b: table.b,
            c: table.c,
            d: table.d,
        });
    }

    Ok(table)
}
