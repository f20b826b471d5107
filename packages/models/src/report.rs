//! Row types for the CSV reports exchanged between the sliding-window
//! engine, the p-value report generator, and the plotting commands.
//!
//! Optional fields model the tolerant ingestion contract: a cell that
//! failed to parse (or a window where the statistic was undefined) is
//! carried as `None` and written back out as an empty cell, never as a
//! fabricated zero.

use serde::{Deserialize, Serialize};

/// One row of a sliding-window report: per-window zone counts and the
/// exact-test results, labelled by the window's start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRow {
    /// Window start date formatted `dd.mm.YYYY`.
    pub label: String,
    /// Cases inside a treatment zone (cell `a`).
    pub in_treatment: u64,
    /// Cases inside a control zone (cell `b`).
    pub in_control: u64,
    /// Total cases in the window.
    pub total: u64,
    /// Two-sided exact-test p-value; `None` when the window was empty or
    /// the table had a zero margin.
    pub p_value: Option<f64>,
    /// Conditional odds ratio; `None` under the same conditions.
    pub odds_ratio: Option<f64>,
}

/// One row of an empirical p-value report: the percentile-rank p-values
/// of the actual treatment and control statistics against the
/// randomized replicates for the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvalueRow {
    /// Row label carried through from the input table (a date or a
    /// window date-range string).
    pub label: String,
    /// Empirical p-value for the treatment statistic, if computable.
    pub treatment_p: Option<f64>,
    /// Empirical p-value for the control statistic, if computable.
    pub control_p: Option<f64>,
}
