#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report generation for the intervention evaluation toolchain.
//!
//! Drives the statistical pipeline over sliding time windows, converts
//! wide randomization tables into empirical p-value reports, writes both
//! report shapes to CSV, and formats the human-readable summaries the
//! CLI prints.

pub mod pvalues;
pub mod sliding;
pub mod summary;
pub mod writers;

use thiserror::Error;

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The statistical pipeline rejected the input.
    #[error(transparent)]
    Stats(#[from] epi_zone_stats::StatsError),

    /// Writing a report file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path of the report being written.
        path: String,
        /// Underlying CSV/IO error.
        source: csv::Error,
    },
}
