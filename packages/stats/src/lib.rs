#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exposure classification and exact-test inference pipeline.
//!
//! The computational core of the toolchain: assigns each case to its
//! nearest site group, builds 2x2 contingency tables over time windows,
//! and runs the inference the evaluation reports on — Fisher's exact
//! test with a conditional odds ratio and exact confidence interval,
//! cases-prevented estimation with Clopper-Pearson propagation,
//! Mann-Whitney U proximity comparisons, seeded permutation null
//! distributions, and the Benjamini-Hochberg threshold for the
//! sliding-window reports.
//!
//! Everything here is a pure in-memory computation over already-loaded
//! tables; the only failure modes are the named input conditions in
//! [`StatsError`].

pub mod classify;
pub mod contingency;
pub mod distance;
pub mod fisher;
pub mod multiplicity;
pub mod permutation;
pub mod prevented;
pub mod ranks;
pub mod regression;

use epi_zone_models::SiteGroup;
use thiserror::Error;

/// Errors from the statistical pipeline.
///
/// Every variant is a named input condition: the pipeline never retries
/// and never silently substitutes a value for an undefined statistic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// A site group was empty; nearest-group classification is undefined.
    #[error("{group} site group contains no sites")]
    EmptySiteGroup {
        /// The offending group.
        group: SiteGroup,
    },

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate in {context}")]
    NonFiniteCoordinate {
        /// Which input table held the bad coordinate.
        context: &'static str,
    },

    /// No cases fell inside the requested time window.
    #[error("no cases in window [{start}, {end}]")]
    EmptyWindow {
        /// Window start (unix seconds, inclusive).
        start: i64,
        /// Window end (unix seconds, inclusive).
        end: i64,
    },

    /// A contingency table margin was zero; the exact test is undefined.
    #[error(
        "insufficient data for the exact test: zero margin in table \
         [[{a}, {b}], [{c}, {d}]]"
    )]
    InsufficientData {
        /// Treatment-inside cell.
        a: u64,
        /// Control-inside cell.
        b: u64,
        /// Treatment-outside cell.
        c: u64,
        /// Control-outside cell.
        d: u64,
    },

    /// A rank-based comparison was asked to compare against an empty group.
    #[error("cannot compare groups: one side is empty")]
    EmptyGroup,

    /// A percentile rank was requested against an empty null distribution.
    #[error("empty null distribution: percentile rank is undefined")]
    EmptyNullDistribution,

    /// Too few observations for the requested estimate.
    #[error("need at least {needed} observations, got {got}")]
    TooFewObservations {
        /// Minimum observation count for the estimate.
        needed: usize,
        /// Observations actually supplied.
        got: usize,
    },
}
