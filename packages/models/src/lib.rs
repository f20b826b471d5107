#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared domain types for the intervention evaluation toolchain.
//!
//! Defines the canonical case/site model used across ingestion, the
//! statistical pipeline, report generation, and plotting: epidemiological
//! cases with a location and event time, intervention sites split into
//! treatment and control groups, the derived per-case exposure
//! classification, and the 2x2 contingency table the exact test runs on.

pub mod progress;
pub mod report;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An epidemiological case: where it occurred and when.
///
/// `event_time` is unix seconds. Cases are immutable once loaded; rows
/// with unparseable fields are dropped during ingestion and never reach
/// this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Event time as unix epoch seconds (e.g., symptom onset).
    pub event_time: i64,
}

/// An intervention site location. Group membership is carried separately
/// (sites are loaded per-group from their own files).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
}

/// Which arm of the intervention a site (or a classified case) belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SiteGroup {
    /// Sites where the intervention was deployed.
    Treatment,
    /// Untreated comparison sites.
    Control,
}

/// Distance convention used for proximity computations.
///
/// The underlying field studies used two conventions: a true ellipsoidal
/// geodesic, and an equirectangular approximation that scales degree
/// deltas by 111.32 km/degree. Both are kept as named strategies so a
/// caller always states which one a result was computed under.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DistanceModel {
    /// Ellipsoidal geodesic distance (WGS84).
    #[default]
    Geodesic,
    /// Flat-earth approximation: degree deltas scaled by 111.32 km/degree.
    FlatEarth,
}

/// Parameters for the exposure classification step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Catchment radius around a site, in kilometers.
    pub zone_radius_km: f64,
    /// Distance convention for nearest-site computations.
    pub distance_model: DistanceModel,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_radius_km: 0.8,
            distance_model: DistanceModel::Geodesic,
        }
    }
}

/// An inclusive time window over unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (inclusive), unix seconds.
    pub start: i64,
    /// Window end (inclusive), unix seconds.
    pub end: i64,
}

impl TimeWindow {
    /// Creates a window from inclusive unix-second bounds.
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `t` falls inside the window (both bounds inclusive).
    #[must_use]
    pub const fn contains(&self, t: i64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// A case with its derived spatial exposure classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCase {
    /// The underlying case.
    pub case: Case,
    /// The group whose closest site is strictly nearer than the other
    /// group's closest site; ties resolve to [`SiteGroup::Control`].
    pub nearest_group: SiteGroup,
    /// Distance to the nearest site of `nearest_group`, in kilometers.
    pub nearest_distance_km: f64,
    /// Whether that distance is within the configured zone radius.
    pub inside_zone: bool,
}

/// A 2x2 contingency table of cases by group and zone membership.
///
/// Layout matches the field analysis convention:
///
/// ```text
///              inside zone    outside zone
/// treatment        a               c
/// control          b               d
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Treatment-assigned cases inside the zone.
    pub a: u64,
    /// Control-assigned cases inside the zone.
    pub b: u64,
    /// Treatment-assigned cases outside the zone.
    pub c: u64,
    /// Control-assigned cases outside the zone.
    pub d: u64,
}

impl ContingencyTable {
    /// Creates a table from the four cell counts.
    #[must_use]
    pub const fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Self { a, b, c, d }
    }

    /// Total cases in the table.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Cases inside either zone (first row margin).
    #[must_use]
    pub const fn inside_total(&self) -> u64 {
        self.a + self.b
    }

    /// Cases outside both zones (second row margin).
    #[must_use]
    pub const fn outside_total(&self) -> u64 {
        self.c + self.d
    }

    /// Cases assigned to the treatment group (first column margin).
    #[must_use]
    pub const fn treatment_total(&self) -> u64 {
        self.a + self.c
    }

    /// Cases assigned to the control group (second column margin).
    #[must_use]
    pub const fn control_total(&self) -> u64 {
        self.b + self.d
    }

    /// Whether any row or column margin is zero. The exact test is
    /// undefined on such tables.
    #[must_use]
    pub const fn has_zero_margin(&self) -> bool {
        self.inside_total() == 0
            || self.outside_total() == 0
            || self.treatment_total() == 0
            || self.control_total() == 0
    }

    /// Whether any single cell is zero (margins may still be positive).
    #[must_use]
    pub const fn has_zero_cell(&self) -> bool {
        self.a == 0 || self.b == 0 || self.c == 0 || self.d == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_are_inclusive() {
        let w = TimeWindow::new(10, 20);
        assert!(w.contains(10));
        assert!(w.contains(20));
        assert!(!w.contains(9));
        assert!(!w.contains(21));
    }

    #[test]
    fn table_margins() {
        let t = ContingencyTable::new(1, 2, 3, 4);
        assert_eq!(t.total(), 10);
        assert_eq!(t.inside_total(), 3);
        assert_eq!(t.outside_total(), 7);
        assert_eq!(t.treatment_total(), 4);
        assert_eq!(t.control_total(), 6);
        assert!(!t.has_zero_margin());
    }

    #[test]
    fn zero_margin_detected() {
        assert!(ContingencyTable::new(0, 0, 3, 4).has_zero_margin());
        assert!(ContingencyTable::new(0, 2, 0, 4).has_zero_margin());
        assert!(!ContingencyTable::new(0, 2, 3, 4).has_zero_margin());
    }

    #[test]
    fn zero_cell_is_not_zero_margin() {
        let t = ContingencyTable::new(0, 2, 3, 4);
        assert!(t.has_zero_cell());
        assert!(!t.has_zero_margin());
    }

    #[test]
    fn distance_model_parses_kebab_case() {
        use std::str::FromStr as _;
        assert_eq!(
            DistanceModel::from_str("geodesic").unwrap(),
            DistanceModel::Geodesic
        );
        assert_eq!(
            DistanceModel::from_str("flat-earth").unwrap(),
            DistanceModel::FlatEarth
        );
    }

    #[test]
    fn site_group_display() {
        assert_eq!(SiteGroup::Treatment.to_string(), "treatment");
        assert_eq!(SiteGroup::Control.to_string(), "control");
    }
}
