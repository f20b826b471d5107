//! Distance computations between cases and sites.
//!
//! Two conventions are exposed, matching the two used in the field
//! analyses: a true WGS84 geodesic (via `geo`), and the equirectangular
//! approximation that scales latitude/longitude degree deltas by
//! 111.32 km/degree. The approximation deliberately omits a
//! `cos(latitude)` correction on the longitude axis to reproduce the
//! historical convention exactly; results computed under the two models
//! are not interchangeable.

use epi_zone_models::DistanceModel;
use geo::{Distance, Geodesic, Point};

/// Kilometers per degree used by the flat-earth approximation.
pub const FLAT_EARTH_KM_PER_DEGREE: f64 = 111.32;

/// Distance in kilometers between two `(lat, lon)` pairs under the given
/// model.
#[must_use]
pub fn distance_km(model: DistanceModel, from: (f64, f64), to: (f64, f64)) -> f64 {
    match model {
        DistanceModel::Geodesic => {
            // geo points are (x, y) = (lon, lat); geodesic distance is in
            // meters.
            let a = Point::new(from.1, from.0);
            let b = Point::new(to.1, to.0);
            Geodesic.distance(a, b) / 1000.0
        }
        DistanceModel::FlatEarth => {
            let dlat = from.0 - to.0;
            let dlon = from.1 - to.1;
            dlat.hypot(dlon) * FLAT_EARTH_KM_PER_DEGREE
        }
    }
}

/// Distance in kilometers from a point to the nearest of `sites`.
///
/// Returns `None` when `sites` is empty.
#[must_use]
pub fn nearest_km<I>(model: DistanceModel, from: (f64, f64), sites: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    sites
        .into_iter()
        .map(|site| distance_km(model, from, site))
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = (-37.728, 144.905);
        assert!(distance_km(DistanceModel::Geodesic, p, p) < 1e-9);
        assert!(distance_km(DistanceModel::FlatEarth, p, p) < 1e-9);
    }

    #[test]
    fn flat_earth_scales_degree_deltas() {
        // One degree of latitude, same longitude.
        let d = distance_km(DistanceModel::FlatEarth, (0.0, 0.0), (1.0, 0.0));
        assert!((d - FLAT_EARTH_KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn geodesic_degree_of_latitude_is_about_111km() {
        let d = distance_km(DistanceModel::Geodesic, (0.0, 0.0), (1.0, 0.0));
        assert!((d - 110.574).abs() < 1.0, "got {d}");
    }

    #[test]
    fn nearest_picks_minimum() {
        let sites = [(0.0, 1.0), (0.0, 0.1), (1.0, 1.0)];
        let d = nearest_km(DistanceModel::FlatEarth, (0.0, 0.0), sites).unwrap();
        assert!((d - 0.1 * FLAT_EARTH_KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn nearest_of_empty_is_none() {
        assert!(nearest_km(DistanceModel::Geodesic, (0.0, 0.0), []).is_none());
    }
}
