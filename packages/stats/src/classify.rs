//! Per-case spatial exposure classification.
//!
//! Assigns every case to the site group whose closest site is strictly
//! nearer than the other group's closest site, and marks whether the
//! case falls within that group's catchment radius. Equal minimum
//! distances resolve to the control group; the strict-less-than
//! comparison is a contract of the analysis, not an accident.

use epi_zone_models::{Case, ClassifiedCase, Site, SiteGroup, ZoneConfig};

use crate::StatsError;
use crate::distance::nearest_km;

fn check_finite(
    coords: impl IntoIterator<Item = (f64, f64)>,
    context: &'static str,
) -> Result<(), StatsError> {
    for (lat, lon) in coords {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(StatsError::NonFiniteCoordinate { context });
        }
    }
    Ok(())
}

/// Classifies every case by its spatial relationship to the two site
/// groups.
///
/// Pure function of its inputs: no side effects, deterministic output
/// order matching the input order.
///
/// # Errors
///
/// Returns [`StatsError::EmptySiteGroup`] if either site group is empty,
/// or [`StatsError::NonFiniteCoordinate`] if any case or site coordinate
/// is NaN or infinite.
pub fn classify_cases(
    cases: &[Case],
    treatment_sites: &[Site],
    control_sites: &[Site],
    config: &ZoneConfig,
) -> Result<Vec<ClassifiedCase>, StatsError> {
    if treatment_sites.is_empty() {
        return Err(StatsError::EmptySiteGroup {
            group: SiteGroup::Treatment,
        });
    }
    if control_sites.is_empty() {
        return Err(StatsError::EmptySiteGroup {
            group: SiteGroup::Control,
        });
    }

    check_finite(cases.iter().map(|c| (c.lat, c.lon)), "cases")?;
    check_finite(
        treatment_sites.iter().map(|s| (s.lat, s.lon)),
        "treatment sites",
    )?;
    check_finite(
        control_sites.iter().map(|s| (s.lat, s.lon)),
        "control sites",
    )?;

    let model = config.distance_model;
    let classified = cases
        .iter()
        .map(|case| {
            let from = (case.lat, case.lon);
            let treatment_min = nearest_km(model, from, treatment_sites.iter().map(|s| (s.lat, s.lon)))
                .unwrap_or(f64::INFINITY);
            let control_min = nearest_km(model, from, control_sites.iter().map(|s| (s.lat, s.lon)))
                .unwrap_or(f64::INFINITY);

            // Ties resolve to control: only a strictly nearer treatment
            // site claims the case.
            let (nearest_group, nearest_distance_km) = if treatment_min < control_min {
                (SiteGroup::Treatment, treatment_min)
            } else {
                (SiteGroup::Control, control_min)
            };

            ClassifiedCase {
                case: *case,
                nearest_group,
                nearest_distance_km,
                inside_zone: nearest_distance_km <= config.zone_radius_km,
            }
        })
        .collect();

    Ok(classified)
}

/// Distance from every case to its nearest site in a single site set.
///
/// Used by the proximity comparisons (Mann-Whitney, permutation test),
/// which measure against one group's sites only.
///
/// # Errors
///
/// Returns [`StatsError::EmptySiteGroup`] if `sites` is empty, or
/// [`StatsError::NonFiniteCoordinate`] on bad coordinates. The `group`
/// parameter only labels the error.
pub fn proximity_to_nearest(
    cases: &[Case],
    sites: &[Site],
    group: SiteGroup,
    config: &ZoneConfig,
) -> Result<Vec<f64>, StatsError> {
    if sites.is_empty() {
        return Err(StatsError::EmptySiteGroup { group });
    }
    check_finite(cases.iter().map(|c| (c.lat, c.lon)), "cases")?;
    check_finite(sites.iter().map(|s| (s.lat, s.lon)), "sites")?;

    Ok(cases
        .iter()
        .map(|case| {
            nearest_km(
                config.distance_model,
                (case.lat, case.lon),
                sites.iter().map(|s| (s.lat, s.lon)),
            )
            .unwrap_or(f64::INFINITY)
        })
        .collect())
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

    fn case_at(lat: f64, lon: f64) -> Case {
        Case {
            lat,
            lon,
            event_time: 0,
        }
    }

    #[test]
    fn assigns_exactly_one_group_per_case() {
        let cases = [case_at(0.0, 0.001), case_at(0.0, 0.02)];
        let treatment = [Site { lat: 0.0, lon: 0.0 }];
        let control = [Site { lat: 0.0, lon: 0.04 }];
        let out = classify_cases(&cases, &treatment, &control, &config()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].nearest_group, SiteGroup::Treatment);
        assert_eq!(out[1].nearest_group, SiteGroup::Control);
    }

    #[test]
    fn ties_resolve_to_control() {
        let cases = [case_at(0.0, 0.0)];
        let treatment = [Site { lat: 0.0, lon: 0.01 }];
        let control = [Site {
            lat: 0.0,
            lon: -0.01,
        }];
        let out = classify_cases(&cases, &treatment, &control, &config()).unwrap();
        assert_eq!(out[0].nearest_group, SiteGroup::Control);
    }

    #[test]
    fn inside_zone_respects_radius() {
        // 0.001 deg ~ 0.111 km (inside), 0.02 deg ~ 2.2 km (outside).
        let cases = [case_at(0.0, 0.001), case_at(0.0, 0.02)];
        let treatment = [Site { lat: 0.0, lon: 0.0 }];
        let control = [Site { lat: 5.0, lon: 5.0 }];
        let out = classify_cases(&cases, &treatment, &control, &config()).unwrap();
        assert!(out[0].inside_zone);
        assert!(!out[1].inside_zone);
    }

    #[test]
    fn control_inside_zone_is_consistent_with_distance() {
        let cases = [case_at(0.0, 0.003)];
        let treatment = [Site { lat: 1.0, lon: 1.0 }];
        let control = [Site { lat: 0.0, lon: 0.0 }];
        let out = classify_cases(&cases, &treatment, &control, &config()).unwrap();
        assert_eq!(out[0].nearest_group, SiteGroup::Control);
        assert_eq!(
            out[0].inside_zone,
            out[0].nearest_distance_km <= config().zone_radius_km
        );
    }

    #[test]
    fn empty_site_group_is_an_error() {
        let cases = [case_at(0.0, 0.0)];
        let sites = [Site { lat: 0.0, lon: 0.0 }];
        assert_eq!(
            classify_cases(&cases, &[], &sites, &config()).unwrap_err(),
            StatsError::EmptySiteGroup {
                group: SiteGroup::Treatment
            }
        );
        assert_eq!(
            classify_cases(&cases, &sites, &[], &config()).unwrap_err(),
            StatsError::EmptySiteGroup {
                group: SiteGroup::Control
            }
        );
    }

    #[test]
    fn non_finite_coordinate_is_an_error() {
        let cases = [case_at(f64::NAN, 0.0)];
        let sites = [Site { lat: 0.0, lon: 0.0 }];
        assert!(matches!(
            classify_cases(&cases, &sites, &sites, &config()),
            Err(StatsError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn proximity_matches_nearest_site() {
        let cases = [case_at(0.0, 0.0)];
        let sites = [Site { lat: 0.0, lon: 0.01 }, Site { lat: 0.0, lon: 0.5 }];
        let prox =
            proximity_to_nearest(&cases, &sites, SiteGroup::Treatment, &config()).unwrap();
        assert!((prox[0] - 0.01 * crate::distance::FLAT_EARTH_KM_PER_DEGREE).abs() < 1e-9);
    }
}
