//! Great-circle distances and radius filtering.

use air_quality_geo_models::{DistanceResult, GeoPoint, Station};

/// Mean Earth radius used for all distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometres on a sphere of radius
/// [`EARTH_RADIUS_KM`].
///
/// The intermediate `a` term is clamped to `[0, 1]` so floating-point
/// overshoot near antipodal points cannot push `sqrt(1 - a)` out of domain.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (phi1.cos() * phi2.cos())
        .mul_add((dlambda / 2.0).sin().powi(2), (dphi / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// [`haversine_km`] between two [`GeoPoint`]s.
#[must_use]
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Returns every candidate within `radius_km` of `reference`, with the
/// computed distance attached.
///
/// Candidates keep their input order. A candidate whose distance is NaN
/// (non-finite location) never matches.
#[must_use]
pub fn nearby(reference: GeoPoint, candidates: &[Station], radius_km: f64) -> Vec<DistanceResult> {
    let results: Vec<DistanceResult> = candidates
        .iter()
        .filter_map(|station| {
            let distance_km = distance_between(reference, station.location);
            (distance_km <= radius_km).then(|| DistanceResult {
                name: station.name.clone(),
                distance_km,
                location: station.location,
            })
        })
        .collect();

    log::debug!(
        "{} of {} candidates within {radius_km} km of ({}, {})",
        results.len(),
        candidates.len(),
        reference.latitude,
        reference.longitude,
    );

    results
}

/// Orders results nearest-first. Ties keep their relative order.
#[must_use]
pub fn sorted_by_distance(mut results: Vec<DistanceResult>) -> Vec<DistanceResult> {
    results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    results
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const TEL_AVIV: GeoPoint = GeoPoint {
        latitude: 32.0853,
        longitude: 34.7818,
    };

    fn station(name: &str, latitude: f64, longitude: f64) -> Station {
        Station {
            name: name.to_string(),
            location: GeoPoint::new(latitude, longitude),
            pollutants: BTreeSet::new(),
        }
    }

    #[test]
    fn haversine_is_symmetric() {
        let pairs = [
            ((32.0853, 34.7818), (31.7683, 35.2137)),
            ((29.5577, 34.9519), (33.2075, 35.5697)),
            ((0.0, 0.0), (0.0, 180.0)),
            ((-45.0, 170.0), (45.0, -10.0)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = haversine_km(lat1, lon1, lat2, lon2);
            let ba = haversine_km(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn haversine_is_zero_for_identical_points() {
        assert!(haversine_km(32.0853, 34.7818, 32.0853, 34.7818).abs() < f64::EPSILON);
        assert!(haversine_km(-89.9, 179.9, -89.9, 179.9).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_handles_antipodal_points() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Tel Aviv to Jerusalem, roughly 54 km.
        let d = haversine_km(32.0853, 34.7818, 31.7683, 35.2137);
        assert!((d - 53.8).abs() < 1.0, "{d}");
    }

    #[test]
    fn nearby_includes_close_and_excludes_far_candidates() {
        let candidates = vec![
            station("close", 32.0, 34.8),
            station("far", 31.0, 34.8),
        ];
        let results = nearby(TEL_AVIV, &candidates, 20.0);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "close");
        assert!(results[0].distance_km > 5.0 && results[0].distance_km < 15.0);
    }

    #[test]
    fn nearby_results_never_exceed_radius() {
        let candidates: Vec<Station> = (0..40)
            .map(|i| {
                let offset = f64::from(i) * 0.02;
                station(&format!("s{i}"), 32.0853 + offset, 34.7818 - offset / 2.0)
            })
            .collect();

        for radius in [0.0, 1.0, 10.0, 50.0, 500.0] {
            let results = nearby(TEL_AVIV, &candidates, radius);
            assert!(results.iter().all(|r| r.distance_km <= radius));

            let included: BTreeSet<&str> = results.iter().map(|r| r.name.as_str()).collect();
            for candidate in &candidates {
                let d = distance_between(TEL_AVIV, candidate.location);
                assert_eq!(included.contains(candidate.name.as_str()), d <= radius);
            }
        }
    }

    #[test]
    fn nearby_includes_candidate_at_reference() {
        let candidates = vec![station("here", TEL_AVIV.latitude, TEL_AVIV.longitude)];
        let results = nearby(TEL_AVIV, &candidates, 0.0);
        assert_eq!(results.len(), 1);
        assert!(results[0].distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn nearby_skips_non_finite_locations() {
        let candidates = vec![station("broken", f64::NAN, 34.8)];
        assert!(nearby(TEL_AVIV, &candidates, 1_000.0).is_empty());
    }

    #[test]
    fn nearby_is_deterministic_and_order_preserving() {
        let candidates = vec![
            station("b", 32.10, 34.80),
            station("a", 32.09, 34.78),
            station("c", 32.00, 34.80),
        ];
        let first = nearby(TEL_AVIV, &candidates, 20.0);
        let second = nearby(TEL_AVIV, &candidates, 20.0);
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn sorted_by_distance_orders_nearest_first() {
        let candidates = vec![
            station("c", 32.00, 34.80),
            station("a", 32.0853, 34.7818),
            station("b", 32.10, 34.80),
        ];
        let sorted = sorted_by_distance(nearby(TEL_AVIV, &candidates, 20.0));
        let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
