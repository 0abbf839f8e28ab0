use crate::types::DonationCenter;

/// Mean Earth radius in kilometers, as used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates given
/// in degrees. Spherical-Earth approximation; sufficient precision for
/// sub-continental proximity ranking.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distances are reported to one decimal place.
pub fn round_km(distance: f64) -> f64 {
    (distance * 10.0).round() / 10.0
}

/// Rank donation centers by distance from the user.
///
/// Every candidate's distance is computed first; the optional type
/// filter and the radius cut are applied afterwards, so a filtered-out
/// center still had a well-defined distance. A center exactly on the
/// radius boundary is included. The sort is stable: ties keep input
/// order.
pub fn rank_nearby(
    user_lat: f64,
    user_lon: f64,
    radius_km: f64,
    type_filter: Option<&str>,
    centers: Vec<DonationCenter>,
) -> Vec<(DonationCenter, f64)> {
    let mut ranked: Vec<(DonationCenter, f64)> = centers
        .into_iter()
        .map(|c| {
            let d = haversine_km(user_lat, user_lon, c.latitude, c.longitude);
            (c, d)
        })
        .filter(|(_, d)| *d <= radius_km)
        .filter(|(c, _)| match type_filter {
            Some(t) => c.center_type.eq_ignore_ascii_case(t),
            None => true,
        })
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

/// Best-effort "open now" check over the free-text opening hours.
/// Only a round-the-clock marker is recognized; anything else is
/// unknown. No real hours parser.
pub fn open_now(opening_hours: Option<&str>) -> Option<bool> {
    let hours = opening_hours?;
    if hours.is_empty() {
        return None;
    }

    let lower = hours.to_lowercase();
    if lower.contains("24/7") || lower.contains("always open") {
        return Some(true);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn center(id: i64, name: &str, center_type: &str, lat: f64, lon: f64) -> DonationCenter {
        DonationCenter {
            id,
            name: name.to_string(),
            center_type: center_type.to_string(),
            address: None,
            city: None,
            state: None,
            latitude: lat,
            longitude: lon,
            phone_number: None,
            email: None,
            opening_hours: None,
            accepted_items: None,
            website: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_identical_points_distance_zero() {
        assert_eq!(haversine_km(6.4281, 3.4219, 6.4281, 3.4219), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = haversine_km(6.4281, 3.4219, 9.0765, 7.3986);
        let b = haversine_km(9.0765, 7.3986, 6.4281, 3.4219);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance_lagos() {
        // ~19.6 km due north of Lagos Island
        let d = haversine_km(6.4281, 3.4219, 6.6044, 3.4219);
        assert!((round_km(d) - 19.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_nearby_sorted_and_bounded() {
        let user = (6.4281, 3.4219);
        let centers = vec![
            center(1, "Far", "Food Bank", 6.6044, 3.4219),  // ~19.6 km
            center(2, "Here", "Food Bank", 6.4281, 3.4219), // 0 km
            center(3, "Out", "Food Bank", 7.5, 3.4219),     // >100 km
        ];

        let ranked = rank_nearby(user.0, user.1, 20.0, None, centers);
        let ids: Vec<i64> = ranked.iter().map(|(c, _)| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_rank_nearby_radius_boundary_inclusive() {
        let centers = vec![center(1, "Edge", "Shelter", 6.4281, 3.4219)];
        let ranked = rank_nearby(6.4281, 3.4219, 0.0, None, centers);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_rank_nearby_type_filter_case_insensitive() {
        let centers = vec![
            center(1, "A", "Food Bank", 6.43, 3.42),
            center(2, "B", "Shelter", 6.43, 3.42),
        ];
        let ranked = rank_nearby(6.4281, 3.4219, 50.0, Some("food bank"), centers);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, 1);
    }

    #[test]
    fn test_open_now_heuristic() {
        assert_eq!(open_now(Some("Open 24/7")), Some(true));
        assert_eq!(open_now(Some("Always Open")), Some(true));
        assert_eq!(open_now(Some("Mon-Fri: 9AM-5PM")), None);
        assert_eq!(open_now(Some("")), None);
        assert_eq!(open_now(None), None);
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(19.6213), 19.6);
        assert_eq!(round_km(0.04), 0.0);
        assert_eq!(round_km(0.05), 0.1);
    }
}
