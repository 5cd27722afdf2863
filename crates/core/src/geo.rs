use crate::models::Location;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance in meters. No ellipsoidal correction.
pub fn distance_m(origin_lat: f64, origin_lon: f64, target_lat: f64, target_lon: f64) -> f64 {
    let phi1 = origin_lat.to_radians();
    let phi2 = target_lat.to_radians();
    let d_phi = (target_lat - origin_lat).to_radians();
    let d_lambda = (target_lon - origin_lon).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    (EARTH_RADIUS_M * c).max(0.0)
}

pub fn distance_between(origin: Location, target: Location) -> f64 {
    distance_m(
        origin.latitude,
        origin.longitude,
        target.latitude,
        target.longitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_m(51.2194, 4.4025, 51.2194, 4.4025), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_m(51.2194, 4.4025, 50.8503, 4.3517);
        let back = distance_m(50.8503, 4.3517, 51.2194, 4.4025);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn antwerp_to_brussels_is_about_41km() {
        let dist = distance_m(51.2194, 4.4025, 50.8503, 4.3517);
        assert!((dist - 41_200.0).abs() < 1_000.0, "got {dist}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let dist = distance_between(
            Location {
                latitude: 0.0,
                longitude: 0.0,
            },
            Location {
                latitude: 1.0,
                longitude: 0.0,
            },
        );
        assert!((dist - 111_195.0).abs() < 10.0, "got {dist}");
    }
}
