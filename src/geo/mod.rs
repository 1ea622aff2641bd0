//! Coordinate helpers: distance, validation, DMS conversion and cache-grid keys.

use geohash::Coord;

use crate::constants::EARTH_RADIUS_METERS;

/// Great-circle distance between two `(latitude, longitude)` points, in meters.
pub fn haversine_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Returns `true` for finite coordinates inside the WGS84 ranges.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// The (0, 0) point. Corrupt or zero-filled GPS tags decode to it, so it is never
/// trusted as a real observation.
pub fn is_null_island(latitude: f64, longitude: f64) -> bool {
    latitude == 0.0 && longitude == 0.0
}

/// Wraps a longitude into `[-180, 180]`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && longitude > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Converts degrees/minutes/seconds plus hemisphere reference (`N`, `S`, `E`, `W`) to
/// signed decimal degrees.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: char) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference.to_ascii_uppercase() {
        'S' | 'W' => -decimal,
        _ => decimal,
    }
}

/// Splits unsigned decimal degrees into `(degrees, minutes, seconds)`.
pub fn decimal_to_dms(decimal: f64) -> (u32, u32, f64) {
    let value = decimal.abs();
    let degrees = value.trunc();
    let minutes_full = (value - degrees) * 60.0;
    let minutes = minutes_full.trunc();
    let seconds = (minutes_full - minutes) * 60.0;
    (degrees as u32, minutes as u32, seconds)
}

/// Geohash cell containing the point. Nearby points share a cell, which is what lets the
/// geocoder cache answer for a neighbourhood instead of an exact coordinate.
pub fn grid_key(latitude: f64, longitude: f64, precision: usize) -> Option<String> {
    if !is_valid_coordinate(latitude, longitude) {
        return None;
    }
    geohash::encode(
        Coord {
            x: longitude,
            y: latitude,
        },
        precision,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn test_haversine_known_distance() {
        let d = haversine_meters(PARIS, LONDON);
        assert!((d - 343_500.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        assert_eq!(haversine_meters(PARIS, PARIS), 0.0);
        let ab = haversine_meters(PARIS, LONDON);
        let ba = haversine_meters(LONDON, PARIS);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_across_antimeridian() {
        let d = haversine_meters((0.0, 179.9), (0.0, -179.9));
        assert!(d < 25_000.0, "got {d}");
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(48.8584, 2.2945));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
    }

    #[test]
    fn test_null_island() {
        assert!(is_null_island(0.0, 0.0));
        assert!(is_null_island(-0.0, 0.0));
        assert!(!is_null_island(0.0, 0.0001));
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(10.0), 10.0);
        assert!((normalize_longitude(190.0) - -170.0).abs() < 1e-9);
        assert!((normalize_longitude(-190.0) - 170.0).abs() < 1e-9);
        assert_eq!(normalize_longitude(180.0), 180.0);
    }

    #[test]
    fn test_dms_round_trip() {
        let expected = 40.0 + 45.0 / 60.0 + 30.0 / 3600.0;
        assert!((dms_to_decimal(40.0, 45.0, 30.0, 'N') - expected).abs() < 1e-4);
        assert!((dms_to_decimal(40.0, 45.0, 30.0, 'W') + expected).abs() < 1e-4);

        let (d, m, s) = decimal_to_dms(-74.006);
        assert_eq!((d, m), (74, 0));
        assert!((s - 21.6).abs() < 1e-6);
    }

    #[test]
    fn test_grid_key_groups_nearby_points() {
        let a = grid_key(48.85840, 2.29450, 7).unwrap();
        let b = grid_key(48.85841, 2.29451, 7).unwrap();
        let far = grid_key(LONDON.0, LONDON.1, 7).unwrap();

        assert_eq!(a.len(), 7);
        assert_eq!(a, b);
        assert_ne!(a, far);
    }

    #[test]
    fn test_grid_key_rejects_invalid() {
        assert!(grid_key(f64::NAN, 0.0, 7).is_none());
        assert!(grid_key(95.0, 0.0, 7).is_none());
    }
}
