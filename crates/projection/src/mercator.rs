//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::{FRAC_PI_4, PI};

/// Sphere radius used by Web Mercator (WGS84 semi-major axis)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Geographic (degrees) to Web Mercator meters.
///
/// Latitudes beyond ±[`MAX_LATITUDE`] have no representation and return `None`.
pub fn project(lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
    if !lon_deg.is_finite() || lat_deg.abs() > MAX_LATITUDE {
        return None;
    }
    let x = EARTH_RADIUS * lon_deg.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln();
    Some((x, y))
}

/// Web Mercator meters to geographic (lon, lat) degrees.
pub fn unproject(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Some((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let (x, y) = project(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);

        let (x, _) = project(180.0, 0.0).unwrap();
        assert!((x - 20_037_508.342789244).abs() < 1e-6);

        let (_, y) = project(0.0, MAX_LATITUDE).unwrap();
        assert!((y - 20_037_508.342789244).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = project(8.68, 50.11).unwrap();
        let (lon, lat) = unproject(x, y).unwrap();
        assert!((lon - 8.68).abs() < 1e-9);
        assert!((lat - 50.11).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitudes_rejected() {
        assert!(project(0.0, 89.0).is_none());
        assert!(project(0.0, -90.0).is_none());
    }
}
