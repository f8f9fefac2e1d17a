//! Lambert Azimuthal Equal Area on the ellipsoid.
//!
//! Used for EPSG:3035 (ETRS89 / LAEA Europe). Formulas from Snyder,
//! "Map Projections: A Working Manual", pp. 187-190; the inverse latitude
//! uses the authalic series expansion.

use std::f64::consts::FRAC_PI_2;

/// GRS80 semi-major axis (meters)
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening
const GRS80_RF: f64 = 298.257_222_101;

#[derive(Debug, Clone, PartialEq)]
pub struct LambertAzimuthalEqualArea {
    lat0: f64,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    e2: f64,
    qp: f64,
    rq: f64,
    d: f64,
    sin_beta1: f64,
    cos_beta1: f64,
}

impl LambertAzimuthalEqualArea {
    /// Create a projection centred on (lat0, lon0) degrees on an ellipsoid.
    pub fn new(
        a: f64,
        inverse_flattening: f64,
        lat0_deg: f64,
        lon0_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let flattening = 1.0 / inverse_flattening;
        let e2 = 2.0 * flattening - flattening * flattening;
        let e = e2.sqrt();

        let lat0 = lat0_deg.to_radians();
        let qp = authalic_q(FRAC_PI_2, e, e2);
        let beta1 = (authalic_q(lat0, e, e2) / qp).asin();
        let rq = a * (qp / 2.0).sqrt();
        let d = a * (lat0.cos() / (1.0 - e2 * lat0.sin().powi(2)).sqrt()) / (rq * beta1.cos());

        Self {
            lat0,
            lon0: lon0_deg.to_radians(),
            false_easting,
            false_northing,
            e,
            e2,
            qp,
            rq,
            d,
            sin_beta1: beta1.sin(),
            cos_beta1: beta1.cos(),
        }
    }

    /// ETRS89 / LAEA Europe.
    pub fn epsg_3035() -> Self {
        Self::new(GRS80_A, GRS80_RF, 52.0, 10.0, 4_321_000.0, 3_210_000.0)
    }

    /// Geographic (degrees) to (easting, northing) meters.
    ///
    /// Returns `None` at the antipode of the projection centre.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;

        let q = authalic_q(lat, self.e, self.e2);
        let beta = (q / self.qp).clamp(-1.0, 1.0).asin();

        let denom = 1.0 + self.sin_beta1 * beta.sin() + self.cos_beta1 * beta.cos() * dlon.cos();
        if denom <= 1e-12 {
            return None;
        }
        let b = self.rq * (2.0 / denom).sqrt();

        let x = b * self.d * beta.cos() * dlon.sin();
        let y = (b / self.d)
            * (self.cos_beta1 * beta.sin() - self.sin_beta1 * beta.cos() * dlon.cos());

        let (e, n) = (x + self.false_easting, y + self.false_northing);
        (e.is_finite() && n.is_finite()).then_some((e, n))
    }

    /// (easting, northing) meters to geographic (lon, lat) degrees.
    pub fn unproject(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let x = easting - self.false_easting;
        let y = northing - self.false_northing;

        let rho = (x / self.d).hypot(self.d * y);
        if !rho.is_finite() {
            return None;
        }
        if rho < 1e-9 {
            return Some((self.lon0.to_degrees(), self.lat0.to_degrees()));
        }

        let ratio = rho / (2.0 * self.rq);
        if ratio > 1.0 {
            return None;
        }
        let c = 2.0 * ratio.asin();
        let (sin_c, cos_c) = c.sin_cos();

        let beta = (cos_c * self.sin_beta1 + self.d * y * sin_c * self.cos_beta1 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lon = self.lon0
            + (x * sin_c).atan2(
                self.d * rho * self.cos_beta1 * cos_c - self.d * self.d * y * self.sin_beta1 * sin_c,
            );

        let e4 = self.e2 * self.e2;
        let e6 = e4 * self.e2;
        let lat = beta
            + (self.e2 / 3.0 + 31.0 * e4 / 180.0 + 517.0 * e6 / 5040.0) * (2.0 * beta).sin()
            + (23.0 * e4 / 360.0 + 251.0 * e6 / 3780.0) * (4.0 * beta).sin()
            + (761.0 * e6 / 45360.0) * (6.0 * beta).sin();

        Some((lon.to_degrees(), lat.to_degrees()))
    }
}

/// Snyder's q(φ), proportional to the authalic latitude.
fn authalic_q(lat: f64, e: f64, e2: f64) -> f64 {
    let s = lat.sin();
    (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
}
