//! Lambert Conformal Conic projection (spherical earth).
//!
//! This is the native projection of the CERRA reanalysis grid. It maps a cone
//! tangent or secant to the Earth's surface onto a flat plane.
//!
//! The projection parameters follow GRIB2 template 3.30:
//! - LaD: latitude where Dx/Dy are specified, used as the latitude of origin
//! - LoV: the central meridian
//! - Latin1 / Latin2: the standard parallels (equal for a tangent cone)
//!
//! Projected coordinates are meters from (LoV, LaD), easting positive east,
//! northing positive north.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::{ProjectionError, Result};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// Central meridian (LoV) in radians
    pub lon0: f64,
    /// Latitude of origin (LaD) in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// Cone constant
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from the GRIB2 template 3.30 angles (degrees).
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        earth_radius: f64,
    ) -> Result<Self> {
        if !(earth_radius > 0.0) {
            return Err(ProjectionError::InvalidParameter(format!(
                "earth radius must be positive, got {earth_radius}"
            )));
        }

        let lat0 = lat0_deg.to_radians();
        let lon0 = lon0_deg.to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone
            latin1.sin()
        } else {
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((FRAC_PI_4 + latin2 / 2.0).tan() / (FRAC_PI_4 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        if !n.is_finite() || n.abs() < 1e-12 {
            return Err(ProjectionError::InvalidParameter(format!(
                "standard parallels {latin1_deg} / {latin2_deg} do not define a cone"
            )));
        }

        let f = (latin1.cos() * (FRAC_PI_4 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = earth_radius * f / (FRAC_PI_4 + lat0 / 2.0).tan().powf(n);

        Ok(Self {
            lon0,
            lat0,
            latin1,
            latin2,
            earth_radius,
            n,
            f,
            rho0,
        })
    }

    fn rho(&self, lat: f64) -> f64 {
        self.earth_radius * self.f / (FRAC_PI_4 + lat / 2.0).tan().powf(self.n)
    }

    /// Geographic (degrees) to projected meters.
    ///
    /// Returns `None` for the pole opposite the cone apex.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat = lat_deg.to_radians();
        if (lat + self.n.signum() * FRAC_PI_2).abs() < 1e-12 {
            return None;
        }

        let dlon = normalize_angle(lon_deg.to_radians() - self.lon0);
        let rho = self.rho(lat);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Projected meters to geographic (lon, lat) degrees.
    pub fn unproject(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let sign = self.n.signum();
        let dy = self.rho0 - y;
        let rho = sign * x.hypot(dy);

        if rho == 0.0 {
            return Some((self.lon0.to_degrees(), sign * 90.0));
        }

        let theta = (sign * x).atan2(sign * dy);
        let lat = 2.0 * (self.earth_radius * self.f / rho).powf(1.0 / self.n).atan() - FRAC_PI_2;
        let lon = normalize_angle(self.lon0 + theta / self.n);

        Some((lon.to_degrees(), lat.to_degrees()))
    }
}

/// A Lambert conformal grid: projection plus the position and spacing of its points.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertGrid {
    pub projection: LambertConformal,
    /// Projected coordinates of the first grid point
    pub x0: f64,
    pub y0: f64,
    /// Grid spacing in meters
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl LambertGrid {
    /// Build a grid whose first point sits at (lat1, lon1) and whose rows run northward.
    pub fn new(
        projection: LambertConformal,
        lat1_deg: f64,
        lon1_deg: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    ) -> Result<Self> {
        let (x0, y0) = projection.project(lon1_deg, lat1_deg).ok_or_else(|| {
            ProjectionError::InvalidParameter(format!(
                "first grid point ({lat1_deg}, {lon1_deg}) cannot be projected"
            ))
        })?;

        Ok(Self {
            projection,
            x0,
            y0,
            dx,
            dy,
            nx,
            ny,
        })
    }

    /// The CERRA reanalysis grid (1069 x 1069 points at 5.5 km).
    pub fn cerra() -> Result<Self> {
        let projection = LambertConformal::new(50.0, 8.0, 50.0, 50.0, 6_371_229.0)?;
        Self::new(projection, 20.29228, -17.485039, 5500.0, 5500.0, 1069, 1069)
    }

    /// Geographic (degrees) to fractional grid indices (i east, j north).
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> Option<(f64, f64)> {
        let (x, y) = self.projection.project(lon_deg, lat_deg)?;
        Some(((x - self.x0) / self.dx, (y - self.y0) / self.dy))
    }

    /// Fractional grid indices to geographic (lat, lon) degrees.
    pub fn grid_to_geo(&self, i: f64, j: f64) -> Option<(f64, f64)> {
        let (lon, lat) = self
            .projection
            .unproject(self.x0 + i * self.dx, self.y0 + j * self.dy)?;
        Some((lat, lon))
    }

    /// Check if a geographic point is within the grid.
    pub fn contains(&self, lat_deg: f64, lon_deg: f64) -> bool {
        match self.geo_to_grid(lat_deg, lon_deg) {
            Some((i, j)) => {
                i >= 0.0 && i <= (self.nx - 1) as f64 && j >= 0.0 && j <= (self.ny - 1) as f64
            }
            None => false,
        }
    }

    /// Approximate geographic bounding box as (min_lon, min_lat, max_lon, max_lat).
    ///
    /// Edges are curved in geographic space, so they are sampled rather than
    /// taken from the corners alone.
    pub fn geographic_bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lon = f64::MAX;
        let mut max_lon = f64::MIN;

        let last_i = self.nx.saturating_sub(1) as f64;
        let last_j = self.ny.saturating_sub(1) as f64;

        for t in 0..=20 {
            let frac = t as f64 / 20.0;
            let samples = [
                (frac * last_i, 0.0),
                (frac * last_i, last_j),
                (0.0, frac * last_j),
                (last_i, frac * last_j),
            ];
            for (i, j) in samples {
                if let Some((lat, lon)) = self.grid_to_geo(i, j) {
                    min_lat = min_lat.min(lat);
                    max_lat = max_lat.max(lat);
                    min_lon = min_lon.min(lon);
                    max_lon = max_lon.max(lon);
                }
            }
        }

        (min_lon, min_lat, max_lon, max_lat)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
}

/// Wrap an angle in radians to [-π, π].
fn normalize_angle(mut a: f64) -> f64 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_zero() {
        let proj = LambertConformal::new(50.0, 8.0, 50.0, 50.0, 6_371_229.0).unwrap();
        let (x, y) = proj.project(8.0, 50.0).unwrap();
        assert!(x.abs() < 1e-6, "x should be 0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be 0, got {}", y);
    }

    #[test]
    fn test_projection_roundtrip() {
        let proj = LambertConformal::new(38.5, -97.5, 33.0, 45.0, 6_371_229.0).unwrap();
        for (lon, lat) in [(-122.7, 21.1), (-94.5, 39.0), (-70.0, 50.0)] {
            let (x, y) = proj.project(lon, lat).unwrap();
            let (lon2, lat2) = proj.unproject(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-9, "lon roundtrip: {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat roundtrip: {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_east_is_positive_x() {
        let proj = LambertConformal::new(50.0, 8.0, 50.0, 50.0, 6_371_229.0).unwrap();
        let (x_east, _) = proj.project(12.0, 50.0).unwrap();
        let (_, y_north) = proj.project(8.0, 55.0).unwrap();
        assert!(x_east > 0.0);
        assert!(y_north > 0.0);
    }

    #[test]
    fn test_cerra_first_grid_point() {
        let grid = LambertGrid::cerra().unwrap();
        let (i, j) = grid.geo_to_grid(20.29228, -17.485039).unwrap();
        assert!(i.abs() < 1e-6, "i should be ~0, got {}", i);
        assert!(j.abs() < 1e-6, "j should be ~0, got {}", j);
    }

    #[test]
    fn test_cerra_covers_europe() {
        let grid = LambertGrid::cerra().unwrap();

        // Frankfurt and Reykjavik are both inside the domain
        assert!(grid.contains(50.11, 8.68));
        assert!(grid.contains(64.15, -21.94));
        // Cape Town is not
        assert!(!grid.contains(-33.9, 18.4));

        let (min_lon, min_lat, max_lon, max_lat) = grid.geographic_bounds();
        assert!(min_lat > 15.0 && min_lat < 25.0, "min_lat {}", min_lat);
        assert!(max_lat > 70.0, "max_lat {}", max_lat);
        assert!(min_lon < -30.0, "min_lon {}", min_lon);
        assert!(max_lon > 40.0, "max_lon {}", max_lon);
    }

    #[test]
    fn test_grid_roundtrip() {
        let grid = LambertGrid::cerra().unwrap();
        let (lat, lon) = grid.grid_to_geo(534.0, 534.0).unwrap();
        let (i, j) = grid.geo_to_grid(lat, lon).unwrap();
        assert!((i - 534.0).abs() < 1e-6);
        assert!((j - 534.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_degenerate_cone() {
        assert!(LambertConformal::new(0.0, 0.0, 30.0, -30.0, 6_371_229.0).is_err());
        assert!(LambertConformal::new(50.0, 8.0, 50.0, 50.0, 0.0).is_err());
    }
}
