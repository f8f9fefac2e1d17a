//! Projection-capable coordinate reference systems and point transforms.

use std::fmt;

use met_common::CrsCode;

use crate::laea::LambertAzimuthalEqualArea;
use crate::lambert::LambertConformal;
use crate::mercator;

/// A coordinate reference system that can convert to and from geographic coordinates.
///
/// Geographic coordinates are always (lon, lat) in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// WGS84 lon/lat degrees
    Geographic,
    /// EPSG:3857
    WebMercator,
    /// EPSG:3035 or another LAEA definition
    Laea(LambertAzimuthalEqualArea),
    /// Lambert conformal conic, typically from a GRIB2 grid definition
    LambertConformal(LambertConformal),
}

impl Crs {
    pub fn from_code(code: CrsCode) -> Self {
        match code {
            CrsCode::Epsg4326 => Crs::Geographic,
            CrsCode::Epsg3857 => Crs::WebMercator,
            CrsCode::Epsg3035 => Crs::Laea(LambertAzimuthalEqualArea::epsg_3035()),
        }
    }

    /// The EPSG code, if this CRS has one.
    pub fn code(&self) -> Option<CrsCode> {
        match self {
            Crs::Geographic => Some(CrsCode::Epsg4326),
            Crs::WebMercator => Some(CrsCode::Epsg3857),
            Crs::Laea(p) if *p == LambertAzimuthalEqualArea::epsg_3035() => Some(CrsCode::Epsg3035),
            _ => None,
        }
    }

    /// Native coordinates to (lon, lat) degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Crs::Geographic => (x.is_finite() && y.is_finite() && y.abs() <= 90.0).then_some((x, y)),
            Crs::WebMercator => mercator::unproject(x, y),
            Crs::Laea(p) => p.unproject(x, y),
            Crs::LambertConformal(p) => p.unproject(x, y),
        }
    }

    /// (lon, lat) degrees to native coordinates.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        match self {
            Crs::Geographic => Some((lon, lat)),
            Crs::WebMercator => mercator::project(lon, lat),
            Crs::Laea(p) => p.project(lon, lat),
            Crs::LambertConformal(p) => p.project(lon, lat),
        }
    }
}

impl From<CrsCode> for Crs {
    fn from(code: CrsCode) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code() {
            return write!(f, "{code}");
        }
        match self {
            Crs::Laea(_) => write!(f, "LAEA (custom)"),
            Crs::LambertConformal(p) => write!(
                f,
                "Lambert Conformal (LoV {:.4}, LaD {:.4}, Latin1 {:.4}, Latin2 {:.4})",
                p.lon0.to_degrees(),
                p.lat0.to_degrees(),
                p.latin1.to_degrees(),
                p.latin2.to_degrees()
            ),
            _ => Ok(()),
        }
    }
}

/// Transform a point between two reference systems via geographic coordinates.
pub fn transform(from: &Crs, to: &Crs, x: f64, y: f64) -> Option<(f64, f64)> {
    if from == to {
        return (x.is_finite() && y.is_finite()).then_some((x, y));
    }
    let (lon, lat) = from.to_geographic(x, y)?;
    to.from_geographic(lon, lat)
}
