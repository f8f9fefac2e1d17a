//! Coordinate Reference System codes.
//!
//! Only identifies a CRS; the projection math lives in the `projection` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known CRS codes accepted for point layers and reprojection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees, x = lon)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// ETRS89 / LAEA Europe (meters)
    Epsg3035,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" (lon/lat order, same as our EPSG:4326 handling)
    /// - "urn:ogc:def:crs:EPSG::3035"
    /// - "urn:ogc:def:crs:OGC:1.3:CRS84"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        let code = if let Some(rest) = normalized.strip_prefix("URN:OGC:DEF:CRS:") {
            match rest {
                "OGC:1.3:CRS84" | "OGC::CRS84" => return Ok(CrsCode::Epsg4326),
                // EPSG URNs carry an optional version between the authority and the code
                _ => match rest.strip_prefix("EPSG:") {
                    Some(versioned) => versioned.rsplit(':').next().unwrap_or(versioned).to_string(),
                    None => return Err(CrsParseError::UnsupportedCrs(s.to_string())),
                },
            }
        } else if normalized == "CRS:84" || normalized == "CRS84" {
            return Ok(CrsCode::Epsg4326);
        } else if let Some(rest) = normalized.strip_prefix("EPSG:") {
            rest.to_string()
        } else {
            normalized.clone()
        };

        match code.as_str() {
            "4326" => Ok(CrsCode::Epsg4326),
            "3857" | "900913" => Ok(CrsCode::Epsg3857),
            "3035" => Ok(CrsCode::Epsg3035),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg3035 => 3035,
        }
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("3035").unwrap(), CrsCode::Epsg3035);
        assert!(CrsCode::parse("EPSG:99999").is_err());
    }

    #[test]
    fn test_parse_urn() {
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG::3035").unwrap(),
            CrsCode::Epsg3035
        );
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG:9.8.15:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            CrsCode::Epsg4326
        );
        assert!(CrsCode::parse("urn:ogc:def:crs:FOO::1").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg3857, CrsCode::Epsg3035] {
            assert_eq!(code.to_string().parse::<CrsCode>().unwrap(), code);
        }
    }
}
