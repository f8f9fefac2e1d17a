//! Point layers read from GeoJSON.
//!
//! Accepted documents:
//! - a `FeatureCollection` of `Point` features, optionally with a legacy
//!   named `crs` member (`{"type": "name", "properties": {"name": "EPSG:3035"}}`)
//! - a single `Feature` or bare `Point` geometry
//! - a bare array of features or `[x, y]` pairs
//!
//! Without a `crs` member, coordinates are lon/lat (EPSG:4326).

use std::path::Path;

use met_common::CrsCode;
use projection::Crs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExtractionError, Result};

/// One point of a point layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { id: None, x, y }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Ordered points plus the spatial reference of their coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    pub crs: Crs,
    pub points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
    #[serde(default)]
    crs: Option<NamedCrs>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    coordinates: Value,
}

#[derive(Debug, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

impl PointSet {
    pub fn new(crs: Crs, points: Vec<Point>) -> Self {
        Self { crs, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Same points with their coordinates reinterpreted in another reference.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    pub fn from_geojson_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_geojson_str(&contents)
    }

    pub fn from_geojson_str(json: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)?;

        match doc {
            Value::Array(items) => {
                let points = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Array(_) => coordinates_to_point(i, &item),
                        other => feature_to_point(i, serde_json::from_value(other)?),
                    })
                    .collect::<Result<_>>()?;
                Ok(Self::new(Crs::Geographic, points))
            }
            Value::Object(ref obj) => match obj.get("type").and_then(Value::as_str) {
                Some("FeatureCollection") => {
                    let fc: FeatureCollection = serde_json::from_value(doc)?;
                    let crs = match fc.crs {
                        Some(named) => parse_crs(&named.properties.name)?,
                        None => Crs::Geographic,
                    };
                    let points = fc
                        .features
                        .into_iter()
                        .enumerate()
                        .map(|(i, f)| feature_to_point(i, f))
                        .collect::<Result<_>>()?;
                    Ok(Self::new(crs, points))
                }
                Some("Feature") => {
                    let point = feature_to_point(0, serde_json::from_value(doc)?)?;
                    Ok(Self::new(Crs::Geographic, vec![point]))
                }
                Some("Point") => {
                    let geometry: Geometry = serde_json::from_value(doc)?;
                    let point = coordinates_to_point(0, &geometry.coordinates)?;
                    Ok(Self::new(Crs::Geographic, vec![point]))
                }
                Some(other) => Err(ExtractionError::InvalidPointLayer(format!(
                    "unsupported GeoJSON type '{}'",
                    other
                ))),
                None => Err(ExtractionError::InvalidPointLayer(
                    "GeoJSON object has no 'type'".to_string(),
                )),
            },
            _ => Err(ExtractionError::InvalidPointLayer(
                "expected a GeoJSON object or array".to_string(),
            )),
        }
    }
}

fn parse_crs(name: &str) -> Result<Crs> {
    CrsCode::parse(name)
        .map(Crs::from_code)
        .map_err(|e| ExtractionError::UnsupportedCrs(e.to_string()))
}

fn feature_to_point(index: usize, feature: Feature) -> Result<Point> {
    let geometry = feature.geometry.ok_or_else(|| {
        ExtractionError::InvalidPointLayer(format!("feature {} has no geometry", index))
    })?;
    if geometry.type_ != "Point" {
        return Err(ExtractionError::InvalidPointLayer(format!(
            "feature {} is a {}, expected Point",
            index, geometry.type_
        )));
    }

    let point = coordinates_to_point(index, &geometry.coordinates)?;
    let id = feature
        .id
        .as_ref()
        .and_then(id_text)
        .or_else(|| {
            let props = feature.properties.as_ref()?;
            props
                .get("id")
                .and_then(id_text)
                .or_else(|| props.get("name").and_then(id_text))
        });

    Ok(Point { id, ..point })
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coordinates_to_point(index: usize, coordinates: &Value) -> Result<Point> {
    let xy = coordinates
        .as_array()
        .filter(|c| c.len() >= 2)
        .and_then(|c| Some((c[0].as_f64()?, c[1].as_f64()?)));

    match xy {
        Some((x, y)) => Ok(Point::new(x, y)),
        None => Err(ExtractionError::InvalidPointLayer(format!(
            "feature {}: coordinates must be [x, y], got {}",
            index, coordinates
        ))),
    }
}
