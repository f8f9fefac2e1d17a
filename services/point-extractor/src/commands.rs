//! Subcommand implementations.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use extraction::{build_tables, extract_points, ExtractionConfig, PipelineResult, PointResult, PointSet, PointValues};
use projection::Crs;
use raster::{open_grib, Dataset, ScratchStore};
use serde::Serialize;
use tracing::info;

/// One band as listed by `inspect`.
#[derive(Debug, Serialize)]
pub struct BandInfo {
    pub band: usize,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub width: usize,
    pub height: usize,
    pub crs: Option<String>,
    pub geo_transform: [f64; 6],
    pub bands: Vec<BandInfo>,
}

/// Values derived from two extracted variables.
#[derive(Debug, Serialize)]
pub struct DerivedResult {
    pub inputs: [String; 2],
    pub crs: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub points: Vec<DerivedPoint>,
}

#[derive(Debug, Serialize)]
pub struct DerivedPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub values: DerivedValues,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DerivedValues {
    Ok { values: BTreeMap<String, Vec<f32>> },
    Missing { message: String },
}

/// Open a GRIB2 file with the configured parameter tables.
///
/// `source_crs` replaces the spatial reference read from the file.
pub fn open_dataset(path: &Path, config: &ExtractionConfig, source_crs: Option<&Crs>) -> Result<Dataset> {
    let tables = build_tables(config.parameter_tables.as_deref())?;
    let dataset = open_grib(path, tables).with_context(|| format!("Failed to open {}", path.display()))?;

    Ok(match source_crs {
        Some(crs) => {
            info!(crs = %crs, "Overriding source spatial reference");
            dataset.with_crs(crs.clone())
        }
        None => dataset,
    })
}

pub fn load_points(path: &Path) -> Result<PointSet> {
    PointSet::from_geojson_file(path).with_context(|| format!("Failed to read point layer {}", path.display()))
}

pub fn inspect(dataset: &Dataset) -> DatasetInfo {
    DatasetInfo {
        width: dataset.width(),
        height: dataset.height(),
        crs: dataset.crs().map(|c| c.to_string()),
        geo_transform: dataset.geo_transform().coefficients(),
        bands: dataset
            .bands()
            .iter()
            .enumerate()
            .map(|(i, band)| BandInfo {
                band: i + 1,
                description: band.description().to_string(),
                metadata: band.metadata().clone(),
            })
            .collect(),
    }
}

pub fn extract(
    dataset: &Dataset,
    points: &PointSet,
    variable: &str,
    config: &ExtractionConfig,
) -> Result<PipelineResult> {
    let store = ScratchStore::new();
    extract_points(dataset, points, variable, config, &store)
        .with_context(|| format!("Extraction of {} failed", variable))
}

/// Wind speed and direction from the `u` and `v` component variables.
pub fn wind(
    dataset: &Dataset,
    points: &PointSet,
    u: &str,
    v: &str,
    config: &ExtractionConfig,
) -> Result<DerivedResult> {
    let u_result = extract(dataset, points, u, config)?;
    let v_result = extract(dataset, points, v, config)?;

    combine(&u_result, &v_result, |u, v| {
        let mut values = BTreeMap::new();
        values.insert("speed".to_string(), met_formulas::wind_speeds(u, v)?);
        values.insert("direction".to_string(), met_formulas::wind_directions(u, v)?);
        Ok(values)
    })
}

/// Relative humidity from temperature and dew point variables (Kelvin).
pub fn humidity(
    dataset: &Dataset,
    points: &PointSet,
    temperature: &str,
    dew_point: &str,
    config: &ExtractionConfig,
) -> Result<DerivedResult> {
    let t_result = extract(dataset, points, temperature, config)?;
    let dp_result = extract(dataset, points, dew_point, config)?;

    combine(&t_result, &dp_result, |t, dp| {
        let mut values = BTreeMap::new();
        values.insert(
            "relative_humidity".to_string(),
            met_formulas::relative_humidities(t, dp)?,
        );
        Ok(values)
    })
}

fn combine<F>(first: &PipelineResult, second: &PipelineResult, derive: F) -> Result<DerivedResult>
where
    F: Fn(&[f32], &[f32]) -> met_formulas::Result<BTreeMap<String, Vec<f32>>>,
{
    if first.timestamps != second.timestamps {
        bail!(
            "{} and {} have different reference times",
            first.variable,
            second.variable
        );
    }

    let points = first
        .points
        .iter()
        .zip(&second.points)
        .map(|(a, b)| {
            let values = match (a.values(), b.values()) {
                (Some(x), Some(y)) => DerivedValues::Ok { values: derive(x, y)? },
                _ => DerivedValues::Missing {
                    message: diagnostic(a)
                        .or_else(|| diagnostic(b))
                        .unwrap_or_default(),
                },
            };
            Ok(DerivedPoint {
                id: a.id.clone(),
                x: a.x,
                y: a.y,
                values,
            })
        })
        .collect::<Result<_>>()?;

    Ok(DerivedResult {
        inputs: [first.variable.clone(), second.variable.clone()],
        crs: first.crs.clone(),
        timestamps: first.timestamps.clone(),
        points,
    })
}

fn diagnostic(point: &PointResult) -> Option<String> {
    match &point.values {
        PointValues::Ok { .. } => None,
        PointValues::OutOfBounds { message } | PointValues::NoData { message, .. } => {
            Some(message.clone())
        }
    }
}

/// Write `value` as JSON to `output`, or stdout when unset.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote output");
        }
        None => std::io::stdout().lock().write_all(json.as_bytes())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::{points_geojson, stations};
    use test_utils::{assert_approx_eq, concat_messages, write_temp_file, Grib2Builder};

    fn grib_file() -> tempfile::NamedTempFile {
        let bytes = concat_messages(&[
            Grib2Builder::new_cerra().with_constant_value(288.15).build(),
            Grib2Builder::new_cerra()
                .with_parameter(0, 6)
                .with_constant_value(283.15)
                .build(),
            Grib2Builder::new_cerra()
                .with_parameter(2, 2)
                .with_level(103, 0, 10)
                .with_constant_value(3.0)
                .build(),
            Grib2Builder::new_cerra()
                .with_parameter(2, 3)
                .with_level(103, 0, 10)
                .with_constant_value(4.0)
                .build(),
        ]);
        write_temp_file(&bytes, ".grib2")
    }

    fn points() -> PointSet {
        let mut list = stations::RHINE_MAIN.to_vec();
        list.push(stations::REYKJAVIK);
        PointSet::from_geojson_str(&points_geojson(&list, None)).unwrap()
    }

    #[test]
    fn test_inspect() {
        let file = grib_file();
        let ds = open_dataset(file.path(), &ExtractionConfig::default(), None).unwrap();
        let info = inspect(&ds);

        assert_eq!(info.bands.len(), 4);
        assert_eq!(info.bands[2].metadata["GRIB_ELEMENT"], "UGRD");
        assert_eq!(info.bands[3].band, 4);
    }

    #[test]
    fn test_source_crs_override() {
        let file = grib_file();
        let ds = open_dataset(file.path(), &ExtractionConfig::default(), Some(&Crs::WebMercator)).unwrap();
        assert_eq!(ds.crs(), Some(&Crs::WebMercator));
    }

    #[test]
    fn test_wind() {
        let file = grib_file();
        let ds = open_dataset(file.path(), &ExtractionConfig::default(), None).unwrap();
        let result = wind(&ds, &points(), "UGRD", "VGRD", &ExtractionConfig::default()).unwrap();

        match &result.points[0].values {
            DerivedValues::Ok { values } => {
                assert_approx_eq!(values["speed"][0], 5.0, 1e-5);
                assert_approx_eq!(values["direction"][0], 216.8699, 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(result.points[3].values, DerivedValues::Missing { .. }));
    }

    #[test]
    fn test_humidity() {
        let file = grib_file();
        let ds = open_dataset(file.path(), &ExtractionConfig::default(), None).unwrap();
        let result = humidity(&ds, &points(), "TMP", "DPT", &ExtractionConfig::default()).unwrap();

        match &result.points[1].values {
            DerivedValues::Ok { values } => {
                assert_approx_eq!(values["relative_humidity"][0], 72.035, 0.01);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_variable() {
        let file = grib_file();
        let ds = open_dataset(file.path(), &ExtractionConfig::default(), None).unwrap();
        assert!(humidity(&ds, &points(), "TMP", "RH", &ExtractionConfig::default()).is_err());
    }

    #[test]
    fn test_write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&serde_json::json!({"a": 1}), Some(&path), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}\n");
    }
}
