//! Point extraction pipeline.
//!
//! select bands → reproject into the points' reference → sample every point
//! against the one reprojected dataset → release the scratch entry.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use raster::{band_timestamps, reproject, sample_point, select_bands, Dataset, SampleOutcome, ScratchStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, Result};
use crate::points::PointSet;

/// Values of one point, or why there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointValues {
    /// One value per selected band, in band order
    Ok { values: Vec<f32> },
    OutOfBounds { message: String },
    NoData { band: usize, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub values: PointValues,
}

impl PointResult {
    pub fn values(&self) -> Option<&[f32]> {
        match &self.values {
            PointValues::Ok { values } => Some(values),
            _ => None,
        }
    }
}

/// Output of one pipeline run.
///
/// Every point with values has exactly one value per entry in `timestamps`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub variable: String,
    /// Selected 1-based band indices of the source dataset
    pub bands: Vec<usize>,
    pub crs: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub points: Vec<PointResult>,
}

impl PipelineResult {
    /// Per-point values in input order; `None` where the point has no result.
    pub fn values(&self) -> Vec<Option<&[f32]>> {
        self.points.iter().map(PointResult::values).collect()
    }

    /// Per-point coordinates in input order.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }

    /// Number of points that produced values.
    pub fn sampled_count(&self) -> usize {
        self.points.iter().filter(|p| p.values().is_some()).count()
    }
}

/// Extract `variable` from `dataset` at every point of `points`.
///
/// An empty band selection fails before anything is reprojected. Points
/// outside the reprojected raster or on no-data pixels get a diagnostic and
/// the run continues. A band timestamp that cannot be parsed fails the run.
pub fn extract_points(
    dataset: &Dataset,
    points: &PointSet,
    variable: &str,
    config: &ExtractionConfig,
    store: &ScratchStore,
) -> Result<PipelineResult> {
    info!(
        variable = %variable,
        points = points.len(),
        crs = %points.crs,
        "Starting point extraction"
    );

    let bands = select_bands(dataset, &config.variable_key, variable);
    if bands.is_empty() {
        return Err(ExtractionError::SelectionEmpty {
            variable: variable.to_string(),
            key: config.variable_key.clone(),
        });
    }
    debug!(variable = %variable, bands = ?bands, "Selected bands");

    let source = match config.no_data {
        Some(no_data) => Cow::Owned(dataset.with_no_data(Some(no_data))),
        None => Cow::Borrowed(dataset),
    };

    let reprojected = reproject(store, &source, &bands, &points.crs, &config.warp_options())?;
    let warped = &reprojected.dataset;
    let timestamps = band_timestamps(warped, &config.timestamp_key)?;

    let mut results = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let outcome = sample_point(warped, &config.timestamp_key, point.x, point.y)?;

        let values = match outcome {
            SampleOutcome::Values(samples) => {
                if samples.iter().map(|s| s.timestamp).ne(timestamps.iter().copied()) {
                    return Err(ExtractionError::TimestampMismatch { point: index });
                }
                PointValues::Ok {
                    values: samples.into_iter().map(|s| s.value).collect(),
                }
            }
            SampleOutcome::OutOfBounds { .. } => {
                let message = outcome.diagnostic().unwrap_or_default();
                warn!(point = index, x = point.x, y = point.y, "{}", message);
                PointValues::OutOfBounds { message }
            }
            SampleOutcome::NoData { band, .. } => {
                let message = outcome.diagnostic().unwrap_or_default();
                warn!(point = index, x = point.x, y = point.y, "{}", message);
                PointValues::NoData {
                    band: bands[band - 1],
                    message,
                }
            }
        };

        results.push(PointResult {
            id: point.id.clone(),
            x: point.x,
            y: point.y,
            values,
        });
    }

    reprojected.release();

    let result = PipelineResult {
        variable: variable.to_string(),
        bands,
        crs: points.crs.to_string(),
        timestamps,
        points: results,
    };
    info!(
        variable = %variable,
        sampled = result.sampled_count(),
        points = result.points.len(),
        "Point extraction complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Point;
    use met_common::GeoTransform;
    use projection::Crs;
    use raster::{Band, GRIB_ELEMENT, GRIB_REF_TIME};

    fn dataset(tags: &[(&str, f32)]) -> Dataset {
        // 4x4 one-degree cells over 8..12E, 48..52N
        let gt = GeoTransform::north_up(8.0, 52.0, 1.0, -1.0);
        let bands = tags
            .iter()
            .enumerate()
            .map(|(i, (tag, value))| {
                Band::new(vec![*value; 16])
                    .with_metadata(GRIB_ELEMENT, *tag)
                    .with_metadata(GRIB_REF_TIME, format!("{:>12} sec UTC", 1_583_020_800 + i * 10_800))
            })
            .collect();
        Dataset::new(4, 4, gt, Some(Crs::Geographic), bands).unwrap()
    }

    fn points(coords: &[(f64, f64)]) -> PointSet {
        PointSet::new(
            Crs::Geographic,
            coords.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        )
    }

    #[test]
    fn test_empty_selection_fails_before_reprojecting() {
        let ds = dataset(&[("TMP", 280.0)]);
        let store = ScratchStore::new();
        let err = extract_points(&ds, &points(&[(9.0, 50.0)]), "WIND", &ExtractionConfig::default(), &store)
            .unwrap_err();

        assert!(matches!(err, ExtractionError::SelectionEmpty { ref variable, .. } if variable == "WIND"));
        assert_eq!(store.stats().allocations, 0);
    }

    #[test]
    fn test_constant_values_and_shared_timestamps() {
        let ds = dataset(&[("TMP", 280.0), ("DPT", 270.0), ("TMP", 281.5)]);
        let store = ScratchStore::new();
        let result = extract_points(
            &ds,
            &points(&[(9.2, 50.7), (10.5, 49.1)]),
            "TMP",
            &ExtractionConfig::default(),
            &store,
        )
        .unwrap();

        assert_eq!(result.bands, vec![1, 3]);
        assert_eq!(result.timestamps.len(), 2);
        assert_eq!(result.timestamps[0].timestamp(), 1_583_020_800);
        assert_eq!(result.timestamps[1].timestamp(), 1_583_042_400);
        for values in result.values() {
            assert_eq!(values, Some(&[280.0f32, 281.5][..]));
        }
        assert_eq!(result.coordinates(), vec![(9.2, 50.7), (10.5, 49.1)]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_out_of_bounds_point_continues() {
        let ds = dataset(&[("TMP", 280.0)]);
        let store = ScratchStore::new();
        let result = extract_points(
            &ds,
            &points(&[(-21.9, 64.1), (9.0, 50.0)]),
            "TMP",
            &ExtractionConfig::default(),
            &store,
        )
        .unwrap();

        assert!(matches!(result.points[0].values, PointValues::OutOfBounds { .. }));
        assert_eq!(result.points[1].values(), Some(&[280.0f32][..]));
        assert_eq!(result.sampled_count(), 1);
    }

    #[test]
    fn test_no_data_override() {
        let ds = dataset(&[("TMP", 9999.0)]);
        let config = ExtractionConfig {
            no_data: Some(9999.0),
            ..Default::default()
        };
        let result = extract_points(&ds, &points(&[(9.5, 50.5)]), "TMP", &config, &ScratchStore::new()).unwrap();

        assert!(matches!(result.points[0].values, PointValues::NoData { band: 1, .. }));
    }

    #[test]
    fn test_unparsable_timestamp_is_fatal() {
        let gt = GeoTransform::north_up(8.0, 52.0, 1.0, -1.0);
        let band = Band::new(vec![1.0; 16])
            .with_metadata(GRIB_ELEMENT, "TMP")
            .with_metadata(GRIB_REF_TIME, "yesterday");
        let ds = Dataset::new(4, 4, gt, Some(Crs::Geographic), vec![band]).unwrap();
        let store = ScratchStore::new();

        let result = extract_points(&ds, &points(&[(9.0, 50.0)]), "TMP", &ExtractionConfig::default(), &store);
        assert!(matches!(result, Err(ExtractionError::Raster(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_result_json_shape() {
        let result = PipelineResult {
            variable: "TMP".to_string(),
            bands: vec![1],
            crs: "EPSG:4326".to_string(),
            timestamps: vec![],
            points: vec![
                PointResult {
                    id: Some("10637".to_string()),
                    x: 8.5,
                    y: 50.0,
                    values: PointValues::Ok { values: vec![280.0] },
                },
                PointResult {
                    id: None,
                    x: 0.0,
                    y: 0.0,
                    values: PointValues::OutOfBounds {
                        message: "outside".to_string(),
                    },
                },
            ],
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["points"][0]["status"], "ok");
        assert_eq!(json["points"][0]["values"][0], 280.0);
        assert_eq!(json["points"][0]["id"], "10637");
        assert_eq!(json["points"][1]["status"], "out_of_bounds");
        assert!(json["points"][1].get("id").is_none());
    }
}
