//! Point sampling.
//!
//! A point is mapped to the pixel containing it through the inverse
//! geotransform (floor, never round). Every band is read at that pixel and
//! paired with the band's reference time, parsed from its metadata text.

use chrono::{DateTime, Utc};
use met_common::parse_metadata_timestamp;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{RasterError, Result};

/// One band's value at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandSample {
    pub value: f32,
    pub timestamp: DateTime<Utc>,
}

/// Result of sampling one point.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    /// One sample per band, in band order
    Values(Vec<BandSample>),
    /// The point maps outside the raster
    OutOfBounds { col: i64, row: i64 },
    /// A band has no data at the pixel; other bands' values are discarded
    NoData { band: usize, col: usize, row: usize },
}

impl SampleOutcome {
    pub fn samples(&self) -> Option<&[BandSample]> {
        match self {
            SampleOutcome::Values(v) => Some(v),
            _ => None,
        }
    }

    /// Human readable reason for a missing result.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            SampleOutcome::Values(_) => None,
            SampleOutcome::OutOfBounds { col, row } => {
                Some(format!("pixel ({}, {}) is outside the raster", col, row))
            }
            SampleOutcome::NoData { band, col, row } => {
                Some(format!("band {} has no data at pixel ({}, {})", band, col, row))
            }
        }
    }
}

/// Reference time of a 1-based band, parsed from its `key` metadata.
pub fn band_timestamp(dataset: &Dataset, band: usize, key: &str) -> Result<DateTime<Utc>> {
    let text = dataset
        .band(band)?
        .metadata_item(key)
        .ok_or_else(|| RasterError::MissingMetadata {
            band,
            key: key.to_string(),
        })?;

    parse_metadata_timestamp(text).map_err(|source| RasterError::TimestampParse {
        band,
        value: text.to_string(),
        source,
    })
}

/// Reference times of all bands, in band order.
pub fn band_timestamps(dataset: &Dataset, key: &str) -> Result<Vec<DateTime<Utc>>> {
    (1..=dataset.band_count())
        .map(|band| band_timestamp(dataset, band, key))
        .collect()
}

/// Sample every band of `dataset` at world coordinate (x, y).
///
/// Out-of-bounds and no-data are ordinary outcomes; a missing or unparsable
/// timestamp is an error.
pub fn sample_point(dataset: &Dataset, timestamp_key: &str, x: f64, y: f64) -> Result<SampleOutcome> {
    let (col, row) = dataset
        .geo_transform()
        .pixel_index(x, y)
        .ok_or_else(|| RasterError::InvalidGeoTransform("geotransform is not invertible".to_string()))?;

    if col < 0 || row < 0 || col >= dataset.width() as i64 || row >= dataset.height() as i64 {
        return Ok(SampleOutcome::OutOfBounds { col, row });
    }
    let (col, row) = (col as usize, row as usize);

    let mut samples = Vec::with_capacity(dataset.band_count());
    for band in 1..=dataset.band_count() {
        let value = match dataset.read_pixel(band, col, row)? {
            Some(v) => v,
            None => return Ok(SampleOutcome::NoData { band, col, row }),
        };
        let timestamp = band_timestamp(dataset, band, timestamp_key)?;
        samples.push(BandSample { value, timestamp });
    }

    Ok(SampleOutcome::Values(samples))
}
