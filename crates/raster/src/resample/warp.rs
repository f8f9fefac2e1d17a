//! Warp a dataset into another spatial reference.
//!
//! The output grid is north-up. Unless a resolution is given, its extent is
//! the bounding box of the source outline (edges densified) in the target
//! reference, and its square pixel size keeps the source pixel count along
//! the diagonal.

use met_common::{BoundingBox, GeoTransform};
use projection::{transform, Crs};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interpolation::interpolate;
use crate::dataset::{Band, Dataset};
use crate::error::{RasterError, Result};
use crate::types::InterpolationMethod;

/// Upper bound on output pixels per band.
pub const MAX_OUTPUT_PIXELS: usize = 200_000_000;

/// Warp settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpOptions {
    /// Resampling kernel.
    pub method: InterpolationMethod,

    /// Output pixel size in target units; derived from the source when unset.
    pub resolution: Option<f64>,

    /// Sample points per source edge when computing the output extent.
    pub edge_samples: usize,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::Bilinear,
            resolution: None,
            edge_samples: 21,
        }
    }
}

/// Output grid chosen for a warp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
}

/// Pick the output grid for warping `source` into `target`.
pub fn suggest_output_grid(
    source: &Dataset,
    target: &Crs,
    options: &WarpOptions,
) -> Result<OutputGrid> {
    let source_crs = source.crs().ok_or(RasterError::MissingCrs)?;
    let gt = source.geo_transform();
    let (w, h) = (source.width() as f64, source.height() as f64);

    let steps = options.edge_samples.max(2) - 1;
    let mut extent = BoundingBox::empty();
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        for (col, row) in [(t * w, 0.0), (t * w, h), (0.0, t * h), (w, t * h)] {
            let (x, y) = gt.apply(col, row);
            if let Some((tx, ty)) = transform(source_crs, target, x, y) {
                extent.include(tx, ty);
            }
        }
    }

    if extent.is_empty() || extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(RasterError::projection(format!(
            "source outline cannot be represented in {}",
            target
        )));
    }

    let pixel_size = match options.resolution {
        Some(res) if res > 0.0 && res.is_finite() => res,
        Some(res) => {
            return Err(RasterError::projection(format!(
                "invalid target resolution {}",
                res
            )))
        }
        None => extent.diagonal() / (w * w + h * h).sqrt(),
    };

    let width = ((extent.width() / pixel_size).round() as usize).max(1);
    let height = ((extent.height() / pixel_size).round() as usize).max(1);
    if width.saturating_mul(height) > MAX_OUTPUT_PIXELS {
        return Err(RasterError::projection(format!(
            "output grid of {}x{} pixels is too large",
            width, height
        )));
    }

    Ok(OutputGrid {
        width,
        height,
        geo_transform: GeoTransform::north_up(
            extent.min_x,
            extent.max_y,
            pixel_size,
            -pixel_size,
        ),
    })
}

/// Resample every band of `source` into `target`.
///
/// Output pixels whose center falls outside the source raster are NaN.
/// Band metadata and no-data values are carried over unchanged.
pub fn warp(source: &Dataset, target: &Crs, options: &WarpOptions) -> Result<Dataset> {
    let source_crs = source.crs().ok_or(RasterError::MissingCrs)?;
    let inverse = source.geo_transform().invert().ok_or_else(|| {
        RasterError::InvalidGeoTransform("source geotransform is not invertible".to_string())
    })?;
    let grid = suggest_output_grid(source, target, options)?;

    debug!(
        from = %source_crs,
        to = %target,
        width = grid.width,
        height = grid.height,
        method = %options.method,
        "Warping dataset"
    );

    // Source pixel position (center-based) of every output pixel
    let positions: Vec<Option<(f64, f64)>> = (0..grid.height)
        .flat_map(|row| (0..grid.width).map(move |col| (col, row)))
        .map(|(col, row)| {
            let (x, y) = grid
                .geo_transform
                .apply(col as f64 + 0.5, row as f64 + 0.5);
            let (sx, sy) = transform(target, source_crs, x, y)?;
            let (c, r) = inverse.world_to_pixel(sx, sy);
            Some((c - 0.5, r - 0.5))
        })
        .collect();

    let (sw, sh) = (source.width(), source.height());
    let bands = source
        .bands()
        .iter()
        .map(|band| {
            let masked = masked_values(band);
            let data = positions
                .iter()
                .map(|pos| match pos {
                    Some((c, r)) => interpolate(options.method, &masked, sw, sh, *c, *r),
                    None => f32::NAN,
                })
                .collect();
            copy_band_attributes(band, data)
        })
        .collect();

    Dataset::new(
        grid.width,
        grid.height,
        grid.geo_transform,
        Some(target.clone()),
        bands,
    )
}

/// Band values with the declared no-data value replaced by NaN.
fn masked_values(band: &Band) -> Vec<f32> {
    band.data()
        .iter()
        .map(|&v| if band.is_no_data(v) { f32::NAN } else { v })
        .collect()
}

fn copy_band_attributes(band: &Band, data: Vec<f32>) -> Band {
    band.metadata().iter().fold(
        Band::new(data)
            .with_description(band.description())
            .with_no_data(band.no_data()),
        |b, (k, v)| b.with_metadata(k.clone(), v.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use met_common::CrsCode;

    fn latlon_dataset(value: f32) -> Dataset {
        // 10x10 one-degree cells, north-west corner at (-2.5, 55.5)
        let gt = GeoTransform::north_up(-2.5, 55.5, 1.0, -1.0);
        let band = Band::new(vec![value; 100]).with_metadata("GRIB_ELEMENT", "TMP");
        Dataset::new(10, 10, gt, Some(Crs::Geographic), vec![band]).unwrap()
    }

    #[test]
    fn test_identity_grid_matches_source() {
        let ds = latlon_dataset(1.0);
        let grid = suggest_output_grid(&ds, &Crs::Geographic, &WarpOptions::default()).unwrap();

        assert_eq!((grid.width, grid.height), (10, 10));
        assert!((grid.geo_transform.origin_x + 2.5).abs() < 1e-9);
        assert!((grid.geo_transform.origin_y - 55.5).abs() < 1e-9);
        assert!((grid.geo_transform.pixel_width - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_resolution() {
        let ds = latlon_dataset(1.0);
        let options = WarpOptions {
            resolution: Some(0.5),
            ..Default::default()
        };
        let grid = suggest_output_grid(&ds, &Crs::Geographic, &options).unwrap();
        assert_eq!((grid.width, grid.height), (20, 20));

        let bad = WarpOptions {
            resolution: Some(-1.0),
            ..Default::default()
        };
        assert!(suggest_output_grid(&ds, &Crs::Geographic, &bad).is_err());
    }

    #[test]
    fn test_warp_constant_to_laea() {
        let ds = latlon_dataset(273.5);
        let laea = Crs::from_code(CrsCode::Epsg3035);
        let out = warp(&ds, &laea, &WarpOptions::default()).unwrap();

        assert_eq!(out.crs(), Some(&laea));
        assert_eq!(out.band_count(), 1);
        assert_eq!(out.band(1).unwrap().metadata_item("GRIB_ELEMENT"), Some("TMP"));

        let data = out.band(1).unwrap().data();
        let valid: Vec<f32> = data.iter().copied().filter(|v| !v.is_nan()).collect();
        assert!(valid.len() > data.len() / 2);
        assert!(valid.iter().all(|&v| v == 273.5));
    }

    #[test]
    fn test_no_data_is_not_interpolated() {
        let gt = GeoTransform::north_up(0.0, 2.0, 1.0, -1.0);
        let band = Band::new(vec![1.0, -999.0, 1.0, 1.0]).with_no_data(Some(-999.0));
        let ds = Dataset::new(2, 2, gt, Some(Crs::Geographic), vec![band]).unwrap();

        let out = warp(&ds, &Crs::Geographic, &WarpOptions::default()).unwrap();
        assert_eq!(out.read_pixel(1, 1, 0).unwrap(), None);
        assert_eq!(out.read_pixel(1, 0, 1).unwrap(), Some(1.0));
    }

    #[test]
    fn test_warp_requires_crs() {
        let gt = GeoTransform::north_up(0.0, 1.0, 1.0, -1.0);
        let ds = Dataset::new(1, 1, gt, None, vec![Band::new(vec![0.0])]).unwrap();
        assert!(matches!(
            warp(&ds, &Crs::Geographic, &WarpOptions::default()),
            Err(RasterError::MissingCrs)
        ));
    }

    #[test]
    fn test_warp_preserves_gradient_direction() {
        // Values increase eastward
        let gt = GeoTransform::north_up(0.0, 10.0, 1.0, -1.0);
        let data: Vec<f32> = (0..100).map(|i| (i % 10) as f32).collect();
        let ds = Dataset::new(10, 10, gt, Some(Crs::Geographic), vec![Band::new(data)]).unwrap();

        let out = warp(&ds, &Crs::WebMercator, &WarpOptions::default()).unwrap();
        let w = out.width();
        let row = out.height() / 2;
        let band = out.band(1).unwrap().data();
        assert!(band[row * w + 1] < band[row * w + w - 2]);
    }
}
