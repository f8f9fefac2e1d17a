//! In-memory multi-band raster.
//!
//! A [`Dataset`] is a stack of equally sized bands sharing one geotransform
//! and spatial reference. Band data is stored north-up, row-major. Datasets
//! are not modified after construction; reprojection builds new ones.

use std::collections::BTreeMap;

use met_common::{BoundingBox, GeoTransform};
use projection::Crs;

use crate::error::{RasterError, Result};

/// One 2-D slice of a raster with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    data: Vec<f32>,
    description: String,
    metadata: BTreeMap<String, String>,
    no_data: Option<f32>,
}

impl Band {
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data,
            description: String::new(),
            metadata: BTreeMap::new(),
            no_data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_no_data(mut self, no_data: Option<f32>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Value of one metadata item.
    pub fn metadata_item(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    /// NaN is always no-data; the declared no-data value is too.
    pub fn is_no_data(&self, value: f32) -> bool {
        value.is_nan() || self.no_data == Some(value)
    }
}

/// A georeferenced multi-band raster.
#[derive(Debug, Clone)]
pub struct Dataset {
    width: usize,
    height: usize,
    geo_transform: GeoTransform,
    crs: Option<Crs>,
    bands: Vec<Band>,
}

impl Dataset {
    /// Build a dataset, checking every band against the dimensions.
    pub fn new(
        width: usize,
        height: usize,
        geo_transform: GeoTransform,
        crs: Option<Crs>,
        bands: Vec<Band>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::BandSizeMismatch {
                width,
                height,
                actual: 0,
            });
        }
        if geo_transform.invert().is_none() {
            return Err(RasterError::InvalidGeoTransform(format!(
                "{:?} is not invertible",
                geo_transform.coefficients()
            )));
        }
        if let Some(band) = bands.iter().find(|b| b.data.len() != width * height) {
            return Err(RasterError::BandSizeMismatch {
                width,
                height,
                actual: band.data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            geo_transform,
            crs,
            bands,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Copy of this dataset with the spatial reference replaced.
    pub fn with_crs(&self, crs: Crs) -> Self {
        Self {
            crs: Some(crs),
            ..self.clone()
        }
    }

    /// Copy of this dataset with every band's no-data value replaced.
    pub fn with_no_data(&self, no_data: Option<f32>) -> Self {
        Self {
            bands: self
                .bands
                .iter()
                .map(|b| b.clone().with_no_data(no_data))
                .collect(),
            ..self.clone()
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Band by 1-based index.
    pub fn band(&self, index: usize) -> Result<&Band> {
        index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or(RasterError::BandOutOfRange {
                index,
                count: self.bands.len(),
            })
    }

    /// Pixel (column, row) under a world coordinate, or `None` outside the raster.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.geo_transform.pixel_index(x, y)?;
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// Read one pixel of a 1-based band. `Ok(None)` means no data.
    pub fn read_pixel(&self, band: usize, col: usize, row: usize) -> Result<Option<f32>> {
        let b = self.band(band)?;
        if col >= self.width || row >= self.height {
            return Ok(None);
        }
        let value = b.data[row * self.width + col];
        Ok((!b.is_no_data(value)).then_some(value))
    }

    /// World-space extent of the outer pixel edges.
    pub fn extent(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (x, y) in self.geo_transform.corners(self.width, self.height) {
            bbox.include(x, y);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_3x2() -> Dataset {
        let gt = GeoTransform::north_up(0.0, 2.0, 1.0, -1.0);
        let band = Band::new(vec![1.0, 2.0, 3.0, 4.0, f32::NAN, -9999.0]).with_no_data(Some(-9999.0));
        Dataset::new(3, 2, gt, Some(Crs::Geographic), vec![band]).unwrap()
    }

    #[test]
    fn test_band_index_is_one_based() {
        let ds = dataset_3x2();
        assert!(ds.band(1).is_ok());
        assert!(matches!(ds.band(0), Err(RasterError::BandOutOfRange { index: 0, count: 1 })));
        assert!(ds.band(2).is_err());
    }

    #[test]
    fn test_read_pixel_no_data() {
        let ds = dataset_3x2();
        assert_eq!(ds.read_pixel(1, 2, 0).unwrap(), Some(3.0));
        assert_eq!(ds.read_pixel(1, 1, 1).unwrap(), None);
        assert_eq!(ds.read_pixel(1, 2, 1).unwrap(), None);
        assert_eq!(ds.read_pixel(1, 3, 0).unwrap(), None);
    }

    #[test]
    fn test_pixel_at_uses_floor() {
        let ds = dataset_3x2();
        assert_eq!(ds.pixel_at(0.0, 2.0), Some((0, 0)));
        assert_eq!(ds.pixel_at(2.99, 0.01), Some((2, 1)));
        assert_eq!(ds.pixel_at(-0.01, 1.0), None);
        assert_eq!(ds.pixel_at(3.0, 1.0), None);
        assert_eq!(ds.pixel_at(1.0, 2.01), None);
    }

    #[test]
    fn test_band_size_mismatch() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, -1.0);
        let result = Dataset::new(2, 2, gt, None, vec![Band::new(vec![0.0; 3])]);
        assert!(matches!(result, Err(RasterError::BandSizeMismatch { actual: 3, .. })));
    }

    #[test]
    fn test_degenerate_transform_rejected() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, -1.0);
        assert!(Dataset::new(1, 1, gt, None, vec![]).is_err());
    }

    #[test]
    fn test_with_crs_and_extent() {
        let ds = dataset_3x2();
        let other = ds.with_crs(Crs::WebMercator);
        assert_eq!(other.crs(), Some(&Crs::WebMercator));
        assert_eq!(ds.crs(), Some(&Crs::Geographic));

        let extent = ds.extent();
        assert_eq!(extent, BoundingBox::new(0.0, 0.0, 3.0, 2.0));
    }

    #[test]
    fn test_metadata_item() {
        let band = Band::new(vec![0.0])
            .with_metadata("GRIB_ELEMENT", "TMP")
            .with_description("2[m] HTGL");
        assert_eq!(band.metadata_item("GRIB_ELEMENT"), Some("TMP"));
        assert_eq!(band.metadata_item("GRIB_UNIT"), None);
        assert_eq!(band.description(), "2[m] HTGL");
    }
}
