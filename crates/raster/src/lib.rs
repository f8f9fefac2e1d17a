//! Multi-band raster datasets for point extraction.
//!
//! Loads GRIB2 files into georeferenced in-memory datasets, selects bands
//! by metadata tag, warps them into another spatial reference and samples
//! them at single points.
//!
//! # Architecture
//!
//! ```text
//! GRIB2 file
//!      │
//!      ▼
//! open_grib() ──► Dataset (bands + GRIB_* metadata, geotransform, CRS)
//!      │
//!      ├─► select_bands(key, identifier) ──► [1-based indices]
//!      │
//!      ├─► reproject(store, bands, target)
//!      │         │
//!      │         ├─► subset ──► ScratchStore entry (released)
//!      │         └─► warp ────► ScratchStore entry (ScratchHandle)
//!      │
//!      └─► sample_point(x, y) ──► Values | OutOfBounds | NoData
//! ```
//!
//! # Example
//!
//! ```ignore
//! use raster::{open_grib, reproject, sample_point, select_bands_by_element};
//!
//! let ds = open_grib("cerra_t2m.grib2", tables)?;
//! let bands = select_bands_by_element(&ds, "TMP");
//! let out = reproject(&store, &ds, &bands, &Crs::Geographic, &WarpOptions::default())?;
//! let outcome = sample_point(&out.dataset, GRIB_REF_TIME, 8.52, 50.03)?;
//! out.release();
//! ```

pub mod dataset;
pub mod error;
pub mod grib;
pub mod reproject;
pub mod resample;
pub mod sample;
pub mod scratch;
pub mod select;
pub mod types;

// Re-export commonly used types at crate root
pub use dataset::{Band, Dataset};
pub use error::{RasterError, Result};
pub use grib::{
    dataset_from_messages, georeference, open_grib, GRIB_COMMENT, GRIB_DISCIPLINE, GRIB_ELEMENT,
    GRIB_FORECAST_SECONDS, GRIB_REF_TIME, GRIB_SHORT_NAME, GRIB_UNIT, GRIB_VALID_TIME,
};
pub use reproject::{extract_bands, reproject, Reprojected};
pub use resample::{warp, WarpOptions};
pub use sample::{band_timestamp, band_timestamps, sample_point, BandSample, SampleOutcome};
pub use scratch::{ScratchHandle, ScratchStats, ScratchStore};
pub use select::{select_bands, select_bands_by, select_bands_by_element};
pub use types::InterpolationMethod;
