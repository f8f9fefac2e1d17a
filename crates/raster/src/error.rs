//! Error types for raster operations.

use met_common::TimeParseError;
use thiserror::Error;

/// Errors that can occur while loading, reprojecting or sampling rasters.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Failed to open the raster source.
    #[error("failed to open raster: {0}")]
    OpenFailed(String),

    /// The GRIB2 reader failed.
    #[error("GRIB2 error: {0}")]
    Grib(#[from] grib2_parser::Grib2Error),

    /// The grid definition cannot be expressed as a georeferenced raster.
    #[error("unsupported grid: {0}")]
    UnsupportedGrid(String),

    /// Band data does not match the raster dimensions.
    #[error("band has {actual} values, raster is {width}x{height}")]
    BandSizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// A 1-based band index outside `1..=count`.
    #[error("band {index} out of range (dataset has {count} bands)")]
    BandOutOfRange { index: usize, count: usize },

    /// Reprojection was asked to extract zero bands.
    #[error("no bands to extract")]
    EmptyBandList,

    /// The dataset carries no spatial reference.
    #[error("dataset has no spatial reference")]
    MissingCrs,

    /// Degenerate or non-invertible geotransform.
    #[error("invalid geotransform: {0}")]
    InvalidGeoTransform(String),

    /// Projection error.
    #[error("projection error: {0}")]
    ProjectionError(String),

    /// A band lacks a required metadata item.
    #[error("band {band} has no '{key}' metadata")]
    MissingMetadata { band: usize, key: String },

    /// A band's timestamp metadata could not be parsed.
    #[error("band {band}: cannot parse timestamp '{value}': {source}")]
    TimestampParse {
        band: usize,
        value: String,
        #[source]
        source: TimeParseError,
    },

    /// A scratch entry was released or never existed.
    #[error("scratch entry not found: {0}")]
    ScratchNotFound(String),
}

impl RasterError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create an UnsupportedGrid error.
    pub fn unsupported_grid(msg: impl Into<String>) -> Self {
        Self::UnsupportedGrid(msg.into())
    }

    /// Create a ProjectionError.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::ProjectionError(msg.into())
    }
}

impl From<projection::ProjectionError> for RasterError {
    fn from(err: projection::ProjectionError) -> Self {
        Self::ProjectionError(err.to_string())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
