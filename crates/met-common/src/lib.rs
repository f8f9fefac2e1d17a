//! Common types and utilities shared across the point extraction crates.

pub mod bbox;
pub mod crs;
pub mod geotransform;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use geotransform::{GeoTransform, InverseGeoTransform};
pub use grid::ScanMode;
pub use time::{format_metadata_timestamp, parse_metadata_timestamp, TimeParseError};
