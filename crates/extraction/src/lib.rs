//! Point extraction from gridded reanalysis data.
//!
//! Samples a variable of a GRIB2 dataset (CERRA and similar) at a set of
//! point locations.
//!
//! # Architecture
//!
//! ```text
//! GRIB2 file ──► raster::open_grib ──► Dataset
//!                                        │
//! GeoJSON ─────► PointSet ───────┐       │
//!                                ▼       ▼
//!                        pipeline::extract_points
//!                          select ─► reproject ─► sample ─► release
//!                                        │
//!                                        ▼
//!                                  PipelineResult
//! ```
//!
//! Configuration ([`ExtractionConfig`]) picks the metadata keys used for the
//! variable tag and reference time, the resampling kernel and an optional
//! no-data value. GRIB2 parameter names come from WMO tables that a YAML
//! file can extend ([`build_tables`]).

pub mod config;
pub mod error;
pub mod pipeline;
pub mod points;
pub mod tables;

pub use config::ExtractionConfig;
pub use error::{ExtractionError, Result};
pub use pipeline::{extract_points, PipelineResult, PointResult, PointValues};
pub use points::{Point, PointSet};
pub use tables::{build_tables, load_tables, tables_from_yaml_str};
