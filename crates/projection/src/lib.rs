//! Coordinate reference system transformations.
//!
//! Implements the map projections needed for CERRA point extraction from
//! scratch: Lambert conformal (the CERRA grid), LAEA Europe, Web Mercator.

pub mod crs;
pub mod laea;
pub mod lambert;
pub mod mercator;

pub use crs::{transform, Crs};
pub use laea::LambertAzimuthalEqualArea;
pub use lambert::{LambertConformal, LambertGrid};

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Invalid projection parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
