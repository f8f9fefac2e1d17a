//! GRIB2 parser implementation (WMO FM 92 GRIB Edition 2).
//!
//! Reads the sections of each message, resolves parameter and level codes
//! through [`Grib2Tables`], and unpacks field values. Simple packing is
//! decoded natively; other packings go through the `grib` crate.

pub mod error;
pub mod message;
pub mod sections;
pub mod tables;
pub mod unpacking;

pub use error::{Grib2Error, Result};
pub use message::{decompress_if_gzipped, Grib2Message, Grib2Reader};
pub use sections::{decode_grib2_signed, GridDefinition, GridTemplate};
pub use tables::{Grib2Tables, LevelDescription, ParameterInfo};
pub use unpacking::unpack_simple;
