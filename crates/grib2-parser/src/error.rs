//! GRIB2 parsing errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unsupported template {kind} {number}")]
    UnsupportedTemplate { kind: &'static str, number: u16 },

    #[error("Unpacking error: {0}")]
    UnpackingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Grib2Error>;
