//! Error types for the extraction crate.

use thiserror::Error;

/// Errors that can occur during point extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Raster error: {0}")]
    Raster(#[from] raster::RasterError),

    #[error("No bands with {key} = '{variable}'")]
    SelectionEmpty { variable: String, key: String },

    #[error("Point {point}: band timestamps differ from the dataset's")]
    TimestampMismatch { point: usize },

    #[error("Invalid point layer: {0}")]
    InvalidPointLayer(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported spatial reference: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
