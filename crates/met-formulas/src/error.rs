//! Error types for the formula library.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Input shapes differ: {left} vs {right} values")]
    ShapeMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, FormulaError>;
