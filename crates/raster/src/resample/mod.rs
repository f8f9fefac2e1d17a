//! Resampling: interpolation kernels and CRS-to-CRS warping.

pub mod interpolation;
pub mod warp;

pub use interpolation::{bilinear_interpolate, cubic_interpolate, interpolate, nearest_interpolate};
pub use warp::{suggest_output_grid, warp, OutputGrid, WarpOptions};
