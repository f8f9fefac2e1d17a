//! Shared test utilities for the point extraction workspace.
//!
//! - A synthetic GRIB2 message builder ([`Grib2Builder`])
//! - Field generators for temperature, dew point, wind and masked grids
//! - Fixtures: stations, the CERRA grid, CRS names, GeoJSON point layers
//! - Test data lookup for optional real files, with a skip macro
//!
//! ```ignore
//! use test_utils::{require_test_file, Grib2Builder};
//! ```

pub mod fixtures;
pub mod generators;
pub mod grib2;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use grib2::{concat_messages, write_temp_file, BuilderGrid, Grib2Builder};
pub use paths::*;

/// Resolve a real data file or skip the calling test.
///
/// Real reanalysis files are large and not checked in. When the file is
/// missing the test prints a note to stderr and returns early.
///
/// ```ignore
/// let path = require_test_file!("cerra_t2m.grib2");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("skipping: {} not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert two numbers differ by at most `epsilon`, comparing as `f64`.
///
/// ```ignore
/// assert_approx_eq!(wind_speed(3.0f32, 4.0), 5.0, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(287.35f32, 287.35, 1e-4);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }
}
