//! Derived meteorological quantities.
//!
//! Pure functions, generic over `f32` and `f64`. Each scalar formula has an
//! array form that applies it element-wise to two equally sized slices.
//!
//! ```
//! use met_formulas::{relative_humidity, wind_direction, wind_speed};
//!
//! assert_eq!(wind_speed(3.0, 4.0), 5.0);
//! assert_eq!(wind_direction(0.0, 1.0), 180.0);
//! assert!((relative_humidity(288.15, 288.15) - 100.0_f64).abs() < 1e-9);
//! ```

pub mod error;
pub mod humidity;
pub mod wind;

use num_traits::Float;

pub use error::{FormulaError, Result};
pub use humidity::{relative_humidities, relative_humidity, KELVIN_OFFSET, MAGNUS_B, MAGNUS_C};
pub use wind::{wind_direction, wind_directions, wind_speed, wind_speeds};

/// Literal converted to the float type; every `Float` represents these.
fn constant<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

fn zip_with<T, F>(left: &[T], right: &[T], f: F) -> Result<Vec<T>>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    if left.len() != right.len() {
        return Err(FormulaError::ShapeMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left.iter().zip(right).map(|(&a, &b)| f(a, b)).collect())
}
