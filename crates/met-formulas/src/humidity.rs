//! Relative humidity from temperature and dew point.

use num_traits::Float;

use crate::error::Result;
use crate::{constant, zip_with};

/// Magnus coefficient b.
pub const MAGNUS_B: f64 = 17.625;

/// Magnus coefficient c, in degrees Celsius.
pub const MAGNUS_C: f64 = 243.04;

/// Offset from Kelvin to degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Relative humidity in percent from temperature and dew point in Kelvin.
///
/// Uses the Magnus form `100 · e(Dp) / e(T)` with
/// `e(x) = exp(b·x / (c + x))`, x in Celsius. The result is not clamped:
/// a dew point above the temperature gives more than 100.
pub fn relative_humidity<T: Float>(temperature: T, dew_point: T) -> T {
    let offset = constant::<T>(KELVIN_OFFSET);
    constant::<T>(100.0) * magnus(dew_point - offset) / magnus(temperature - offset)
}

/// [`relative_humidity`] over equally sized arrays.
pub fn relative_humidities<T: Float>(temperature: &[T], dew_point: &[T]) -> Result<Vec<T>> {
    zip_with(temperature, dew_point, relative_humidity)
}

fn magnus<T: Float>(celsius: T) -> T {
    let b = constant::<T>(MAGNUS_B);
    let c = constant::<T>(MAGNUS_C);
    (b * celsius / (c + celsius)).exp()
}
