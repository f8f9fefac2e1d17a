//! Wind speed and direction from vector components.
//!
//! `u` is the eastward and `v` the northward component. Direction is the
//! meteorological "from" direction in degrees clockwise from north.

use num_traits::Float;

use crate::error::Result;
use crate::{constant, zip_with};

/// Wind speed: `sqrt(u² + v²)`.
pub fn wind_speed<T: Float>(u: T, v: T) -> T {
    (u * u + v * v).sqrt()
}

/// Wind direction in degrees, `(180 + deg(atan2(u, v))) mod 360`.
///
/// Finite inputs give a value in `[0, 360)`. Calm wind (0, 0) gives 180.
pub fn wind_direction<T: Float>(u: T, v: T) -> T {
    let full = constant::<T>(360.0);
    let direction = (constant::<T>(180.0) + u.atan2(v).to_degrees()) % full;
    if direction < T::zero() {
        direction + full
    } else {
        direction
    }
}

/// [`wind_speed`] over equally sized component arrays.
pub fn wind_speeds<T: Float>(u: &[T], v: &[T]) -> Result<Vec<T>> {
    zip_with(u, v, wind_speed)
}

/// [`wind_direction`] over equally sized component arrays.
pub fn wind_directions<T: Float>(u: &[T], v: &[T]) -> Result<Vec<T>> {
    zip_with(u, v, wind_direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormulaError;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_speed() {
        assert_eq!(wind_speed(3.0, 4.0), 5.0);
        assert_eq!(wind_speed(0.0f32, 0.0), 0.0);
        assert_eq!(wind_speed(-3.0f32, -4.0), wind_speed(3.0, 4.0));
    }

    #[test]
    fn test_cardinal_directions() {
        assert_eq!(wind_direction(0.0, 1.0), 180.0);
        assert_eq!(wind_direction(0.0, -1.0), 0.0);
        assert_eq!(wind_direction(1.0, 0.0), 270.0);
        assert_eq!(wind_direction(-1.0, 0.0), 90.0);
    }

    #[test]
    fn test_diagonal_direction() {
        assert_approx_eq!(wind_direction(1.0, 1.0), 225.0, 1e-9);
        assert_approx_eq!(wind_direction(-1.0f32, -1.0), 45.0, 1e-4);
    }

    #[test]
    fn test_direction_range() {
        for &(u, v) in &[(0.0, 0.0), (1e-12, -1.0), (-1e-12, -1.0), (-0.0, -5.0), (7.0, -3.0)] {
            let d = wind_direction(u, v);
            assert!((0.0..360.0).contains(&d), "({}, {}) -> {}", u, v, d);
        }
    }

    #[test]
    fn test_array_forms() {
        let u = [0.0f32, 3.0, -1.0];
        let v = [1.0f32, 4.0, 0.0];
        assert_eq!(wind_speeds(&u, &v).unwrap(), vec![1.0, 5.0, 1.0]);
        assert_eq!(wind_directions(&u, &v).unwrap()[0], 180.0);
        assert_eq!(
            wind_speeds(&u, &v[..2]),
            Err(FormulaError::ShapeMismatch { left: 3, right: 2 })
        );
    }
}
