//! Synthetic fields for builder messages and formula tests.
//!
//! Grids are row-major with row 0 first, matching the builder's default
//! north-to-south scanning.

/// 2 m temperature in Kelvin: 275 K in the north-west corner, warming by
/// 0.5 K per column and 0.25 K per row.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    (0..height)
        .flat_map(|row| (0..width).map(move |col| 275.0 + 0.5 * col as f32 + 0.25 * row as f32))
        .collect()
}

/// Dew point `depression` Kelvin below [`create_temperature_grid`].
pub fn create_dewpoint_grid(width: usize, height: usize, depression: f32) -> Vec<f32> {
    create_temperature_grid(width, height)
        .into_iter()
        .map(|t| t - depression)
        .collect()
}

/// Wind components rotating once around the compass across the grid.
///
/// Returns `(u, v)` with a constant speed of `speed` m/s.
pub fn create_wind_grids(width: usize, height: usize, speed: f32) -> (Vec<f32>, Vec<f32>) {
    let n = width * height;
    (0..n)
        .map(|k| {
            let angle = std::f32::consts::TAU * k as f32 / n.max(1) as f32;
            (speed * angle.sin(), speed * angle.cos())
        })
        .unzip()
}

/// Constant field with NaN at the given (col, row) positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    value: f32,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![value; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_and_dewpoint() {
        let t = create_temperature_grid(20, 20);
        let td = create_dewpoint_grid(20, 20, 5.0);
        assert_eq!(t[0], 275.0);
        assert_eq!(t[21], 275.75);
        assert!(t.iter().zip(&td).all(|(a, b)| (a - b - 5.0).abs() < 1e-4));
    }

    #[test]
    fn test_wind_speed_is_constant() {
        let (u, v) = create_wind_grids(4, 4, 10.0);
        assert_eq!(u.len(), 16);
        assert!(u.iter().zip(&v).all(|(a, b)| ((a * a + b * b).sqrt() - 10.0).abs() < 1e-4));
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, 1.5, &[(5, 5), (0, 0), (10, 0)]);
        assert!(grid[0].is_nan());
        assert!(grid[55].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 2);
        assert_eq!(grid[1], 1.5);
    }
}
