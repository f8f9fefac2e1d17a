//! Affine geotransform between pixel (column, row) and world (x, y) space.
//!
//! Uses the six-coefficient layout common to raster tooling:
//!
//! ```text
//! x = origin_x + col * pixel_width  + row * row_rotation
//! y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! `(origin_x, origin_y)` is the outer corner of pixel (0, 0), so the center of
//! pixel (c, r) is at `apply(c + 0.5, r + 0.5)`.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation. `pixel_height` is normally negative.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Build from the six coefficients in (ox, pw, rr, oy, cr, ph) order.
    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    fn linear_part(&self) -> Matrix2<f64> {
        Matrix2::new(
            self.pixel_width,
            self.row_rotation,
            self.col_rotation,
            self.pixel_height,
        )
    }

    /// Map fractional pixel coordinates to world coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let world = self.linear_part() * Vector2::new(col, row);
        (self.origin_x + world.x, self.origin_y + world.y)
    }

    /// The inverse affine, mapping world coordinates to fractional pixels.
    ///
    /// Returns `None` for a degenerate (non-invertible) transform.
    pub fn invert(&self) -> Option<InverseGeoTransform> {
        let inverse = self.linear_part().try_inverse()?;
        Some(InverseGeoTransform {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            inverse,
        })
    }

    /// Integer pixel containing a world point.
    ///
    /// Uses floor semantics on the inverse mapping: a point anywhere inside a
    /// pixel's footprint lands on that pixel, never on a rounded neighbour.
    /// Points left of or above the origin produce negative indices.
    pub fn pixel_index(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (col, row) = self.invert()?.world_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        Some((col.floor() as i64, row.floor() as i64))
    }

    /// World coordinates of the four outer corners for a raster of the given size.
    pub fn corners(&self, width: usize, height: usize) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ]
    }
}

/// Precomputed inverse of a [`GeoTransform`].
#[derive(Debug, Clone, Copy)]
pub struct InverseGeoTransform {
    origin_x: f64,
    origin_y: f64,
    inverse: Matrix2<f64>,
}

impl InverseGeoTransform {
    /// Map world coordinates to fractional pixel coordinates (col, row).
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let pixel = self.inverse * Vector2::new(x - self.origin_x, y - self.origin_y);
        (pixel.x, pixel.y)
    }
}
