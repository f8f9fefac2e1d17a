//! Interpolation kernels for grid resampling.
//!
//! Positions are fractional pixel coordinates between pixel centers:
//! (0, 0) is the center of the first pixel, (width - 1, height - 1) the
//! center of the last. Positions up to half a pixel beyond the outer
//! centers still lie on the raster and read the edge pixels.

use crate::types::InterpolationMethod;

/// Borrowed row-major band with edge-clamped reads.
#[derive(Clone, Copy)]
struct GridView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
}

impl<'a> GridView<'a> {
    fn new(data: &'a [f32], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }

    fn covers(&self, x: f64, y: f64) -> bool {
        (-0.5..self.width as f64 - 0.5).contains(&x) && (-0.5..self.height as f64 - 0.5).contains(&y)
    }

    fn at(&self, col: i64, row: i64) -> f32 {
        let col = col.clamp(0, self.width as i64 - 1) as usize;
        let row = row.clamp(0, self.height as i64 - 1) as usize;
        self.data[row * self.width + col]
    }
}

/// Sample `data` at (x, y) with the given kernel. NaN off the raster.
pub fn interpolate(
    method: InterpolationMethod,
    data: &[f32],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
) -> f32 {
    match method {
        InterpolationMethod::Nearest => nearest_interpolate(data, width, height, x, y),
        InterpolationMethod::Bilinear => bilinear_interpolate(data, width, height, x, y),
        InterpolationMethod::Cubic => cubic_interpolate(data, width, height, x, y),
    }
}

/// Value of the pixel whose center is closest to (x, y).
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let grid = GridView::new(data, width, height);
    if !grid.covers(x, y) {
        return f32::NAN;
    }
    grid.at((x + 0.5).floor() as i64, (y + 0.5).floor() as i64)
}

/// Weighted mean of the four surrounding pixel centers.
///
/// NaN if any of them is NaN. Four equal values reproduce that value
/// exactly.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let grid = GridView::new(data, width, height);
    if !grid.covers(x, y) {
        return f32::NAN;
    }
    bilinear(grid, x, y)
}

fn bilinear(grid: GridView<'_>, x: f64, y: f64) -> f32 {
    let x = x.max(0.0);
    let y = y.max(0.0);
    let (c, r) = (x.floor() as i64, y.floor() as i64);
    let tx = (x - c as f64) as f32;
    let ty = (y - r as f64) as f32;

    let corners = [grid.at(c, r), grid.at(c + 1, r), grid.at(c, r + 1), grid.at(c + 1, r + 1)];
    if corners.iter().any(|v| v.is_nan()) {
        return f32::NAN;
    }
    let [nw, ne, sw, se] = corners;

    // lerp form keeps equal corners exact
    let north = nw + (ne - nw) * tx;
    let south = sw + (se - sw) * tx;
    north + (south - north) * ty
}

/// Catmull-Rom bicubic over the surrounding 4x4 pixels.
///
/// Falls back to bilinear when any of the 16 pixels is NaN.
pub fn cubic_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let grid = GridView::new(data, width, height);
    if !grid.covers(x, y) {
        return f32::NAN;
    }

    let (c, r) = (x.floor() as i64, y.floor() as i64);
    let tx = (x - c as f64) as f32;
    let ty = (y - r as f64) as f32;

    let mut rows = [0.0f32; 4];
    for (j, slot) in rows.iter_mut().enumerate() {
        let row = r + j as i64 - 1;
        let p = [-1, 0, 1, 2].map(|i| grid.at(c + i, row));
        if p.iter().any(|v| v.is_nan()) {
            return bilinear(grid, x, y);
        }
        *slot = catmull_rom(p, tx);
    }
    catmull_rom(rows, ty)
}

fn catmull_rom([p0, p1, p2, p3]: [f32; 4], t: f32) -> f32 {
    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = 0.5 * (p2 - p0);
    ((a * t + b) * t + c) * t + p1
}
