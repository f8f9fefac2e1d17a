//! GRIB2 scanning modes and reordering to north-up raster layout.

use serde::{Deserialize, Serialize};

/// Decoded GRIB2 scanning mode (code table 3.4).
///
/// The default is the raster layout: rows west to east, first row north.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// Points run east to west along a row.
    pub i_negative: bool,
    /// Rows run south to north.
    pub j_positive: bool,
    /// Consecutive values walk down a column instead of along a row.
    pub j_consecutive: bool,
    /// Every other row reverses direction (boustrophedon).
    pub alternating_rows: bool,
}

impl ScanMode {
    const I_NEGATIVE: u8 = 0b1000_0000;
    const J_POSITIVE: u8 = 0b0100_0000;
    const J_CONSECUTIVE: u8 = 0b0010_0000;
    const ALTERNATING: u8 = 0b0001_0000;

    pub fn standard() -> Self {
        Self::default()
    }

    /// Decode the flag byte of a grid definition template.
    pub fn from_grib2_flag(flag: u8) -> Self {
        let set = |bit: u8| flag & bit == bit;
        Self {
            i_negative: set(Self::I_NEGATIVE),
            j_positive: set(Self::J_POSITIVE),
            j_consecutive: set(Self::J_CONSECUTIVE),
            alternating_rows: set(Self::ALTERNATING),
        }
    }

    /// Position (column from west, row from north) of the k-th value in scan order.
    pub fn raster_position(&self, k: usize, nx: usize, ny: usize) -> (usize, usize) {
        let (mut i, mut j) = if self.j_consecutive {
            (k / ny, k % ny)
        } else {
            (k % nx, k / nx)
        };

        if self.alternating_rows {
            if self.j_consecutive && i % 2 == 1 {
                j = ny - 1 - j;
            } else if !self.j_consecutive && j % 2 == 1 {
                i = nx - 1 - i;
            }
        }

        let col = if self.i_negative { nx - 1 - i } else { i };
        let row = if self.j_positive { ny - 1 - j } else { j };
        (col, row)
    }

    /// Reorder values from scan order into row-major, north-up, west-to-east layout.
    ///
    /// Returns `None` when the value count does not match `nx * ny`.
    pub fn to_north_up(&self, values: &[f32], nx: usize, ny: usize) -> Option<Vec<f32>> {
        if values.len() != nx * ny {
            return None;
        }
        if *self == Self::standard() {
            return Some(values.to_vec());
        }

        let mut out = vec![f32::NAN; values.len()];
        for (k, &v) in values.iter().enumerate() {
            let (col, row) = self.raster_position(k, nx, ny);
            out[row * nx + col] = v;
        }
        Some(out)
    }
}
