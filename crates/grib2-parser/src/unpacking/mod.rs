//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded natively. Other packings
//! (complex, JPEG2000, PNG, CCSDS) are delegated to the `grib` crate.

use std::io::Cursor;

use crate::error::{Grib2Error, Result};

/// Unpack simple packed GRIB2 data onto the full grid.
///
/// Simple packing formula: value = (reference_value + packed_value * 2^E) * 10^(-D)
///
/// With a bitmap, the packed stream only holds the present points; missing
/// points become NaN and do not consume packed bits.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<f32>> {
    if bits_per_value > 32 {
        return Err(Grib2Error::UnpackingError(format!(
            "Invalid number of bits per value: {}",
            bits_per_value
        )));
    }

    let binary_scale = 2f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;

    let mut reader = BitReader::new(packed_data);
    let mut values = Vec::with_capacity(num_points);

    for i in 0..num_points {
        if let Some(bm) = bitmap {
            if !bit_is_set(bm, i) {
                values.push(f32::NAN);
                continue;
            }
        }

        let packed = if bits_per_value == 0 {
            0
        } else {
            reader.read(bits_per_value as usize).ok_or_else(|| {
                Grib2Error::UnpackingError(format!(
                    "Packed data exhausted at point {} of {}",
                    i, num_points
                ))
            })?
        };

        let value = (reference + packed as f64 * binary_scale) * decimal_scale;
        values.push(value as f32);
    }

    Ok(values)
}

/// Decode the first field of a complete GRIB2 message with the `grib` crate.
pub fn unpack_with_grib_crate(message: &[u8]) -> Result<Vec<f32>> {
    let grib_file = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate could not read message: {}", e)))?;

    let (_index, submessage) = grib_file
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::UnpackingError("Message contains no fields".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| Grib2Error::UnpackingError(format!("Unsupported field: {}", e)))?;

    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(format!("Decoding failed: {}", e)))?;

    Ok(values.collect())
}

/// True when bit `i` (MSB first) of the bitmap is set. Bits past the end count as present.
pub fn bit_is_set(bitmap: &[u8], i: usize) -> bool {
    match bitmap.get(i / 8) {
        Some(byte) => (byte >> (7 - (i % 8))) & 1 == 1,
        None => true,
    }
}

/// Big-endian bit cursor over packed data.
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn read(&mut self, num_bits: usize) -> Option<u32> {
        if self.position + num_bits > self.data.len() * 8 {
            return None;
        }

        let mut result = 0u32;
        for _ in 0..num_bits {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - (self.position % 8))) & 1;
            result = (result << 1) | bit as u32;
            self.position += 1;
        }
        Some(result)
    }
}
