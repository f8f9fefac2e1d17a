//! GRIB2 section parsing.
//!
//! Each GRIB2 message consists of a fixed indicator section followed by
//! length-prefixed sections 1-7 and the "7777" end marker. The parsers here
//! take the full message slice and locate their section through a
//! [`SectionIndex`].

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use met_common::ScanMode;

use crate::error::{Grib2Error, Result};

/// Earth radius assumed when the shape code does not name a sphere (meters)
pub const DEFAULT_EARTH_RADIUS: f64 = 6_371_229.0;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Grid geometry from the grid definition template.
#[derive(Debug, Clone, PartialEq)]
pub enum GridTemplate {
    /// Template 3.0, coordinates in degrees
    LatLon {
        la1: f64,
        lo1: f64,
        la2: f64,
        lo2: f64,
        di: f64,
        dj: f64,
    },
    /// Template 3.30, angles in degrees, spacing in meters
    LambertConformal {
        la1: f64,
        lo1: f64,
        lad: f64,
        lov: f64,
        dx: f64,
        dy: f64,
        latin1: f64,
        latin2: f64,
        south_pole_projection: bool,
    },
    /// Any other template; only dimensions are known
    Other,
}

/// Section 3: Grid Definition Section
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template_number: u16,
    pub num_data_points: u32,
    pub shape_of_earth: u8,
    pub earth_radius: f64,
    pub ni: u32,
    pub nj: u32,
    pub scanning_mode: ScanMode,
    pub template: GridTemplate,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template_number: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub generating_process: u8,
    /// Code table 4.4 unit of `forecast_time`
    pub time_unit: u8,
    pub forecast_time: u32,
    pub level_type: u8,
    /// Level value with its scale factor applied
    pub level_value: f64,
    /// End of the overall time interval for statistically processed fields (template 4.8)
    pub interval_end: Option<DateTime<Utc>>,
}

impl ProductDefinition {
    /// Forecast offset in seconds, if the time unit is one we understand.
    pub fn forecast_seconds(&self) -> Option<i64> {
        time_unit_seconds(self.time_unit).map(|s| s * self.forecast_time as i64)
    }
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of packed values (present points only when a bitmap applies)
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    /// One bit per grid point, MSB first, set when the point is present
    pub data: Option<Bytes>,
}

impl Bitmap {
    pub fn absent() -> Self {
        Self {
            indicator: 255,
            data: None,
        }
    }
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

/// Byte ranges of sections 1-7 within one message.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    ranges: [Option<(usize, usize)>; 8],
}

impl SectionIndex {
    /// Walk the sections of a message. Repeated sections keep their first occurrence.
    pub fn build(message: &[u8]) -> Result<Self> {
        let mut index = Self::default();
        let mut offset = 16;

        loop {
            if offset + 4 <= message.len() && &message[offset..offset + 4] == b"7777" {
                return Ok(index);
            }
            if offset + 5 > message.len() {
                return Err(Grib2Error::InvalidFormat(
                    "Message ended before the 7777 end marker".to_string(),
                ));
            }

            let length = read_u32(&message[offset..]) as usize;
            let number = message[offset + 4];

            if length < 5 || offset + length > message.len() {
                return Err(Grib2Error::InvalidSection {
                    section: number,
                    reason: format!("Invalid section length {length} at offset {offset}"),
                });
            }
            if !(1..=7).contains(&number) {
                return Err(Grib2Error::InvalidSection {
                    section: number,
                    reason: format!("Unknown section number at offset {offset}"),
                });
            }

            let slot = &mut index.ranges[number as usize];
            if slot.is_none() {
                *slot = Some((offset, length));
            }
            offset += length;
        }
    }

    /// Slice of a section including its 5-byte header.
    pub fn section<'a>(&self, message: &'a [u8], number: u8) -> Result<&'a [u8]> {
        let (start, len) = self
            .ranges
            .get(number as usize)
            .copied()
            .flatten()
            .ok_or_else(|| Grib2Error::InvalidSection {
                section: number,
                reason: "Section not found".to_string(),
            })?;
        Ok(&message[start..start + len])
    }

    pub fn has(&self, number: u8) -> bool {
        self.ranges.get(number as usize).copied().flatten().is_some()
    }
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let message_length = u64::from_be_bytes([
        data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
    ]);

    Ok(Indicator {
        discipline,
        edition,
        message_length,
    })
}

/// Parse Section 1 (Identification)
pub fn parse_identification(section: &[u8]) -> Result<Identification> {
    if section.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: format!("Expected at least 21 bytes, got {}", section.len()),
        });
    }

    let sec_data = &section[5..];

    let year = read_u16(&sec_data[7..]);
    let (month, day, hour, minute, second) =
        (sec_data[9], sec_data[10], sec_data[11], sec_data[12], sec_data[13]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center: read_u16(sec_data),
        sub_center: read_u16(&sec_data[2..]),
        table_version: sec_data[4],
        local_table_version: sec_data[5],
        significance_of_reference_time: sec_data[6],
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
        production_status: sec_data[14],
        data_type: sec_data[15],
    })
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(section: &[u8]) -> Result<GridDefinition> {
    if section.len() < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    let num_data_points = read_u32(&section[6..]);
    let template_number = read_u16(&section[12..]);
    let gd = &section[14..];

    let require = |len: usize| -> Result<()> {
        if gd.len() < len {
            return Err(Grib2Error::InvalidSection {
                section: 3,
                reason: format!(
                    "Template 3.{} needs at least {} bytes, got {}",
                    template_number,
                    len,
                    gd.len()
                ),
            });
        }
        Ok(())
    };

    match template_number {
        0 => {
            require(58)?;
            let (shape, radius) = earth_shape(gd);
            // Angles are in microdegrees unless a basic angle is given
            let unit = angle_unit(read_u32(&gd[24..]), read_u32(&gd[28..]));
            let angle = |o: usize| decode_grib2_signed(&gd[o..o + 4]) as f64 * unit;

            Ok(GridDefinition {
                template_number,
                num_data_points,
                shape_of_earth: shape,
                earth_radius: radius,
                ni: read_u32(&gd[16..]),
                nj: read_u32(&gd[20..]),
                scanning_mode: ScanMode::from_grib2_flag(gd[57]),
                template: GridTemplate::LatLon {
                    la1: angle(32),
                    lo1: angle(36),
                    la2: angle(41),
                    lo2: angle(45),
                    di: read_u32(&gd[49..]) as f64 * unit,
                    dj: read_u32(&gd[53..]) as f64 * unit,
                },
            })
        }
        30 => {
            require(59)?;
            let (shape, radius) = earth_shape(gd);
            let micro = |o: usize| decode_grib2_signed(&gd[o..o + 4]) as f64 * 1e-6;

            Ok(GridDefinition {
                template_number,
                num_data_points,
                shape_of_earth: shape,
                earth_radius: radius,
                ni: read_u32(&gd[16..]),
                nj: read_u32(&gd[20..]),
                scanning_mode: ScanMode::from_grib2_flag(gd[50]),
                template: GridTemplate::LambertConformal {
                    la1: micro(24),
                    lo1: micro(28),
                    lad: micro(33),
                    lov: micro(37),
                    // Dx and Dy are stored in millimeters
                    dx: read_u32(&gd[41..]) as f64 * 1e-3,
                    dy: read_u32(&gd[45..]) as f64 * 1e-3,
                    latin1: micro(51),
                    latin2: micro(55),
                    south_pole_projection: gd[49] & 0x80 != 0,
                },
            })
        }
        _ => {
            // Most templates put Ni/Nj right after the earth shape block
            let (ni, nj) = if gd.len() >= 24 {
                (read_u32(&gd[16..]), read_u32(&gd[20..]))
            } else {
                (0, 0)
            };
            let (shape, radius) = if gd.len() >= 6 {
                earth_shape(gd)
            } else {
                (255, DEFAULT_EARTH_RADIUS)
            };

            Ok(GridDefinition {
                template_number,
                num_data_points,
                shape_of_earth: shape,
                earth_radius: radius,
                ni,
                nj,
                scanning_mode: ScanMode::standard(),
                template: GridTemplate::Other,
            })
        }
    }
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(section: &[u8]) -> Result<ProductDefinition> {
    if section.len() < 34 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: format!("Expected at least 34 bytes, got {}", section.len()),
        });
    }

    // Octets 10-34 share one layout across templates 4.0-4.15
    let template_number = read_u16(&section[7..]);
    let level_scale = decode_grib2_signed(&section[23..24]);
    let level_scaled = decode_grib2_signed(&section[24..28]);
    let level_value = if section[23] == 0xFF {
        0.0
    } else {
        level_scaled as f64 * 10f64.powi(-(level_scale as i32))
    };

    let interval_end = if template_number == 8 && section.len() >= 41 {
        NaiveDate::from_ymd_opt(
            read_u16(&section[34..]) as i32,
            section[36] as u32,
            section[37] as u32,
        )
        .and_then(|d| d.and_hms_opt(section[38] as u32, section[39] as u32, section[40] as u32))
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
    } else {
        None
    };

    Ok(ProductDefinition {
        template_number,
        parameter_category: section[9],
        parameter_number: section[10],
        generating_process: section[11],
        time_unit: section[17],
        forecast_time: read_u32(&section[18..]),
        level_type: section[22],
        level_value,
        interval_end,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(section: &[u8]) -> Result<DataRepresentation> {
    if section.len() < 11 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    let num_data_points = read_u32(&section[5..]);
    let template_number = read_u16(&section[9..]);

    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 start with the simple packing block
    if section.len() < 21 {
        return Ok(DataRepresentation {
            num_data_points,
            template_number,
            reference_value: 0.0,
            binary_scale_factor: 0,
            decimal_scale_factor: 0,
            bits_per_value: 0,
            original_data_type: 0,
        });
    }

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value: f32::from_be_bytes([section[11], section[12], section[13], section[14]]),
        binary_scale_factor: decode_grib2_signed(&section[15..17]) as i16,
        decimal_scale_factor: decode_grib2_signed(&section[17..19]) as i16,
        bits_per_value: section[19],
        original_data_type: section[20],
    })
}

/// Parse Section 6 (Bitmap)
pub fn parse_bitmap(section: &[u8]) -> Result<Bitmap> {
    if section.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    match section[5] {
        0 => Ok(Bitmap {
            indicator: 0,
            data: Some(Bytes::copy_from_slice(&section[6..])),
        }),
        255 => Ok(Bitmap::absent()),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(section: &[u8]) -> Result<DataSection> {
    if section.len() < 5 {
        return Err(Grib2Error::InvalidSection {
            section: 7,
            reason: "Not enough data".to_string(),
        });
    }

    Ok(DataSection {
        data: Bytes::copy_from_slice(&section[5..]),
    })
}

// ===== Helper Functions =====

/// Decode a GRIB2 signed integer.
///
/// GRIB2 stores signed values in sign-magnitude form: the most significant
/// bit is the sign, the remaining bits the magnitude. Accepts 1 to 8 bytes.
pub fn decode_grib2_signed(bytes: &[u8]) -> i64 {
    if bytes.is_empty() || bytes.len() > 8 {
        return 0;
    }

    let mut raw: u64 = 0;
    for &b in bytes {
        raw = (raw << 8) | b as u64;
    }

    let sign_bit = 1u64 << (bytes.len() * 8 - 1);
    let magnitude = (raw & !sign_bit) as i64;
    if raw & sign_bit != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Seconds per unit of Code Table 4.4, for the fixed-length units.
pub fn time_unit_seconds(unit: u8) -> Option<i64> {
    match unit {
        0 => Some(60),
        1 => Some(3_600),
        2 => Some(86_400),
        10 => Some(3 * 3_600),
        11 => Some(6 * 3_600),
        12 => Some(12 * 3_600),
        13 => Some(1),
        _ => None,
    }
}

/// Shape-of-earth code and the sphere radius it implies (Code Table 3.2).
fn earth_shape(gd: &[u8]) -> (u8, f64) {
    let shape = gd[0];
    let radius = match shape {
        0 => 6_367_470.0,
        1 => {
            let scaled = read_u32(&gd[2..]) as f64;
            let factor = gd[1] as i32;
            if scaled > 0.0 {
                scaled * 10f64.powi(-factor)
            } else {
                DEFAULT_EARTH_RADIUS
            }
        }
        6 => 6_371_229.0,
        8 => 6_371_200.0,
        _ => DEFAULT_EARTH_RADIUS,
    };
    (shape, radius)
}

/// Degrees per stored unit for template 3.0 angles.
fn angle_unit(basic_angle: u32, subdivisions: u32) -> f64 {
    if basic_angle == 0 || basic_angle == u32::MAX || subdivisions == 0 || subdivisions == u32::MAX
    {
        1e-6
    } else {
        basic_angle as f64 / subdivisions as f64
    }
}

fn read_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_grib2_signed() {
        assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x00, 0x00]), 0);
        assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x03, 0xE8]), 1000);
        assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x03, 0xE8]), -1000);
        assert_eq!(decode_grib2_signed(&[0xFF, 0xFF, 0xFF, 0xFF]), -2_147_483_647);
        // Negative zero
        assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x00]), 0);
    }

    #[test]
    fn test_decode_grib2_signed_short_fields() {
        // 2-byte scale factors
        assert_eq!(decode_grib2_signed(&[0x80, 0x02]), -2);
        assert_eq!(decode_grib2_signed(&[0x00, 0x02]), 2);
        // 1-byte level scale factor
        assert_eq!(decode_grib2_signed(&[0x81]), -1);
        assert_eq!(decode_grib2_signed(&[]), 0);
    }

    #[test]
    fn test_time_units() {
        assert_eq!(time_unit_seconds(1), Some(3600));
        assert_eq!(time_unit_seconds(13), Some(1));
        assert_eq!(time_unit_seconds(3), None);
    }

    #[test]
    fn test_indicator_rejects_edition_1() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(parse_indicator(&data).is_err());

        data[7] = 2;
        data[15] = 100;
        let ind = parse_indicator(&data).unwrap();
        assert_eq!(ind.message_length, 100);
    }

    #[test]
    fn test_level_scale_factor() {
        let mut section = vec![0u8; 34];
        section[4] = 4;
        section[22] = 103;
        section[23] = 1;
        section[24..28].copy_from_slice(&25u32.to_be_bytes());
        let pd = parse_product_definition(&section).unwrap();
        assert!((pd.level_value - 2.5).abs() < 1e-12);
    }
}
