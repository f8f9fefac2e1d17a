//! Synthetic GRIB2 message builder.
//!
//! Creates small but structurally valid GRIB2 edition 2 messages: template
//! 3.0 or 3.30 grids, product template 4.0, simple packing (5.0) and an
//! optional bitmap for NaN values. Signed fields are written in GRIB2
//! sign-magnitude form.

use std::io::Write;

/// Grid geometry written into section 3.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderGrid {
    /// Template 3.0, degrees
    LatLon { la1: f64, lo1: f64, di: f64, dj: f64 },
    /// Template 3.30, angles in degrees, spacing in meters
    Lambert {
        la1: f64,
        lo1: f64,
        lad: f64,
        lov: f64,
        latin1: f64,
        latin2: f64,
        dx: f64,
        dy: f64,
    },
}

/// Build a single GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    ni: u32,
    nj: u32,
    grid: BuilderGrid,
    shape_of_earth: u8,
    scanning_mode: u8,
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_scale: i8,
    level_value: i32,
    time_unit: u8,
    forecast_time: u32,
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// 10x10 one-degree lat/lon grid over central Europe, scanned north to south.
    pub fn new_latlon() -> Self {
        let (ni, nj) = (10, 10);
        Self {
            discipline: 0,
            center: 98, // ECMWF
            year: 2020,
            month: 3,
            day: 1,
            hour: 0,
            ni,
            nj,
            grid: BuilderGrid::LatLon {
                la1: 55.0,
                lo1: -2.0,
                di: 1.0,
                dj: 1.0,
            },
            shape_of_earth: 6,
            scanning_mode: 0x00,
            param_category: 0,
            param_number: 0, // TMP
            level_type: 103,
            level_scale: 0,
            level_value: 2,
            time_unit: 1,
            forecast_time: 0,
            data_values: vec![288.15; (ni * nj) as usize],
        }
    }

    /// 20x20 Lambert conformal grid in the CERRA projection, scanned south to north.
    ///
    /// The first point sits 55 km south-west of the projection origin (50N, 8E),
    /// so the grid spans roughly 50 km either side of it.
    pub fn new_cerra() -> Self {
        let (ni, nj) = (20, 20);
        Self {
            discipline: 0,
            center: 98,
            year: 2020,
            month: 3,
            day: 1,
            hour: 0,
            ni,
            nj,
            grid: BuilderGrid::Lambert {
                la1: 49.502879,
                lo1: 7.238387,
                lad: 50.0,
                lov: 8.0,
                latin1: 50.0,
                latin2: 50.0,
                dx: 5500.0,
                dy: 5500.0,
            },
            shape_of_earth: 6,
            scanning_mode: 0x40,
            param_category: 0,
            param_number: 0,
            level_type: 103,
            level_scale: 0,
            level_value: 2,
            time_unit: 1,
            forecast_time: 0,
            data_values: vec![288.15; (ni * nj) as usize],
        }
    }

    pub fn with_discipline(mut self, discipline: u8) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    /// Resize the grid; data is reset to zeros.
    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_geometry(mut self, grid: BuilderGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_scanning_mode(mut self, flag: u8) -> Self {
        self.scanning_mode = flag;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    /// Level with an explicit scale factor: value = scaled * 10^-scale.
    pub fn with_level(mut self, level_type: u8, scale: i8, scaled_value: i32) -> Self {
        self.level_type = level_type;
        self.level_scale = scale;
        self.level_value = scaled_value;
        self
    }

    pub fn with_forecast(mut self, time_unit: u8, forecast_time: u32) -> Self {
        self.time_unit = time_unit;
        self.forecast_time = forecast_time;
        self
    }

    pub fn with_forecast_hour(self, hour: u32) -> Self {
        self.with_forecast(1, hour)
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    /// Linear ramp over the points in scan order.
    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    /// Raw values in scan order. NaN values are written as bitmap-missing points.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let (section5, section7) = self.build_sections_5_and_7();
        let section6 = self.build_section6();

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(0); // Local table version
        section.push(1); // Start of forecast

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0);
        section.push(0);

        section.push(0); // Operational products
        section.push(0); // Analysis products

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let (template, template_len) = match self.grid {
            BuilderGrid::LatLon { .. } => (0u16, 58u32),
            BuilderGrid::Lambert { .. } => (30u16, 67u32),
        };

        let mut section = Vec::new();
        section.extend_from_slice(&(14 + template_len).to_be_bytes());
        section.push(3);
        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0);
        section.push(0);
        section.extend_from_slice(&template.to_be_bytes());

        // Shape of the earth block (16 bytes)
        section.push(self.shape_of_earth);
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());

        match self.grid {
            BuilderGrid::LatLon { la1, lo1, di, dj } => {
                let j_sign = if self.scanning_mode & 0x40 != 0 { 1.0 } else { -1.0 };
                let i_sign = if self.scanning_mode & 0x80 != 0 { -1.0 } else { 1.0 };
                let la2 = la1 + j_sign * dj * (self.nj as f64 - 1.0);
                let lo2 = lo1 + i_sign * di * (self.ni as f64 - 1.0);

                section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
                section.extend_from_slice(&u32::MAX.to_be_bytes()); // Subdivisions
                section.extend_from_slice(&micro_degrees(la1));
                section.extend_from_slice(&micro_degrees(lo1));
                section.push(48); // Resolution and component flags
                section.extend_from_slice(&micro_degrees(la2));
                section.extend_from_slice(&micro_degrees(lo2));
                section.extend_from_slice(&((di * 1e6).round() as u32).to_be_bytes());
                section.extend_from_slice(&((dj * 1e6).round() as u32).to_be_bytes());
                section.push(self.scanning_mode);
            }
            BuilderGrid::Lambert {
                la1,
                lo1,
                lad,
                lov,
                latin1,
                latin2,
                dx,
                dy,
            } => {
                section.extend_from_slice(&micro_degrees(la1));
                section.extend_from_slice(&micro_degrees(lo1));
                section.push(8); // Resolution and component flags
                section.extend_from_slice(&micro_degrees(lad));
                section.extend_from_slice(&micro_degrees(lov));
                // Dx/Dy in millimeters
                section.extend_from_slice(&((dx * 1e3).round() as u32).to_be_bytes());
                section.extend_from_slice(&((dy * 1e3).round() as u32).to_be_bytes());
                section.push(0); // North pole on projection plane
                section.push(self.scanning_mode);
                section.extend_from_slice(&micro_degrees(latin1));
                section.extend_from_slice(&micro_degrees(latin2));
                section.extend_from_slice(&micro_degrees(-90.0)); // Latitude of southern pole
                section.extend_from_slice(&micro_degrees(0.0));
            }
        }

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(0); // Analysis
        section.push(255);
        section.push(255);
        section.extend_from_slice(&0u16.to_be_bytes());
        section.push(0);
        section.push(self.time_unit);
        section.extend_from_slice(&self.forecast_time.to_be_bytes());

        section.push(self.level_type);
        section.extend_from_slice(&encode_signed(self.level_scale as i64, 1));
        section.extend_from_slice(&encode_signed(self.level_value as i64, 4));

        section.push(255); // No second fixed surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_sections_5_and_7(&self) -> (Vec<u8>, Vec<u8>) {
        let present: Vec<f32> = self
            .data_values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();

        let (min_val, max_val) = present.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        let reference_value = if present.is_empty() { 0.0 } else { min_val };
        let range = if present.is_empty() { 0.0 } else { max_val - min_val };

        // packed = (value - R) / 2^E, with E chosen so the range fits in 16 bits
        let (bits_per_value, binary_scale_factor) = if range == 0.0 {
            (0u8, 0i16)
        } else {
            (16u8, (range / 65535.0).log2().ceil() as i16)
        };

        let mut section5 = Vec::new();
        section5.extend_from_slice(&21u32.to_be_bytes());
        section5.push(5);
        section5.extend_from_slice(&(present.len() as u32).to_be_bytes());
        section5.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0
        section5.extend_from_slice(&reference_value.to_be_bytes());
        section5.extend_from_slice(&encode_signed(binary_scale_factor as i64, 2));
        section5.extend_from_slice(&encode_signed(0, 2));
        section5.push(bits_per_value);
        section5.push(0); // Floating point

        let mut packed = Vec::new();
        if bits_per_value > 0 {
            let scale = 2f64.powi(binary_scale_factor as i32);
            for &v in &present {
                let p = ((v as f64 - reference_value as f64) / scale).round() as u16;
                packed.extend_from_slice(&p.to_be_bytes());
            }
        }

        let mut section7 = Vec::new();
        section7.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section7.push(7);
        section7.extend_from_slice(&packed);

        (section5, section7)
    }

    fn build_section6(&self) -> Vec<u8> {
        if !self.data_values.iter().any(|v| v.is_nan()) {
            let mut section = Vec::new();
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255);
            return section;
        }

        let mut bitmap = vec![0u8; self.data_values.len().div_ceil(8)];
        for (i, v) in self.data_values.iter().enumerate() {
            if !v.is_nan() {
                bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }

        let mut section = Vec::new();
        section.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
        section.push(6);
        section.push(0);
        section.extend_from_slice(&bitmap);
        section
    }
}

/// Concatenate messages into one multi-message file.
pub fn concat_messages(messages: &[Vec<u8>]) -> Vec<u8> {
    messages.iter().flatten().copied().collect()
}

/// Write bytes to a named temporary file with the given suffix.
pub fn write_temp_file(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temporary file");
    file.write_all(bytes).expect("Failed to write temporary file");
    file.flush().expect("Failed to flush temporary file");
    file
}

/// Encode a GRIB2 sign-magnitude integer of `len` bytes.
pub fn encode_signed(value: i64, len: usize) -> Vec<u8> {
    let magnitude = value.unsigned_abs();
    let mut bytes: Vec<u8> = (0..len)
        .rev()
        .map(|i| ((magnitude >> (i * 8)) & 0xFF) as u8)
        .collect();
    if value < 0 {
        bytes[0] |= 0x80;
    }
    bytes
}

fn micro_degrees(deg: f64) -> Vec<u8> {
    encode_signed((deg * 1e6).round() as i64, 4)
}
