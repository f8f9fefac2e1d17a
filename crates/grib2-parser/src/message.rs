//! GRIB2 messages and the reader that splits a file into them.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

use crate::error::{Grib2Error, Result};
use crate::sections::{
    parse_bitmap, parse_data_representation, parse_data_section, parse_grid_definition,
    parse_identification, parse_indicator, parse_product_definition, Bitmap, DataRepresentation,
    DataSection, GridDefinition, Identification, Indicator, ProductDefinition, SectionIndex,
};
use crate::tables::{format_level_value, Grib2Tables, ParameterInfo};
use crate::unpacking::{unpack_simple, unpack_with_grib_crate};

/// One decoded GRIB2 message (one field).
#[derive(Debug, Clone)]
pub struct Grib2Message {
    /// Byte offset of the message within the file
    pub offset: usize,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Bitmap,
    pub data_section: DataSection,
    /// The complete message bytes
    pub raw: Bytes,
    tables: Arc<Grib2Tables>,
}

impl Grib2Message {
    /// Parse a complete message slice (from "GRIB" through "7777").
    pub fn parse(raw: Bytes, offset: usize, tables: Arc<Grib2Tables>) -> Result<Self> {
        let indicator = parse_indicator(&raw)?;
        let index = SectionIndex::build(&raw)?;

        let bitmap = if index.has(6) {
            parse_bitmap(index.section(&raw, 6)?)?
        } else {
            Bitmap::absent()
        };

        Ok(Self {
            offset,
            identification: parse_identification(index.section(&raw, 1)?)?,
            grid_definition: parse_grid_definition(index.section(&raw, 3)?)?,
            product_definition: parse_product_definition(index.section(&raw, 4)?)?,
            data_representation: parse_data_representation(index.section(&raw, 5)?)?,
            bitmap,
            data_section: parse_data_section(index.section(&raw, 7)?)?,
            indicator,
            raw,
            tables,
        })
    }

    /// Element name (e.g. "TMP", "UGRD").
    pub fn parameter(&self) -> String {
        let pd = &self.product_definition;
        self.tables.get_parameter_name(
            self.indicator.discipline,
            pd.parameter_category,
            pd.parameter_number,
        )
    }

    pub fn parameter_info(&self) -> Option<&ParameterInfo> {
        let pd = &self.product_definition;
        self.tables.parameter(
            self.indicator.discipline,
            pd.parameter_category,
            pd.parameter_number,
        )
    }

    /// Level in short form, e.g. "2-HTGL" or "0-SFC".
    pub fn level_short_name(&self) -> String {
        let pd = &self.product_definition;
        format!(
            "{}-{}",
            format_level_value(pd.level_value),
            self.tables.get_level_abbrev(pd.level_type)
        )
    }

    pub fn level_description(&self) -> String {
        let pd = &self.product_definition;
        self.tables.get_level_description(pd.level_type, pd.level_value)
    }

    /// Grid dimensions as (rows, columns).
    pub fn grid_dims(&self) -> (usize, usize) {
        (
            self.grid_definition.nj as usize,
            self.grid_definition.ni as usize,
        )
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.identification.reference_time
    }

    /// Forecast offset in seconds (0 when the time unit is not fixed-length).
    pub fn forecast_seconds(&self) -> i64 {
        match self.product_definition.forecast_seconds() {
            Some(secs) => secs,
            None => {
                warn!(
                    unit = self.product_definition.time_unit,
                    "Unsupported forecast time unit, treating offset as zero"
                );
                0
            }
        }
    }

    /// Valid time: end of the statistical interval if present, else reference + offset.
    pub fn valid_time(&self) -> DateTime<Utc> {
        self.product_definition
            .interval_end
            .unwrap_or_else(|| self.reference_time() + Duration::seconds(self.forecast_seconds()))
    }

    /// Decode field values in file scan order. Missing points are NaN.
    pub fn unpack_data(&self) -> Result<Vec<f32>> {
        let drs = &self.data_representation;
        let (nj, ni) = self.grid_dims();
        let num_points = match self.grid_definition.num_data_points as usize {
            0 => ni * nj,
            n => n,
        };

        let values = match drs.template_number {
            0 => unpack_simple(
                &self.data_section.data,
                num_points,
                drs.bits_per_value,
                drs.reference_value,
                drs.binary_scale_factor,
                drs.decimal_scale_factor,
                self.bitmap.data.as_deref(),
            )?,
            other => {
                debug!(template = other, "Delegating unpacking to grib crate");
                unpack_with_grib_crate(&self.raw)?
            }
        };

        if values.len() != num_points {
            return Err(Grib2Error::UnpackingError(format!(
                "Decoded {} values, grid has {} points",
                values.len(),
                num_points
            )));
        }
        Ok(values)
    }

    /// Decode field values reordered to north-up, west-to-east rows.
    pub fn unpack_north_up(&self) -> Result<Vec<f32>> {
        let (nj, ni) = self.grid_dims();
        let values = self.unpack_data()?;
        self.grid_definition
            .scanning_mode
            .to_north_up(&values, ni, nj)
            .ok_or_else(|| {
                Grib2Error::UnpackingError(format!(
                    "Cannot reorder {} values onto a {}x{} grid",
                    values.len(),
                    ni,
                    nj
                ))
            })
    }
}

/// Sequential reader over the messages of a GRIB2 file held in memory.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    pub fn new(data: Bytes, tables: Arc<Grib2Tables>) -> Self {
        Self {
            data,
            offset: 0,
            tables,
        }
    }

    /// Read a file from disk, transparently decompressing gzip.
    pub fn open(path: impl AsRef<Path>, tables: Arc<Grib2Tables>) -> Result<Self> {
        let raw = std::fs::read(path.as_ref())?;
        Ok(Self::new(decompress_if_gzipped(Bytes::from(raw))?, tables))
    }

    /// Next message, or `None` at end of data. Bytes between messages are skipped.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>> {
        let start = match find_magic(&self.data, self.offset) {
            Some(start) => start,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        if start > self.offset {
            debug!(skipped = start - self.offset, "Skipped bytes before GRIB message");
        }

        let indicator = parse_indicator(&self.data[start..])?;
        let length = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "Message length {} does not fit in memory",
                indicator.message_length
            ))
        })?;

        if length < 16 + 4 || start + length > self.data.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message at offset {} claims {} bytes, {} available",
                start,
                length,
                self.data.len() - start
            )));
        }

        let raw = self.data.slice(start..start + length);
        if &raw[length - 4..] != b"7777" {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message at offset {} is missing its 7777 end marker",
                start
            )));
        }

        self.offset = start + length;
        Grib2Message::parse(raw, start, self.tables.clone()).map(Some)
    }

    /// Read all remaining messages.
    pub fn messages(&mut self) -> Result<Vec<Grib2Message>> {
        let mut out = Vec::new();
        while let Some(msg) = self.next_message()? {
            out.push(msg);
        }
        Ok(out)
    }
}

/// Gunzip the buffer if it starts with the gzip magic, otherwise return it unchanged.
pub fn decompress_if_gzipped(data: Bytes) -> Result<Bytes> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(data);
    }

    let mut decoder = MultiGzDecoder::new(&data[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    debug!(compressed = data.len(), decompressed = out.len(), "Decompressed gzip input");
    Ok(Bytes::from(out))
}

fn find_magic(data: &[u8], from: usize) -> Option<usize> {
    if from >= data.len() {
        return None;
    }
    data[from..]
        .windows(4)
        .position(|w| w == b"GRIB")
        .map(|p| from + p)
}
