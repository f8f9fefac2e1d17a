//! Open GRIB2 files as multi-band datasets.
//!
//! Each GRIB2 message becomes one band. All messages must share one grid.
//! Band metadata follows the GRIB_* naming used by common raster tooling:
//!
//! | Key | Example |
//! |-----|---------|
//! | `GRIB_ELEMENT` | `TMP` |
//! | `GRIB_SHORT_NAME` | `2-HTGL` |
//! | `GRIB_COMMENT` | `Temperature [K]` |
//! | `GRIB_UNIT` | `[K]` |
//! | `GRIB_REF_TIME` | `  1583020800 sec UTC` |
//! | `GRIB_VALID_TIME` | `  1583031600 sec UTC` |
//! | `GRIB_FORECAST_SECONDS` | `10800` |
//!
//! Lat/lon grids keep the longitude range they are written in unless the
//! west edge lies at or beyond 180, which is shifted down by 360. A global
//! grid starting at 0 therefore spans 0..360, and points west of Greenwich
//! must be given as 355 rather than -5 to land inside it.

use std::path::Path;
use std::sync::Arc;

use grib2_parser::{Grib2Message, Grib2Reader, Grib2Tables, GridDefinition, GridTemplate};
use met_common::{format_metadata_timestamp, GeoTransform};
use projection::{Crs, LambertConformal};
use tracing::{debug, info};

use crate::dataset::{Band, Dataset};
use crate::error::{RasterError, Result};

pub const GRIB_ELEMENT: &str = "GRIB_ELEMENT";
pub const GRIB_SHORT_NAME: &str = "GRIB_SHORT_NAME";
pub const GRIB_COMMENT: &str = "GRIB_COMMENT";
pub const GRIB_UNIT: &str = "GRIB_UNIT";
pub const GRIB_DISCIPLINE: &str = "GRIB_DISCIPLINE";
pub const GRIB_REF_TIME: &str = "GRIB_REF_TIME";
pub const GRIB_VALID_TIME: &str = "GRIB_VALID_TIME";
pub const GRIB_FORECAST_SECONDS: &str = "GRIB_FORECAST_SECONDS";

/// Read every message of a GRIB2 file (optionally gzipped) into one dataset.
pub fn open_grib(path: impl AsRef<Path>, tables: Arc<Grib2Tables>) -> Result<Dataset> {
    let path = path.as_ref();
    let messages = Grib2Reader::open(path, tables)?.messages()?;
    if messages.is_empty() {
        return Err(RasterError::open_failed(format!(
            "{} contains no GRIB2 messages",
            path.display()
        )));
    }

    let dataset = dataset_from_messages(&messages)?;
    info!(
        path = %path.display(),
        bands = dataset.band_count(),
        width = dataset.width(),
        height = dataset.height(),
        "Opened GRIB2 dataset"
    );
    Ok(dataset)
}

/// Build a dataset from already parsed messages, one band per message.
pub fn dataset_from_messages(messages: &[Grib2Message]) -> Result<Dataset> {
    let first = messages
        .first()
        .ok_or_else(|| RasterError::open_failed("no GRIB2 messages"))?;
    let grid = &first.grid_definition;
    let (crs, geo_transform) = georeference(grid)?;

    let mut bands = Vec::with_capacity(messages.len());
    for (i, msg) in messages.iter().enumerate() {
        let gd = &msg.grid_definition;
        if gd.ni != grid.ni || gd.nj != grid.nj || gd.template != grid.template {
            return Err(RasterError::unsupported_grid(format!(
                "message {} uses a different grid ({}x{}) than message 1 ({}x{})",
                i + 1,
                gd.ni,
                gd.nj,
                grid.ni,
                grid.nj
            )));
        }

        let data = msg.unpack_north_up()?;
        debug!(band = i + 1, element = %msg.parameter(), level = %msg.level_short_name(), "Decoded band");
        bands.push(band_from_message(msg, data));
    }

    Dataset::new(
        grid.ni as usize,
        grid.nj as usize,
        geo_transform,
        Some(crs),
        bands,
    )
}

fn band_from_message(msg: &Grib2Message, data: Vec<f32>) -> Band {
    let element = msg.parameter();
    let (comment, unit) = match msg.parameter_info() {
        Some(info) => (
            format!("{} [{}]", info.description, info.unit),
            format!("[{}]", info.unit),
        ),
        None => (element.clone(), String::new()),
    };

    Band::new(data)
        .with_description(format!(
            "{} {}",
            msg.level_short_name(),
            msg.level_description()
        ))
        .with_metadata(GRIB_ELEMENT, element)
        .with_metadata(GRIB_SHORT_NAME, msg.level_short_name())
        .with_metadata(GRIB_COMMENT, comment)
        .with_metadata(GRIB_UNIT, unit)
        .with_metadata(GRIB_DISCIPLINE, msg.indicator.discipline.to_string())
        .with_metadata(GRIB_REF_TIME, format_metadata_timestamp(msg.reference_time()))
        .with_metadata(GRIB_VALID_TIME, format_metadata_timestamp(msg.valid_time()))
        .with_metadata(GRIB_FORECAST_SECONDS, msg.forecast_seconds().to_string())
}

/// Spatial reference and north-up geotransform of a GRIB2 grid.
///
/// The geotransform origin is the outer corner of the north-west pixel, half
/// a grid step beyond the north-west grid point.
pub fn georeference(grid: &GridDefinition) -> Result<(Crs, GeoTransform)> {
    let ni = grid.ni as f64;
    let nj = grid.nj as f64;
    let scan = &grid.scanning_mode;

    match grid.template {
        GridTemplate::LatLon {
            la1,
            lo1,
            la2,
            lo2,
            di,
            dj,
        } => {
            let west = if scan.i_negative { lo2 } else { lo1 };
            let north = if scan.j_positive { la2 } else { la1 };
            // Keep longitudes in [-180, 180) so European points fall inside
            let west = if west >= 180.0 { west - 360.0 } else { west };

            if di <= 0.0 || dj <= 0.0 {
                return Err(RasterError::unsupported_grid(format!(
                    "lat/lon increments must be positive (di {}, dj {})",
                    di, dj
                )));
            }

            let gt = GeoTransform::north_up(west - di / 2.0, north + dj / 2.0, di, -dj);
            Ok((Crs::Geographic, gt))
        }
        GridTemplate::LambertConformal {
            la1,
            lo1,
            lad,
            lov,
            dx,
            dy,
            latin1,
            latin2,
            south_pole_projection,
        } => {
            if south_pole_projection {
                return Err(RasterError::unsupported_grid(
                    "south pole Lambert conformal projections",
                ));
            }

            let lcc = LambertConformal::new(lad, lov, latin1, latin2, grid.earth_radius)?;
            let (x1, y1) = lcc.project(lo1, la1).ok_or_else(|| {
                RasterError::projection(format!(
                    "first grid point ({}, {}) cannot be projected",
                    la1, lo1
                ))
            })?;

            let west = if scan.i_negative { x1 - (ni - 1.0) * dx } else { x1 };
            let north = if scan.j_positive { y1 + (nj - 1.0) * dy } else { y1 };

            let gt = GeoTransform::north_up(west - dx / 2.0, north + dy / 2.0, dx, -dy);
            Ok((Crs::LambertConformal(lcc), gt))
        }
        GridTemplate::Other => Err(RasterError::unsupported_grid(format!(
            "grid definition template 3.{}",
            grid.template_number
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use test_utils::{BuilderGrid, Grib2Builder};

    fn messages(raw: Vec<u8>) -> Vec<Grib2Message> {
        Grib2Reader::new(Bytes::from(raw), Arc::new(Grib2Tables::wmo_defaults()))
            .messages()
            .unwrap()
    }

    #[test]
    fn test_latlon_georeference() {
        let msgs = messages(Grib2Builder::new_latlon().build());
        let (crs, gt) = georeference(&msgs[0].grid_definition).unwrap();

        assert_eq!(crs, Crs::Geographic);
        assert!((gt.origin_x + 2.5).abs() < 1e-9);
        assert!((gt.origin_y - 55.5).abs() < 1e-9);
        assert!((gt.pixel_width - 1.0).abs() < 1e-9);
        assert!((gt.pixel_height + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_latlon_longitude_range_follows_west_edge() {
        let global = messages(
            Grib2Builder::new_latlon()
                .with_geometry(BuilderGrid::LatLon { la1: 55.0, lo1: 0.0, di: 1.0, dj: 1.0 })
                .build(),
        );
        let (_, gt) = georeference(&global[0].grid_definition).unwrap();
        assert!((gt.origin_x + 0.5).abs() < 1e-9);
        assert_eq!(gt.pixel_index(355.0, 50.0).map(|(col, _)| col), Some(355));
        assert!(gt.pixel_index(-5.0, 50.0).unwrap().0 < 0);

        let shifted = messages(
            Grib2Builder::new_latlon()
                .with_geometry(BuilderGrid::LatLon { la1: 55.0, lo1: 350.0, di: 1.0, dj: 1.0 })
                .build(),
        );
        let (_, gt) = georeference(&shifted[0].grid_definition).unwrap();
        assert!((gt.origin_x + 10.5).abs() < 1e-9);
        assert_eq!(gt.pixel_index(-5.0, 50.0).map(|(col, _)| col), Some(5));
    }

    #[test]
    fn test_lambert_georeference_centres_origin() {
        let msgs = messages(Grib2Builder::new_cerra().build());
        let (crs, gt) = georeference(&msgs[0].grid_definition).unwrap();

        assert!(matches!(crs, Crs::LambertConformal(_)));
        // First point at (-55 km, -55 km); 20 rows northward
        assert!((gt.origin_x + 57_750.0).abs() < 1.0, "origin_x {}", gt.origin_x);
        assert!((gt.origin_y - 52_250.0).abs() < 1.0, "origin_y {}", gt.origin_y);
        assert_eq!(gt.pixel_width, 5500.0);
        assert_eq!(gt.pixel_height, -5500.0);
    }

    #[test]
    fn test_band_metadata() {
        let msgs = messages(
            Grib2Builder::new_latlon()
                .with_forecast_hour(3)
                .build(),
        );
        let ds = dataset_from_messages(&msgs).unwrap();
        let band = ds.band(1).unwrap();

        assert_eq!(band.metadata_item(GRIB_ELEMENT), Some("TMP"));
        assert_eq!(band.metadata_item(GRIB_SHORT_NAME), Some("2-HTGL"));
        assert_eq!(band.metadata_item(GRIB_UNIT), Some("[K]"));
        assert_eq!(band.metadata_item(GRIB_COMMENT), Some("Temperature [K]"));
        assert_eq!(band.metadata_item(GRIB_REF_TIME), Some("  1583020800 sec UTC"));
        assert_eq!(band.metadata_item(GRIB_VALID_TIME), Some("  1583031600 sec UTC"));
        assert_eq!(band.metadata_item(GRIB_FORECAST_SECONDS), Some("10800"));
    }

    #[test]
    fn test_mixed_grids_rejected() {
        let raw = test_utils::concat_messages(&[
            Grib2Builder::new_latlon().build(),
            Grib2Builder::new_latlon().with_grid(5, 5).build(),
        ]);
        let result = dataset_from_messages(&messages(raw));
        assert!(matches!(result, Err(RasterError::UnsupportedGrid(_))));
    }

    #[test]
    fn test_south_to_north_rows_are_flipped() {
        let msgs = messages(
            Grib2Builder::new_cerra()
                .with_grid(2, 2)
                .with_data(vec![1.0, 2.0, 3.0, 4.0])
                .build(),
        );
        let ds = dataset_from_messages(&msgs).unwrap();
        let top_left = ds.read_pixel(1, 0, 0).unwrap().unwrap();
        assert!((top_left - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_north_first_rows_keep_order() {
        let msgs = messages(
            Grib2Builder::new_cerra()
                .with_grid(2, 2)
                .with_scanning_mode(0x00)
                .with_data(vec![1.0, 2.0, 3.0, 4.0])
                .build(),
        );
        let ds = dataset_from_messages(&msgs).unwrap();
        let top_left = ds.read_pixel(1, 0, 0).unwrap().unwrap();
        assert!((top_left - 1.0).abs() < 0.01);
    }
}
