//! Georeferencing helpers working together the way a raster uses them.

use chrono::{TimeZone, Utc};
use met_common::{
    format_metadata_timestamp, parse_metadata_timestamp, BoundingBox, CrsCode, GeoTransform,
};

// 20x20 grid of 5.5 km cells, origin half a cell outside the first point
fn cerra_like() -> GeoTransform {
    GeoTransform::north_up(-57_750.0, 52_250.0, 5_500.0, -5_500.0)
}

#[test]
fn test_extent_from_corners() {
    let gt = cerra_like();
    let mut extent = BoundingBox::empty();
    for (x, y) in gt.corners(20, 20) {
        extent.include(x, y);
    }

    assert_eq!(extent, BoundingBox::new(-57_750.0, -57_750.0, 52_250.0, 52_250.0));
    assert_eq!(extent.width(), 110_000.0);
    assert_eq!(extent.height(), 110_000.0);
}

#[test]
fn test_pixel_centers_round_trip() {
    let gt = cerra_like();
    for (col, row) in [(0, 0), (7, 13), (19, 19)] {
        let (x, y) = gt.apply(col as f64 + 0.5, row as f64 + 0.5);
        assert_eq!(gt.pixel_index(x, y), Some((col, row)));
    }
}

#[test]
fn test_pixel_index_floors_outside_origin() {
    let gt = cerra_like();
    assert_eq!(gt.pixel_index(-57_751.0, 52_249.0), Some((-1, 0)));
    assert_eq!(gt.pixel_index(-57_749.0, 52_251.0), Some((0, -1)));
    assert_eq!(gt.pixel_index(52_260.0, -57_760.0), Some((20, 20)));
}

#[test]
fn test_point_layer_crs_names() {
    for name in ["EPSG:4326", "epsg:4326", "CRS:84", "urn:ogc:def:crs:OGC:1.3:CRS84"] {
        assert_eq!(CrsCode::parse(name).unwrap(), CrsCode::Epsg4326, "{}", name);
    }
    assert_eq!(CrsCode::parse("urn:ogc:def:crs:EPSG::3035").unwrap(), CrsCode::Epsg3035);
    assert_eq!("EPSG:3857".parse::<CrsCode>().unwrap().epsg(), 3857);
    assert!(CrsCode::parse("EPSG:32632").is_err());
    assert!(CrsCode::parse("urn:ogc:def:crs:IAU::49900").is_err());
}

#[test]
fn test_band_timestamps() {
    let times: Vec<_> = (0..8)
        .map(|h| Utc.with_ymd_and_hms(2020, 3, 1, 3 * h, 0, 0).unwrap())
        .collect();
    for t in times {
        assert_eq!(parse_metadata_timestamp(&format_metadata_timestamp(t)).unwrap(), t);
    }
}
