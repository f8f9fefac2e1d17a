//! End-to-end raster steps on synthetic GRIB2 files.

use std::sync::Arc;

use grib2_parser::Grib2Tables;
use met_common::CrsCode;
use projection::Crs;
use raster::{
    band_timestamps, open_grib, reproject, sample_point, select_bands_by_element, SampleOutcome,
    ScratchStore, WarpOptions, GRIB_REF_TIME,
};
use test_utils::fixtures::stations;
use test_utils::{concat_messages, require_test_file, write_temp_file, Grib2Builder};

fn tables() -> Arc<Grib2Tables> {
    Arc::new(Grib2Tables::wmo_defaults())
}

/// Three CERRA-style messages: TMP at 00Z and 03Z, DPT at 00Z.
fn cerra_file() -> tempfile::NamedTempFile {
    let bytes = concat_messages(&[
        Grib2Builder::new_cerra().with_constant_value(281.25).build(),
        Grib2Builder::new_cerra()
            .with_reference_time(2020, 3, 1, 3)
            .with_constant_value(283.5)
            .build(),
        Grib2Builder::new_cerra()
            .with_parameter(0, 6)
            .with_constant_value(275.0)
            .build(),
    ]);
    write_temp_file(&bytes, ".grib2")
}

#[test]
fn test_open_and_select() {
    let file = cerra_file();
    let ds = open_grib(file.path(), tables()).unwrap();

    assert_eq!((ds.width(), ds.height()), (20, 20));
    assert_eq!(ds.band_count(), 3);
    assert!(matches!(ds.crs(), Some(Crs::LambertConformal(_))));
    assert_eq!(select_bands_by_element(&ds, "TMP"), vec![1, 2]);
    assert_eq!(select_bands_by_element(&ds, "DPT"), vec![3]);
    assert!(select_bands_by_element(&ds, "UGRD").is_empty());
}

#[test]
fn test_reproject_and_sample_stations() {
    let file = cerra_file();
    let ds = open_grib(file.path(), tables()).unwrap();
    let bands = select_bands_by_element(&ds, "TMP");

    let store = ScratchStore::new();
    let out = reproject(&store, &ds, &bands, &Crs::Geographic, &WarpOptions::default()).unwrap();
    assert_eq!(out.dataset.band_count(), 2);

    let times = band_timestamps(&out.dataset, GRIB_REF_TIME).unwrap();
    assert_eq!(times[1] - times[0], chrono::Duration::hours(3));

    for (id, lon, lat) in stations::RHINE_MAIN {
        let outcome = sample_point(&out.dataset, GRIB_REF_TIME, lon, lat).unwrap();
        let samples = outcome
            .samples()
            .unwrap_or_else(|| panic!("station {} not sampled: {:?}", id, outcome));
        assert_eq!(samples[0].value, 281.25);
        assert_eq!(samples[1].value, 283.5);
        assert_eq!(samples[0].timestamp, times[0]);
    }

    let (_, lon, lat) = stations::REYKJAVIK;
    let outcome = sample_point(&out.dataset, GRIB_REF_TIME, lon, lat).unwrap();
    assert!(matches!(outcome, SampleOutcome::OutOfBounds { .. }));

    out.release();
    assert!(store.is_empty());
}

#[test]
fn test_reproject_to_laea_samples_projected_points() {
    let file = cerra_file();
    let ds = open_grib(file.path(), tables()).unwrap();

    let laea = Crs::from_code(CrsCode::Epsg3035);
    let store = ScratchStore::new();
    let out = reproject(&store, &ds, &[3], &laea, &WarpOptions::default()).unwrap();

    let (_, lon, lat) = stations::FRANKFURT;
    let (x, y) = laea.from_geographic(lon, lat).unwrap();
    let outcome = sample_point(&out.dataset, GRIB_REF_TIME, x, y).unwrap();
    assert_eq!(outcome.samples().unwrap()[0].value, 275.0);
}

#[test]
fn test_real_cerra_file() {
    let path = require_test_file!("cerra_t2m.grib2");
    let ds = open_grib(&path, tables()).unwrap();
    let bands = select_bands_by_element(&ds, "TMP");
    assert!(!bands.is_empty());

    let store = ScratchStore::new();
    let out = reproject(&store, &ds, &bands, &Crs::Geographic, &WarpOptions::default()).unwrap();
    let (_, lon, lat) = stations::FRANKFURT;
    let outcome = sample_point(&out.dataset, GRIB_REF_TIME, lon, lat).unwrap();
    let samples = outcome.samples().unwrap();
    assert!(samples.iter().all(|s| (220.0..320.0).contains(&s.value)));
}
