//! Common test fixtures for point extraction tests.

/// Weather stations as (id, lon, lat).
pub mod stations {
    pub const FRANKFURT: (&str, f64, f64) = ("10637", 8.5213, 50.0259);
    pub const MAINZ: (&str, f64, f64) = ("10708", 8.2086, 49.9658);
    pub const DARMSTADT: (&str, f64, f64) = ("10641", 8.6650, 49.8728);
    pub const ZUGSPITZE: (&str, f64, f64) = ("10961", 10.9850, 47.4210);
    pub const REYKJAVIK: (&str, f64, f64) = ("04030", -21.9406, 64.1275);

    /// Stations inside the 20x20 CERRA builder grid
    pub const RHINE_MAIN: [(&str, f64, f64); 3] = [FRANKFURT, MAINZ, DARMSTADT];
}

/// Common time values.
pub mod time {
    /// Reference time of the builder messages, 2020-03-01T00:00:00Z
    pub const REFERENCE_EPOCH: i64 = 1_583_020_800;
}

/// Common CRS identifiers.
pub mod crs {
    pub const EPSG_4326: &str = "EPSG:4326";
    pub const EPSG_3035: &str = "EPSG:3035";
    pub const CRS_84_URN: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";
}

/// GeoJSON FeatureCollection of point features with an `id` property.
///
/// Coordinates are written as given; pass `crs` to add a legacy named CRS member.
pub fn points_geojson(points: &[(&str, f64, f64)], crs: Option<&str>) -> String {
    let features: Vec<String> = points
        .iter()
        .map(|(id, x, y)| {
            format!(
                r#"{{"type":"Feature","properties":{{"id":"{}"}},"geometry":{{"type":"Point","coordinates":[{},{}]}}}}"#,
                id, x, y
            )
        })
        .collect();

    let crs_member = match crs {
        Some(name) => format!(r#","crs":{{"type":"name","properties":{{"name":"{}"}}}}"#, name),
        None => String::new(),
    };

    format!(
        r#"{{"type":"FeatureCollection"{},"features":[{}]}}"#,
        crs_member,
        features.join(",")
    )
}
