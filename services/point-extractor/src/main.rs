//! Point extractor CLI.
//!
//! Samples CERRA GRIB2 variables at the points of a GeoJSON layer and
//! derives wind and humidity quantities from them. Results are JSON on
//! stdout (or `--output`); logs go to stderr.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extraction::ExtractionConfig;
use met_common::CrsCode;
use projection::Crs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "point-extractor")]
#[command(about = "Extract gridded reanalysis values at point locations")]
struct Cli {
    /// Extraction config file (YAML)
    #[arg(short, long, global = true, env = "EXTRACT_CONFIG")]
    config: Option<PathBuf>,

    /// Spatial reference of the raster, replacing the one in the file (e.g. EPSG:4326)
    #[arg(long, global = true, value_parser = parse_crs)]
    source_crs: Option<Crs>,

    /// Output pixel size of the reprojected raster, in point layer units
    #[arg(long, global = true)]
    resolution: Option<f64>,

    /// Write JSON here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long, global = true)]
    pretty: bool,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the bands of a GRIB2 file with their metadata
    Inspect {
        /// GRIB2 file (.grib2 or .grib2.gz)
        grib: PathBuf,
    },

    /// Sample one variable at every point
    Extract {
        grib: PathBuf,

        /// GeoJSON point layer
        points: PathBuf,

        /// Variable tag to select (e.g. TMP)
        #[arg(short, long)]
        variable: String,
    },

    /// Wind speed and direction from u/v components
    Wind {
        grib: PathBuf,
        points: PathBuf,

        #[arg(long, default_value = "UGRD")]
        u: String,

        #[arg(long, default_value = "VGRD")]
        v: String,
    },

    /// Relative humidity from temperature and dew point
    Humidity {
        grib: PathBuf,
        points: PathBuf,

        #[arg(long, default_value = "TMP")]
        temperature: String,

        #[arg(long, default_value = "DPT")]
        dew_point: String,
    },
}

fn parse_crs(s: &str) -> std::result::Result<Crs, String> {
    CrsCode::parse(s)
        .map(Crs::from_code)
        .map_err(|e| e.to_string())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let mut config = ExtractionConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    if let Some(resolution) = cli.resolution {
        config.resolution = Some(resolution);
        config.validate()?;
    }
    let source_crs = cli.source_crs.as_ref();
    let output = cli.output.as_deref();

    match &cli.command {
        Command::Inspect { grib } => {
            let dataset = commands::open_dataset(grib, &config, source_crs)?;
            commands::write_json(&commands::inspect(&dataset), output, cli.pretty)?;
        }
        Command::Extract {
            grib,
            points,
            variable,
        } => {
            let dataset = commands::open_dataset(grib, &config, source_crs)?;
            let points = commands::load_points(points)?;
            let result = commands::extract(&dataset, &points, variable, &config)?;
            commands::write_json(&result, output, cli.pretty)?;
        }
        Command::Wind { grib, points, u, v } => {
            let dataset = commands::open_dataset(grib, &config, source_crs)?;
            let points = commands::load_points(points)?;
            let result = commands::wind(&dataset, &points, u, v, &config)?;
            commands::write_json(&result, output, cli.pretty)?;
        }
        Command::Humidity {
            grib,
            points,
            temperature,
            dew_point,
        } => {
            let dataset = commands::open_dataset(grib, &config, source_crs)?;
            let points = commands::load_points(points)?;
            let result = commands::humidity(&dataset, &points, temperature, dew_point, &config)?;
            commands::write_json(&result, output, cli.pretty)?;
        }
    }

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "point-extractor",
            "extract",
            "cerra.grib2",
            "stations.geojson",
            "--variable",
            "TMP",
            "--source-crs",
            "EPSG:3035",
            "--pretty",
        ])
        .unwrap();

        assert!(cli.pretty);
        assert_eq!(cli.source_crs.and_then(|c| c.code()), Some(CrsCode::Epsg3035));
        assert!(matches!(cli.command, Command::Extract { ref variable, .. } if variable == "TMP"));
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["point-extractor", "wind", "a.grib2", "b.geojson"]).unwrap();
        assert!(matches!(cli.command, Command::Wind { ref u, ref v, .. } if u == "UGRD" && v == "VGRD"));
        assert!(Cli::try_parse_from(["point-extractor", "inspect", "a.grib2", "--source-crs", "EPSG:1"]).is_err());
    }
}
