//! GRIB2 parameter tables from YAML.
//!
//! The built-in WMO tables cover the common CERRA fields. A YAML file can
//! add local parameters or rename existing ones:
//!
//! ```yaml
//! parameters:
//!   - discipline: 0
//!     category: 2
//!     number: 22
//!     name: GUST
//!     description: Wind speed (gust)
//!     unit: m/s
//! levels:
//!   - code: 103
//!     abbrev: HTGL
//!     description: "{value} m above ground"
//! ```

use std::path::Path;
use std::sync::Arc;

use grib2_parser::{Grib2Tables, LevelDescription, ParameterInfo};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{ExtractionError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    #[serde(default)]
    parameters: Vec<ParameterEntry>,
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterEntry {
    #[serde(default)]
    discipline: u8,
    category: u8,
    number: u8,
    name: String,
    description: Option<String>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelEntry {
    code: u8,
    abbrev: String,
    description: Option<String>,
}

/// Parse a table YAML document into tables holding only its entries.
pub fn tables_from_yaml_str(yaml: &str) -> Result<Grib2Tables> {
    let file: TableFile = serde_yaml::from_str(yaml)?;
    let mut tables = Grib2Tables::new();

    for p in file.parameters {
        if p.name.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(format!(
                "parameter {}.{}.{} has an empty name",
                p.discipline, p.category, p.number
            )));
        }
        let info = ParameterInfo {
            description: p.description.unwrap_or_else(|| p.name.clone()),
            unit: p.unit.unwrap_or_default(),
            name: p.name,
        };
        tables.add_parameter_info(p.discipline, p.category, p.number, info);
    }

    for l in file.levels {
        let display = l.description.unwrap_or_else(|| l.abbrev.clone());
        tables.add_level(l.code, &l.abbrev, LevelDescription::from_display(&display));
    }

    Ok(tables)
}

/// Load a table YAML file.
pub fn load_tables(path: impl AsRef<Path>) -> Result<Grib2Tables> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        error!(path = ?path, error = %e, "Cannot read parameter tables");
        ExtractionError::InvalidConfig(format!("Cannot read {:?}: {}", path, e))
    })?;
    tables_from_yaml_str(&contents)
}

/// WMO defaults, extended by the given file when present.
pub fn build_tables(path: Option<&Path>) -> Result<Arc<Grib2Tables>> {
    let mut tables = Grib2Tables::wmo_defaults();

    if let Some(path) = path {
        let extra = load_tables(path)?;
        debug!(
            path = ?path,
            parameters = extra.parameter_count(),
            levels = extra.level_count(),
            "Loaded parameter tables"
        );
        tables.merge(extra);
    }

    Ok(Arc::new(tables))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES: &str = r#"
parameters:
  - category: 2
    number: 22
    name: GUST
    description: Wind speed (gust)
    unit: m/s
  - discipline: 0
    category: 0
    number: 0
    name: T2M
levels:
  - code: 103
    abbrev: AGL
    description: "{value} m above ground level"
  - code: 200
    abbrev: EATM
"#;

    #[test]
    fn test_parse_tables() {
        let tables = tables_from_yaml_str(TABLES).unwrap();
        assert_eq!(tables.parameter_count(), 2);
        assert_eq!(tables.level_count(), 2);

        let gust = tables.parameter(0, 2, 22).unwrap();
        assert_eq!(gust.unit, "m/s");
        assert_eq!(tables.get_parameter_name(0, 0, 0), "T2M");
        assert_eq!(tables.get_level_abbrev(103), "AGL");
        assert_eq!(tables.get_level_description(103, 2.0), "2 m above ground level");
        assert_eq!(tables.get_level_description(200, 0.0), "EATM");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = test_utils::write_temp_file(TABLES.as_bytes(), ".yaml");
        let tables = build_tables(Some(file.path())).unwrap();

        assert_eq!(tables.get_parameter_name(0, 0, 0), "T2M");
        // Untouched defaults survive
        assert_eq!(tables.get_parameter_name(0, 0, 6), "DPT");
        assert_eq!(tables.get_level_abbrev(1), "SFC");
    }

    #[test]
    fn test_defaults_without_file() {
        let tables = build_tables(None).unwrap();
        assert_eq!(tables.get_parameter_name(0, 2, 2), "UGRD");
    }

    #[test]
    fn test_invalid_tables() {
        assert!(tables_from_yaml_str("parameters:\n  - category: 1\n").is_err());
        assert!(tables_from_yaml_str("parameters:\n  - {category: 1, number: 1, name: ' '}\n").is_err());
        assert!(tables_from_yaml_str("models: []\n").is_err());
        assert!(load_tables("/nonexistent/tables.yaml").is_err());
    }
}
