//! Extraction configuration.
//!
//! Settings come from built-in defaults, an optional YAML file, and then
//! `EXTRACT_*` environment variables, in that order of precedence (last wins).
//!
//! ```yaml
//! variable_key: GRIB_ELEMENT
//! timestamp_key: GRIB_REF_TIME
//! resampling: bilinear
//! resolution: 0.05
//! no_data: 9999.0
//! parameter_tables: config/cerra_tables.yaml
//! ```

use std::path::{Path, PathBuf};

use raster::{InterpolationMethod, WarpOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExtractionError, Result};

pub const ENV_VARIABLE_KEY: &str = "EXTRACT_VARIABLE_KEY";
pub const ENV_TIMESTAMP_KEY: &str = "EXTRACT_TIMESTAMP_KEY";
pub const ENV_RESAMPLING: &str = "EXTRACT_RESAMPLING";
pub const ENV_RESOLUTION: &str = "EXTRACT_RESOLUTION";
pub const ENV_PARAMETER_TABLES: &str = "EXTRACT_PARAMETER_TABLES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Band metadata key holding the variable tag.
    pub variable_key: String,

    /// Band metadata key holding the reference time text.
    pub timestamp_key: String,

    /// Resampling kernel used when reprojecting.
    pub resampling: InterpolationMethod,

    /// Output pixel size in the points' reference units; derived when unset.
    pub resolution: Option<f64>,

    /// Value treated as missing in addition to NaN.
    pub no_data: Option<f32>,

    /// YAML file extending the built-in GRIB2 parameter tables.
    pub parameter_tables: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            variable_key: raster::GRIB_ELEMENT.to_string(),
            timestamp_key: raster::GRIB_REF_TIME.to_string(),
            resampling: InterpolationMethod::Bilinear,
            resolution: None,
            no_data: None,
            parameter_tables: None,
        }
    }
}

impl ExtractionConfig {
    /// Parse a YAML document; missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtractionError::InvalidConfig(format!("Cannot read {:?}: {}", path, e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Defaults, then the file (if any), then the environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        debug!(?config, "Loaded extraction config");
        Ok(config)
    }

    /// Override fields from `EXTRACT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from a key lookup using the `EXTRACT_*` names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_VARIABLE_KEY) {
            self.variable_key = val;
        }

        if let Some(val) = lookup(ENV_TIMESTAMP_KEY) {
            self.timestamp_key = val;
        }

        if let Some(val) = lookup(ENV_RESAMPLING) {
            self.resampling = val.parse().map_err(ExtractionError::InvalidConfig)?;
        }

        if let Some(val) = lookup(ENV_RESOLUTION) {
            let res = val.parse::<f64>().map_err(|_| {
                ExtractionError::InvalidConfig(format!("{} is not a number: {}", ENV_RESOLUTION, val))
            })?;
            self.resolution = Some(res);
        }

        if let Some(val) = lookup(ENV_PARAMETER_TABLES) {
            self.parameter_tables = Some(PathBuf::from(val));
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.variable_key.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "variable_key must not be empty".to_string(),
            ));
        }

        if self.timestamp_key.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "timestamp_key must not be empty".to_string(),
            ));
        }

        if let Some(res) = self.resolution {
            if !(res.is_finite() && res > 0.0) {
                return Err(ExtractionError::InvalidConfig(format!(
                    "resolution must be positive, got {}",
                    res
                )));
            }
        }

        Ok(())
    }

    pub fn warp_options(&self) -> WarpOptions {
        WarpOptions {
            method: self.resampling,
            resolution: self.resolution,
            ..WarpOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.variable_key, "GRIB_ELEMENT");
        assert_eq!(config.timestamp_key, "GRIB_REF_TIME");
        assert_eq!(config.resampling, InterpolationMethod::Bilinear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = ExtractionConfig::from_yaml_str("resampling: nearest\nresolution: 0.1\n").unwrap();
        assert_eq!(config.resampling, InterpolationMethod::Nearest);
        assert_eq!(config.resolution, Some(0.1));
        assert_eq!(config.variable_key, "GRIB_ELEMENT");
    }

    #[test]
    fn test_unknown_yaml_field_rejected() {
        assert!(ExtractionConfig::from_yaml_str("variable: TMP\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_VARIABLE_KEY, "GRIB_SHORT_NAME"),
            (ENV_RESAMPLING, "cubic"),
            (ENV_RESOLUTION, "2500"),
            (ENV_PARAMETER_TABLES, "/etc/tables.yaml"),
        ]
        .into_iter()
        .collect();

        let mut config = ExtractionConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.variable_key, "GRIB_SHORT_NAME");
        assert_eq!(config.timestamp_key, "GRIB_REF_TIME");
        assert_eq!(config.resampling, InterpolationMethod::Cubic);
        assert_eq!(config.resolution, Some(2500.0));
        assert_eq!(config.parameter_tables, Some(PathBuf::from("/etc/tables.yaml")));
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = ExtractionConfig::default();
        assert!(config
            .apply_overrides(|k| (k == ENV_RESAMPLING).then(|| "lanczos".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|k| (k == ENV_RESOLUTION).then(|| "fine".to_string()))
            .is_err());
    }

    #[test]
    fn test_validate() {
        let config = ExtractionConfig {
            resolution: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractionConfig {
            timestamp_key: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = test_utils::write_temp_file(b"timestamp_key: GRIB_VALID_TIME\n", ".yaml");
        let config = ExtractionConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.timestamp_key, "GRIB_VALID_TIME");
        assert!(ExtractionConfig::from_yaml_file("/nonexistent/config.yaml").is_err());
    }

    #[test]
    fn test_warp_options() {
        let config = ExtractionConfig {
            resampling: InterpolationMethod::Nearest,
            resolution: Some(0.25),
            ..Default::default()
        };
        let options = config.warp_options();
        assert_eq!(options.method, InterpolationMethod::Nearest);
        assert_eq!(options.resolution, Some(0.25));
    }
}
