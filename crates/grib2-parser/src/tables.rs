//! GRIB2 parameter and level lookup tables.
//!
//! Translates GRIB2 numeric codes into the element names, descriptions and
//! level abbreviations that band metadata is keyed by. WMO defaults for the
//! CERRA surface and height-level products are built in; callers can extend
//! or override them (see the `extraction` crate's YAML loader).

use std::collections::HashMap;

/// (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// Element name plus human-readable description and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
    pub unit: String,
}

impl ParameterInfo {
    pub fn new(name: &str, description: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// How a level type is described in band metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelDescription {
    /// Fixed text such as "surface".
    Static(String),
    /// Text with `{value}` or `{value_mb}` filled from the level value.
    Template(String),
}

impl LevelDescription {
    /// Parse a display string, treating it as a template when it has a placeholder.
    pub fn from_display(display: &str) -> Self {
        if display.contains("{value") {
            LevelDescription::Template(display.to_string())
        } else {
            LevelDescription::Static(display.to_string())
        }
    }

    /// `{value_mb}` divides a pressure in Pa by 100.
    pub fn format(&self, value: f64) -> String {
        match self {
            LevelDescription::Static(s) => s.clone(),
            LevelDescription::Template(t) => t
                .replace("{value}", &format_level_value(value))
                .replace("{value_mb}", &format_level_value(value / 100.0)),
        }
    }
}

/// Level abbreviation (as used in short names like "2-HTGL") plus description.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub abbrev: String,
    pub description: LevelDescription,
}

/// Code-to-name tables consulted while building band metadata.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> parameter info
    parameters: HashMap<ParamKey, ParameterInfo>,
    /// level_type -> abbreviation and description pattern
    levels: HashMap<u8, LevelInfo>,
}

impl Grib2Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables pre-populated with the WMO codes used by reanalysis products.
    pub fn wmo_defaults() -> Self {
        let mut tables = Self::new();

        for &(d, c, n, name, description, unit) in DEFAULT_PARAMETERS {
            tables.add_parameter_info(d, c, n, ParameterInfo::new(name, description, unit));
        }
        for &(code, abbrev, display) in DEFAULT_LEVELS {
            tables.add_level(code, abbrev, LevelDescription::from_display(display));
        }

        tables
    }

    /// Add a parameter mapping with only an element name.
    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: String) {
        let info = ParameterInfo {
            description: name.clone(),
            name,
            unit: String::new(),
        };
        self.parameters.insert((discipline, category, number), info);
    }

    /// Add or replace a parameter mapping.
    pub fn add_parameter_info(&mut self, discipline: u8, category: u8, number: u8, info: ParameterInfo) {
        self.parameters.insert((discipline, category, number), info);
    }

    /// Add or replace a level mapping.
    pub fn add_level(&mut self, level_type: u8, abbrev: &str, description: LevelDescription) {
        self.levels.insert(
            level_type,
            LevelInfo {
                abbrev: abbrev.to_string(),
                description,
            },
        );
    }

    pub fn parameter(&self, discipline: u8, category: u8, number: u8) -> Option<&ParameterInfo> {
        self.parameters.get(&(discipline, category, number))
    }

    /// Element name for a parameter, `P{d}_{c}_{n}` when unknown.
    pub fn get_parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        self.parameter(discipline, category, number)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
    }

    /// Level abbreviation, or "L{type}" when unknown.
    pub fn get_level_abbrev(&self, level_type: u8) -> String {
        self.levels
            .get(&level_type)
            .map(|l| l.abbrev.clone())
            .unwrap_or_else(|| format!("L{}", level_type))
    }

    /// Human readable level, e.g. "2 m above ground".
    pub fn get_level_description(&self, level_type: u8, level_value: f64) -> String {
        match self.levels.get(&level_type) {
            Some(level) => level.description.format(level_value),
            None => format!(
                "Level type {} value {}",
                level_type,
                format_level_value(level_value)
            ),
        }
    }

    /// Merge another table set into this one; entries in `other` win.
    pub fn merge(&mut self, other: Grib2Tables) {
        self.parameters.extend(other.parameters);
        self.levels.extend(other.levels);
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.levels.is_empty()
    }
}

/// Integral level values print without a fractional part.
pub fn format_level_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

const DEFAULT_PARAMETERS: &[(u8, u8, u8, &str, &str, &str)] = &[
    // temperature
    (0, 0, 0, "TMP", "Temperature", "K"),
    (0, 0, 2, "POT", "Potential temperature", "K"),
    (0, 0, 4, "TMAX", "Maximum temperature", "K"),
    (0, 0, 5, "TMIN", "Minimum temperature", "K"),
    (0, 0, 6, "DPT", "Dew point temperature", "K"),
    (0, 0, 17, "SKINT", "Skin temperature", "K"),
    // moisture
    (0, 1, 0, "SPFH", "Specific humidity", "kg/kg"),
    (0, 1, 1, "RH", "Relative humidity", "%"),
    (0, 1, 3, "PWAT", "Precipitable water", "kg/m^2"),
    (0, 1, 8, "APCP", "Total precipitation", "kg/m^2"),
    (0, 1, 11, "SNOD", "Snow depth", "m"),
    (0, 1, 29, "ASNOW", "Total snowfall", "m"),
    (0, 1, 52, "PRATE", "Total precipitation rate", "kg/m^2/s"),
    (0, 1, 60, "SDWE", "Snow depth water equivalent", "kg/m^2"),
    // momentum
    (0, 2, 0, "WDIR", "Wind direction (from which blowing)", "deg true"),
    (0, 2, 1, "WIND", "Wind speed", "m/s"),
    (0, 2, 2, "UGRD", "u-component of wind", "m/s"),
    (0, 2, 3, "VGRD", "v-component of wind", "m/s"),
    (0, 2, 22, "GUST", "Wind speed (gust)", "m/s"),
    // mass
    (0, 3, 0, "PRES", "Pressure", "Pa"),
    (0, 3, 1, "PRMSL", "Pressure reduced to MSL", "Pa"),
    (0, 3, 4, "GP", "Geopotential", "m^2/s^2"),
    (0, 3, 5, "HGT", "Geopotential height", "gpm"),
    // radiation
    (0, 4, 7, "DSWRF", "Downward short-wave radiation flux", "W/m^2"),
    (0, 5, 3, "DLWRF", "Downward long-wave radiation flux", "W/m^2"),
    // cloud
    (0, 6, 1, "TCDC", "Total cloud cover", "%"),
    (0, 6, 3, "LCDC", "Low cloud cover", "%"),
    (0, 6, 4, "MCDC", "Medium cloud cover", "%"),
    (0, 6, 5, "HCDC", "High cloud cover", "%"),
    // physical atmospheric properties
    (0, 19, 0, "VIS", "Visibility", "m"),
    (0, 19, 1, "ALBDO", "Albedo", "%"),
    // land surface
    (2, 0, 0, "LAND", "Land cover", "Proportion"),
    (2, 0, 7, "MSTAV", "Moisture availability", "%"),
];

const DEFAULT_LEVELS: &[(u8, &str, &str)] = &[
    (1, "SFC", "surface"),
    (2, "CBL", "cloud base"),
    (3, "CTL", "cloud top"),
    (4, "0DEG", "0C isotherm"),
    (7, "TRO", "tropopause"),
    (8, "NTAT", "top of atmosphere"),
    (10, "EATM", "entire atmosphere"),
    (100, "ISBL", "{value} Pa"),
    (101, "MSL", "mean sea level"),
    (102, "GPML", "{value} m above MSL"),
    (103, "HTGL", "{value} m above ground"),
    (104, "SIGL", "sigma level {value}"),
    (105, "HYBL", "hybrid level {value}"),
    (106, "DBLL", "{value} m below surface"),
    (108, "SPDL", "{value} Pa above ground"),
    (200, "EATM", "entire atmosphere"),
];
