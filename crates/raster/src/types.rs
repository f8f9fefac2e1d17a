//! Resampling kernel selection.

use serde::{Deserialize, Serialize};

/// Kernel used to compute warped pixel values.
///
/// Spelled `nearest`, `bilinear` or `cubic` in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    Nearest,
    #[default]
    Bilinear,
    /// Catmull-Rom over 4x4 pixels.
    Cubic,
}

impl std::str::FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "near" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            other => Err(format!("unknown resampling method '{}'", other)),
        }
    }
}

impl InterpolationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_method_parse() {
        assert_eq!("nearest".parse(), Ok(InterpolationMethod::Nearest));
        assert_eq!("BILINEAR".parse(), Ok(InterpolationMethod::Bilinear));
        assert_eq!("bicubic".parse(), Ok(InterpolationMethod::Cubic));
        assert!("lanczos".parse::<InterpolationMethod>().is_err());
        assert_eq!(InterpolationMethod::default().to_string(), "bilinear");
    }
}
