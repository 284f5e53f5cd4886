//! CLI configuration, loaded from a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hmdq_geom::GeometryOptions;
use serde::{Deserialize, Serialize};

/// Verbosity thresholds. Output is printed when the requested verbosity is
/// at or above the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Verbosity {
    /// Verbosity used when none is requested on the command line.
    pub default: i32,
    /// Threshold for the detailed geometry (transforms, raw tangents).
    pub geom: i32,
    /// Highest meaningful verbosity.
    pub max: i32,
}

impl Default for Verbosity {
    fn default() -> Self {
        Self {
            default: 0,
            geom: 1,
            max: 3,
        }
    }
}

/// Output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Spaces per indentation level on the console.
    pub cli_indent: usize,
    /// Pretty print the JSON output.
    pub json_pretty: bool,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            cli_indent: 4,
            json_pretty: true,
        }
    }
}

/// Which Oculus FOV variants are printed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OculusConfig {
    /// Print the default FOV geometry.
    pub default_fov: bool,
    /// Print the maximal FOV geometry.
    pub max_fov: bool,
}

impl Default for OculusConfig {
    fn default() -> Self {
        Self {
            default_fov: true,
            max_fov: false,
        }
    }
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbosity levels.
    pub verbosity: Verbosity,
    /// Formatting.
    pub format: Format,
    /// Geometry calculation options.
    pub geometry: GeometryOptions,
    /// Oculus printing options.
    pub oculus: OculusConfig,
}

impl Config {
    /// Load from a TOML file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let v = &self.verbosity;
        if v.geom < v.default {
            bail!("verbosity.geom ({}) must not be below verbosity.default ({})", v.geom, v.default);
        }
        if v.max < v.geom {
            bail!("verbosity.max ({}) must not be below verbosity.geom ({})", v.max, v.geom);
        }
        if self.format.cli_indent > 16 {
            bail!("format.cli_indent must be at most 16");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmdq_geom::{AreaMethod, VerticalFov};

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.format.cli_indent, 4);
        assert_eq!(config.geometry.vertical_fov, VerticalFov::Average);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [geometry]
            vertical_fov = "min_max"
            area_method = "clipped"

            [oculus]
            max_fov = true
            "#,
        )
        .unwrap();
        assert_eq!(config.geometry.vertical_fov, VerticalFov::MinMax);
        assert_eq!(config.geometry.area_method, AreaMethod::Clipped);
        assert!(config.oculus.max_fov);
        assert!(config.oculus.default_fov);
        assert_eq!(config.verbosity.geom, 1);
    }

    #[test]
    fn test_invalid_verbosity() {
        let mut config = Config::default();
        config.verbosity.geom = -5;
        assert!(config.validate().is_err());
    }
}
