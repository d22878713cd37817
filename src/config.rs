//! Tuning parameters loaded from RON
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```text
//! Config(
//!   shadow: (probe_epsilon: 0.0001, circle_ray_density: 1, collinear_tolerance: 0.01),
//!   rooms: (split_window_margin: 4),
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

/// Smallest side ray offset. Circle guides and edge ends carry their own
/// slack of up to 1e-5 rad, which side rays must clear.
pub const MIN_SIDE_EPSILON: f32 = 5e-5;

/// Largest split window margin accepted from config files
pub const MAX_SPLIT_WINDOW_MARGIN: i32 = 256;

/// Light sweep settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Angular offset of the side rays around each vertex (radians)
    pub probe_epsilon: f32,
    /// Circle guide vertices per unit of radius (at least 1 per side)
    pub circle_ray_density: u32,
    /// Sine of the largest bend at which a fan point is dropped as straight
    pub collinear_tolerance: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            probe_epsilon: 1e-4,
            circle_ray_density: 1,
            collinear_tolerance: 1e-2,
        }
    }
}

/// Room tracking settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// Tiles around a placed area searched for split pieces
    pub split_window_margin: i32,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self { split_window_margin: 4 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shadow: ShadowConfig,
    pub rooms: RoomsConfig,
}

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    ValidationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), String> {
        let shadow = &self.shadow;
        if !(MIN_SIDE_EPSILON..0.1).contains(&shadow.probe_epsilon) {
            return Err(format!(
                "probe_epsilon {} out of range [{}, 0.1)", shadow.probe_epsilon, MIN_SIDE_EPSILON
            ));
        }
        if shadow.circle_ray_density == 0 {
            return Err("circle_ray_density must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&shadow.collinear_tolerance) {
            return Err(format!("collinear_tolerance {} out of range [0, 1)", shadow.collinear_tolerance));
        }
        let margin = self.rooms.split_window_margin;
        if !(1..=MAX_SPLIT_WINDOW_MARGIN).contains(&margin) {
            return Err(format!(
                "split_window_margin {} out of range [1, {}]", margin, MAX_SPLIT_WINDOW_MARGIN
            ));
        }
        Ok(())
    }
}

/// Load a config file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents)?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

/// Parse and validate config RON text
pub fn load_config_from_str(s: &str) -> Result<Config, ConfigError> {
    let config: Config = ron::from_str(s)?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = load_config_from_str("(rooms: (split_window_margin: 6))").unwrap();
        assert_eq!(config.rooms.split_window_margin, 6);
        assert_eq!(config.shadow, ShadowConfig::default());

        let empty = load_config_from_str("()").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_full_config() {
        let text = "Config(shadow: (probe_epsilon: 0.001, circle_ray_density: 3, collinear_tolerance: 0.0), rooms: (split_window_margin: 2))";
        let config = load_config_from_str(text).unwrap();
        assert_eq!(config.shadow.circle_ray_density, 3);
        assert_eq!(config.shadow.collinear_tolerance, 0.0);
        assert_eq!(config.rooms.split_window_margin, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load_config_from_str("(shadow: (circle_ray_density: 0))").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let err = load_config_from_str("(rooms: (split_window_margin: 0))").unwrap_err();
        assert!(err.to_string().contains("split_window_margin"));
        let err = load_config_from_str("(rooms: (split_window_margin: 2147483647))").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(load_config_from_str("(rooms: (split_window_margin: 256))").is_ok());
        let err = load_config_from_str("(shadow: (probe_epsilon: 0.000001))").unwrap_err();
        assert!(err.to_string().contains("probe_epsilon"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridlight.ron");
        fs::write(&path, "(shadow: (probe_epsilon: 0.0005))").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.shadow.probe_epsilon, 0.0005);
        assert!(matches!(load_config(dir.path().join("missing.ron")), Err(ConfigError::IoError(_))));
    }
}
