use nexus_common::Rgba;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest accepted grid cell, in logical units.
pub const MIN_CELL_SIZE: f64 = 1.0;
/// Most orbs a scene may draw.
pub const MAX_ORBS: usize = 256;

/// Errors from loading a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scene config: {0}")]
    Invalid(String),
}

/// Visual constants for the whole scene. Defaults reproduce the stock look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Painted over the whole surface every frame. Partial alpha leaves a
    /// fading trail of previous frames.
    pub background: Rgba,
    pub grid: GridConfig,
    pub orbs: OrbConfig,
    pub nexus: NexusConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Rgba::from_rgba8(15, 23, 42, 0.8),
            grid: GridConfig::default(),
            orbs: OrbConfig::default(),
            nexus: NexusConfig::default(),
        }
    }
}

/// Scrolling lattice of horizontal and vertical lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance between adjacent lines, logical units.
    pub cell_size: f64,
    /// Drift per frame along x and y, logical units.
    pub scroll: [f64; 2],
    pub line_color: Rgba,
    pub line_width: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            scroll: [0.5, 0.3],
            line_color: Rgba::from_rgba8(56, 189, 248, 0.3),
            line_width: 1.0,
        }
    }
}

/// Soft glowing orbs wandering on independent sinusoids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub count: usize,
    /// Hue of orb 0 in degrees; orb `i` gets `hue_base + i * hue_step`.
    pub hue_base: f32,
    pub hue_step: f32,
    pub saturation: f32,
    pub lightness: f32,
    /// Alpha at the orb center; the edge is always fully transparent.
    pub alpha: f32,
    /// Anchor point as a fraction of width and height.
    pub anchor: [f64; 2],
    /// Swing around the anchor as a fraction of width and height.
    pub amplitude: [f64; 2],
    /// Radians per frame along x and y.
    pub frequency: [f64; 2],
    /// Per-orb phase offset along x and y, multiplied by the orb index.
    pub phase_step: [f64; 2],
    pub radius_base: f64,
    pub radius_amplitude: f64,
    pub radius_frequency: f64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            count: 5,
            hue_base: 180.0,
            hue_step: 60.0,
            saturation: 0.7,
            lightness: 0.6,
            alpha: 0.8,
            anchor: [0.2, 0.3],
            amplitude: [0.3, 0.2],
            frequency: [0.01, 0.008],
            phase_step: [1.0, 2.0],
            radius_base: 20.0,
            radius_amplitude: 10.0,
            radius_frequency: 0.02,
        }
    }
}

/// One stop of the nexus gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NexusStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Pulsing glow fixed at the center of the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub radius_base: f64,
    pub radius_amplitude: f64,
    /// Radians per frame.
    pub frequency: f64,
    pub stops: Vec<NexusStop>,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            radius_base: 40.0,
            radius_amplitude: 10.0,
            frequency: 0.03,
            stops: vec![
                NexusStop {
                    offset: 0.0,
                    color: Rgba::from_rgba8(168, 85, 247, 0.9),
                },
                NexusStop {
                    offset: 0.7,
                    color: Rgba::from_rgba8(59, 130, 246, 0.5),
                },
                NexusStop {
                    offset: 1.0,
                    color: Rgba::from_rgba8(59, 130, 246, 0.0),
                },
            ],
        }
    }
}

impl SceneConfig {
    /// Load from a YAML file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid.cell_size.is_finite() && self.grid.cell_size >= MIN_CELL_SIZE) {
            return Err(ConfigError::Invalid(format!(
                "grid.cell_size must be at least {MIN_CELL_SIZE}, got {}",
                self.grid.cell_size
            )));
        }
        if self.orbs.count > MAX_ORBS {
            return Err(ConfigError::Invalid(format!(
                "orbs.count must be at most {MAX_ORBS}, got {}",
                self.orbs.count
            )));
        }
        if self.grid.scroll.iter().any(|s| !s.is_finite()) {
            return Err(ConfigError::Invalid("grid.scroll must be finite".into()));
        }
        if self.grid.line_width.is_nan() || self.grid.line_width < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grid.line_width must not be negative, got {}",
                self.grid.line_width
            )));
        }
        if self.orbs.radius_amplitude.abs() > self.orbs.radius_base {
            return Err(ConfigError::Invalid(
                "orbs.radius_amplitude must not exceed orbs.radius_base".into(),
            ));
        }
        if self.nexus.radius_amplitude.abs() > self.nexus.radius_base {
            return Err(ConfigError::Invalid(
                "nexus.radius_amplitude must not exceed nexus.radius_base".into(),
            ));
        }
        if let Some(stop) = self
            .nexus
            .stops
            .iter()
            .find(|s| !(0.0..=1.0).contains(&s.offset))
        {
            return Err(ConfigError::Invalid(format!(
                "nexus stop offset {} outside [0, 1]",
                stop.offset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SceneConfig::from_yaml("grid:\n  cell_size: 25.0\n").unwrap();
        assert_eq!(config.grid.cell_size, 25.0);
        assert_eq!(config.grid.scroll, [0.5, 0.3]);
        assert_eq!(config.orbs.count, 5);
        assert_eq!(config.nexus.stops.len(), 3);
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        let err = SceneConfig::from_yaml("grid:\n  cell_size: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_sub_unit_cell_size() {
        let err = SceneConfig::from_yaml("grid:\n  cell_size: 0.001\n").unwrap_err();
        assert!(err.to_string().contains("grid.cell_size"));
        assert!(SceneConfig::from_yaml("grid:\n  cell_size: 1.0\n").is_ok());
    }

    #[test]
    fn rejects_excessive_orb_count() {
        let err = SceneConfig::from_yaml("orbs:\n  count: 1000000\n").unwrap_err();
        assert!(err.to_string().contains("orbs.count"));
        let yaml = format!("orbs:\n  count: {MAX_ORBS}\n");
        assert!(SceneConfig::from_yaml(&yaml).is_ok());
    }

    #[test]
    fn rejects_stop_outside_unit_range() {
        let yaml = "nexus:\n  stops:\n    - offset: 1.5\n      color: { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }\n";
        let err = SceneConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn rejects_radius_that_could_go_negative() {
        let err = SceneConfig::from_yaml("orbs:\n  radius_amplitude: 25.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = SceneConfig::from_yaml("grid: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "orbs:\n  count: 3\n  hue_step: 90.0").unwrap();

        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.orbs.count, 3);
        assert_eq!(config.orbs.hue_step, 90.0);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
