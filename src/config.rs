// config.rs - viewer tunables

use crate::error::{PanoError, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sphere radius in scene units.
pub const SPHERE_RADIUS: f32 = 100.0;
/// Longitude/latitude tessellation of the sphere.
pub const SPHERE_SEGMENTS: usize = 96;
/// Cadence at which orientation samples are expected (seconds).
pub const SENSOR_INTERVAL: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoConfiguration {
    /// Pan sensitivity divisor. Larger is slower.
    pub pan_rate: f32,
    /// Pinch sensitivity divisor. Larger is slower.
    pub pinch_rate: f32,
    /// Look direction at start, `[yaw, pitch]` in degrees.
    ///
    /// Equirectangular assets disagree about where "forward" is, so this is
    /// per-asset data rather than a property of the camera model.
    pub initial_look: [f32; 2],
}

impl Default for PanoConfiguration {
    fn default() -> Self {
        Self {
            pan_rate: 5.0,
            pinch_rate: 10.0,
            initial_look: [0.0, 0.0],
        }
    }
}

impl PanoConfiguration {
    pub fn new(pan_rate: f32, pinch_rate: f32) -> Self {
        Self {
            pan_rate,
            pinch_rate,
            ..Self::default()
        }
    }

    pub fn with_initial_look(mut self, yaw_deg: f32, pitch_deg: f32) -> Self {
        self.initial_look = [yaw_deg, pitch_deg];
        self
    }

    /// Pan offset that makes the composer produce `initial_look`.
    pub fn initial_offset(&self) -> Vec2 {
        Vec2::from(self.initial_look) * self.pan_rate
    }

    pub fn validate(&self) -> Result<()> {
        check_rate("pan_rate", self.pan_rate)?;
        check_rate("pinch_rate", self.pinch_rate)?;
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: PanoConfiguration = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PanoError::io(path, e))?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

/// Rates divide gesture input, so they must be finite and positive.
pub(crate) fn check_rate(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PanoError::InvalidRate { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_defaults() {
        let config = PanoConfiguration::default();
        assert_eq!(config.pan_rate, 5.0);
        assert_eq!(config.pinch_rate, 10.0);
        assert_eq!(config.initial_offset(), Vec2::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn initial_look_scales_with_pan_rate() {
        let config = PanoConfiguration::new(4.0, 10.0).with_initial_look(90.0, -10.0);
        assert_eq!(config.initial_offset(), Vec2::new(360.0, -40.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = PanoConfiguration::from_json(r#"{ "pan_rate": 2.5 }"#).unwrap();
        assert_eq!(config.pan_rate, 2.5);
        assert_eq!(config.pinch_rate, 10.0);
        assert_eq!(config.initial_look, [0.0, 0.0]);
    }

    #[test]
    fn rejects_non_positive_rates() {
        let err = PanoConfiguration::from_json(r#"{ "pinch_rate": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            PanoError::InvalidRate {
                name: "pinch_rate",
                ..
            }
        ));
        assert!(PanoConfiguration::new(-1.0, 10.0).validate().is_err());
        assert!(PanoConfiguration::new(f32::NAN, 10.0).validate().is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = PanoConfiguration::from_json("{ pan_rate: ").unwrap_err();
        assert!(matches!(err, PanoError::Json { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("definitely/not/here/pano.json");
        let config = PanoConfiguration::load_or_default(path).unwrap();
        assert_eq!(config, PanoConfiguration::default());
        assert!(matches!(
            PanoConfiguration::load(path),
            Err(PanoError::Io { .. })
        ));
    }
}
