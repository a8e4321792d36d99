//! Session configuration.
//!
//! Everything here is read-only for the duration of a session: the pipeline
//! reads it per frame, the dispatcher reads the device and physical sections.
//! Each section falls back to the reference rig's values when omitted from
//! the JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::HsvRange;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Network location of the actuator controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Host or `host:port` of the controller (no scheme).
    pub address: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "192.168.137.244".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Mechanical constants of the robot and the table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Distance from the robot center to its wheels, meters.
    pub radius_robot_m: f64,
    pub wheel_radius_m: f64,
    pub steps_per_rotation: u32,
    /// Travel per wheel rotation used by the translation formula, meters.
    pub distance_per_step_m: f64,
    pub motor_speed: u32,
    pub ball_diameter_cm: f32,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            radius_robot_m: 0.15242,
            wheel_radius_m: 0.03,
            steps_per_rotation: 1600,
            distance_per_step_m: 0.214,
            motor_speed: 2200,
            ball_diameter_cm: 5.7,
        }
    }
}

/// The six color ranges the pipeline segments on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvThresholds {
    /// Light table surface.
    pub table: HsvRange,
    /// Calibration sheet.
    pub marker: HsvRange,
    pub origin_spot: HsvRange,
    pub axis_spot: HsvRange,
    pub ball: HsvRange,
    /// Robot body; carried for tooling, unused by the measurement pipeline.
    pub auxiliary: HsvRange,
}

impl Default for HsvThresholds {
    fn default() -> Self {
        Self {
            table: HsvRange::new([0, 0, 100], [179, 40, 255]),
            marker: HsvRange::new([145, 30, 30], [179, 255, 255]),
            origin_spot: HsvRange::new([0, 0, 0], [179, 100, 120]),
            axis_spot: HsvRange::new([2, 100, 100], [12, 180, 200]),
            ball: HsvRange::new([30, 41, 110], [35, 120, 160]),
            auxiliary: HsvRange::new([145, 0, 30], [179, 100, 255]),
        }
    }
}

impl HsvThresholds {
    fn named(&self) -> [(&'static str, &HsvRange); 6] {
        [
            ("thresholds.table", &self.table),
            ("thresholds.marker", &self.marker),
            ("thresholds.origin_spot", &self.origin_spot),
            ("thresholds.axis_spot", &self.axis_spot),
            ("thresholds.ball", &self.ball),
            ("thresholds.auxiliary", &self.auxiliary),
        ]
    }
}

/// How the calibration sheet outline is reduced before masking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    /// Minimum-area bounding rectangle (always 4 points).
    #[default]
    MinAreaRect,
    /// Douglas-Peucker simplification; epsilon is a fraction of the perimeter.
    Polygon { epsilon_frac: f64 },
}

/// Tuning of the pixel-level stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    /// Optional Gaussian pre-blur applied to every frame.
    pub blur_sigma: Option<f32>,
    /// Chebyshev radius of the square structuring element (2 => 5x5).
    pub morph_radius: u8,
    pub marker_shape: MarkerShape,
    /// Ball contours must be strictly larger than this, px².
    pub min_ball_area: f64,
}

impl Default for VisionParams {
    fn default() -> Self {
        Self {
            blur_sigma: None,
            morph_radius: 2,
            marker_shape: MarkerShape::default(),
            min_ball_area: 100.0,
        }
    }
}

/// Timing and bias of the two-phase polar dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchParams {
    /// Delay between the rotation and the translation command.
    pub phase_two_delay_ms: u64,
    /// Subtracted from every translation step count.
    pub translation_bias_steps: i64,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            phase_two_delay_ms: 2000,
            translation_bias_steps: 100,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub device: DeviceConfig,
    pub physical: PhysicalConstants,
    pub thresholds: HsvThresholds,
    pub vision: VisionParams,
    pub dispatch: DispatchParams,
}

impl CalibrationConfig {
    /// Load and validate a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.address.trim().is_empty() {
            return Err(invalid("device.address", "must not be empty"));
        }

        let p = &self.physical;
        positive("physical.radius_robot_m", p.radius_robot_m)?;
        positive("physical.wheel_radius_m", p.wheel_radius_m)?;
        positive("physical.distance_per_step_m", p.distance_per_step_m)?;
        positive("physical.ball_diameter_cm", p.ball_diameter_cm as f64)?;
        if p.steps_per_rotation == 0 {
            return Err(invalid("physical.steps_per_rotation", "must be > 0"));
        }

        for (field, range) in self.thresholds.named() {
            if !range.is_well_formed() {
                return Err(invalid(
                    field,
                    format!(
                        "lower {:?} must not exceed upper {:?} (hue <= 179)",
                        range.lower, range.upper
                    ),
                ));
            }
        }

        if let MarkerShape::Polygon { epsilon_frac } = self.vision.marker_shape {
            positive("vision.marker_shape.epsilon_frac", epsilon_frac)?;
        }
        if let Some(sigma) = self.vision.blur_sigma {
            positive("vision.blur_sigma", sigma as f64)?;
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and > 0, got {value}")))
    }
}
