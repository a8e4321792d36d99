//! Core types and configuration for the cuebot calibration-to-actuation pipeline.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete image type or transport; the vision and robot crates
//! build on the types defined here.

mod config;
mod hsv;
mod logger;
mod types;

pub use config::{
    CalibrationConfig, ConfigError, DeviceConfig, DispatchParams, HsvThresholds, MarkerShape,
    PhysicalConstants, VisionParams,
};
pub use hsv::{Hsv, HsvRange, HUE_MAX};
pub use types::{Ball, BallMeasurement, CoordinateFrame, MotionCommand, StrikeCommand};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, LOG_ENV};
