//! Facade crate for the `cuebot-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core, vision and robot crates
//! - end-to-end helpers that load a frame from disk, run the detection
//!   pipeline and write a JSON report or an annotated overlay
//! - the trigger vocabulary understood by the `cuebot run` loop
//!
//! ## Quickstart
//!
//! ```no_run
//! use cuebot::core::CalibrationConfig;
//! use cuebot::detect;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CalibrationConfig::default();
//! let (frame, analysis) = detect::measure_file("table.png", &cfg)?;
//! for m in &analysis.measurements {
//!     println!("{:.1} cm @ {:.1} deg", m.distance_cm, m.angle_deg);
//! }
//! # let _ = frame;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `cuebot::core`: shared types, HSV ranges, configuration, logging.
//! - `cuebot::vision`: detectors, measurement calculator, frame pipeline.
//! - `cuebot::robot`: step translation and the dispatch controller.
//! - `cuebot::detect`: file-level helpers over `image::RgbImage`.

pub use cuebot_core as core;
pub use cuebot_robot as robot;
pub use cuebot_vision as vision;

pub use cuebot_core::{BallMeasurement, CalibrationConfig, CoordinateFrame};
pub use cuebot_vision::{FrameAnalysis, FramePipeline, FrameReport};

pub mod detect;
mod error;
pub mod trigger;

pub use error::RunError;
pub use trigger::{Trigger, TriggerParseError};
