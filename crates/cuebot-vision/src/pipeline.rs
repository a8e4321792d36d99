//! Per-frame detection pipeline.
//!
//! Stages run strictly downstream: table, then marker sheet, then axes, with
//! ball localization running on the table mask alongside the axis search.
//! An absent stage ends the chain for this frame only; nothing carries over
//! to the next call.

use cuebot_core::{Ball, BallMeasurement, CalibrationConfig, CoordinateFrame, HsvThresholds, VisionParams};
use image::RgbImage;
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

use crate::axis::calibrate_axes;
use crate::ball::localize_balls;
use crate::marker::{detect_marker_frame, MarkerRegion};
use crate::measure::measure_balls;
use crate::table::{detect_table_boundary, TableBoundary};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// First stage that came back empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Table,
    Marker,
    Axes,
}

/// Everything one frame produced.
#[derive(Clone, Debug, Default)]
pub struct FrameAnalysis {
    pub table: Option<TableBoundary>,
    pub marker: Option<MarkerRegion>,
    pub frame: Option<CoordinateFrame>,
    /// Balls found on the table, whether or not a frame was calibrated.
    pub balls: Vec<Ball>,
    /// Empty unless `frame` is present.
    pub measurements: Vec<BallMeasurement>,
}

impl FrameAnalysis {
    pub fn stopped_at(&self) -> Option<Stage> {
        if self.table.is_none() {
            Some(Stage::Table)
        } else if self.marker.is_none() {
            Some(Stage::Marker)
        } else if self.frame.is_none() {
            Some(Stage::Axes)
        } else {
            None
        }
    }

    /// Serializable summary.
    pub fn report(&self, width: u32, height: u32) -> FrameReport {
        FrameReport {
            width,
            height,
            stopped_at: self.stopped_at(),
            table_area_px: self.table.as_ref().map(|t| t.region.area()),
            marker_outline: self
                .marker
                .as_ref()
                .map(|m| m.outline.iter().map(|p| [p.x, p.y]).collect()),
            frame: self.frame,
            balls: self.balls.clone(),
            measurements: self.measurements.clone(),
        }
    }
}

/// JSON-friendly view of a [`FrameAnalysis`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameReport {
    pub width: u32,
    pub height: u32,
    pub stopped_at: Option<Stage>,
    pub table_area_px: Option<f64>,
    pub marker_outline: Option<Vec<[f32; 2]>>,
    pub frame: Option<CoordinateFrame>,
    pub balls: Vec<Ball>,
    pub measurements: Vec<BallMeasurement>,
}

/// Detection configuration bound to one session.
///
/// Thresholds can be swapped between frames; everything else is fixed at
/// construction.
#[derive(Clone, Debug)]
pub struct FramePipeline {
    thresholds: HsvThresholds,
    vision: VisionParams,
    ball_diameter_cm: f32,
}

impl FramePipeline {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            vision: config.vision.clone(),
            ball_diameter_cm: config.physical.ball_diameter_cm,
        }
    }

    pub fn thresholds(&self) -> &HsvThresholds {
        &self.thresholds
    }

    /// Replace the color ranges used from the next frame on.
    pub fn set_thresholds(&mut self, thresholds: HsvThresholds) {
        self.thresholds = thresholds;
    }

    pub fn vision(&self) -> &VisionParams {
        &self.vision
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn process(&self, frame: &RgbImage) -> FrameAnalysis {
        let blurred;
        let frame = match self.vision.blur_sigma {
            Some(sigma) if sigma > 0.0 => {
                blurred = gaussian_blur_f32(frame, sigma);
                &blurred
            }
            _ => frame,
        };

        let t = &self.thresholds;
        let mut out = FrameAnalysis::default();

        let Some(table) = detect_table_boundary(frame, &t.table, self.vision.morph_radius) else {
            log::debug!("frame skipped: no table boundary");
            return out;
        };

        out.balls = localize_balls(frame, &t.ball, &table.mask, self.vision.min_ball_area);

        let marker = detect_marker_frame(frame, &t.marker, &table.mask, self.vision.marker_shape);
        out.table = Some(table);
        let Some(marker) = marker else {
            log::debug!("frame skipped: no marker sheet ({} balls seen)", out.balls.len());
            return out;
        };

        out.frame = calibrate_axes(frame, &t.origin_spot, &t.axis_spot, &marker.mask);
        out.marker = Some(marker);
        if let Some(cf) = &out.frame {
            out.measurements = measure_balls(cf, &out.balls, self.ball_diameter_cm);
            log::debug!(
                "{} balls, {} measured",
                out.balls.len(),
                out.measurements.len()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuebot_core::HsvRange;
    use image::Rgb;

    #[test]
    fn blank_frame_stops_at_the_table() {
        let pipeline = FramePipeline::new(&CalibrationConfig::default());
        let frame = RgbImage::from_pixel(80, 60, Rgb([10, 10, 10]));
        let out = pipeline.process(&frame);
        assert_eq!(out.stopped_at(), Some(Stage::Table));
        assert!(out.balls.is_empty());
        assert!(out.measurements.is_empty());
    }

    #[test]
    fn table_without_sheet_stops_at_the_marker() {
        let pipeline = FramePipeline::new(&CalibrationConfig::default());
        let frame = RgbImage::from_pixel(80, 60, Rgb([250, 250, 250]));
        let out = pipeline.process(&frame);
        assert!(out.table.is_some());
        assert_eq!(out.stopped_at(), Some(Stage::Marker));
        let report = out.report(80, 60);
        assert_eq!(report.stopped_at, Some(Stage::Marker));
        assert!(report.marker_outline.is_none());
    }

    #[test]
    fn thresholds_can_be_swapped_between_frames() {
        let mut pipeline = FramePipeline::new(&CalibrationConfig::default());
        let frame = RgbImage::from_pixel(80, 60, Rgb([10, 10, 10]));
        assert!(pipeline.process(&frame).table.is_none());

        let mut thresholds = pipeline.thresholds().clone();
        thresholds.table = HsvRange::new([0, 0, 0], [179, 255, 50]);
        pipeline.set_thresholds(thresholds);
        assert!(pipeline.process(&frame).table.is_some());
    }

    #[test]
    fn blur_keeps_a_uniform_table() {
        let mut cfg = CalibrationConfig::default();
        cfg.vision.blur_sigma = Some(1.1);
        let pipeline = FramePipeline::new(&cfg);
        let frame = RgbImage::from_pixel(64, 48, Rgb([250, 250, 250]));
        assert!(pipeline.process(&frame).table.is_some());
    }
}
