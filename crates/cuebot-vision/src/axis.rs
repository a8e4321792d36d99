use cuebot_core::{CoordinateFrame, HsvRange};
use image::{GrayImage, RgbImage};
use nalgebra::Point2;

use crate::primitives::{find_external_contours, largest_by_area, segment_within};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Centroid of the largest `range` region inside `region_mask`.
pub fn locate_spot(
    frame: &RgbImage,
    range: &HsvRange,
    region_mask: &GrayImage,
) -> Option<Point2<f32>> {
    let mask = segment_within(frame, range, region_mask);
    largest_by_area(find_external_contours(&mask))?.centroid()
}

/// Build the pixel coordinate frame from the origin and axis spots.
///
/// Both spots are searched independently inside the marker mask. If either
/// is missing, or they share a centroid, there is no frame for this tick.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = frame.width(), height = frame.height()))
)]
pub fn calibrate_axes(
    frame: &RgbImage,
    origin_range: &HsvRange,
    axis_range: &HsvRange,
    marker_mask: &GrayImage,
) -> Option<CoordinateFrame> {
    let origin = locate_spot(frame, origin_range, marker_mask);
    let axis_point = locate_spot(frame, axis_range, marker_mask);
    match (origin, axis_point) {
        (Some(origin), Some(axis_point)) => CoordinateFrame::from_spots(origin, axis_point),
        _ => {
            log::debug!(
                "axis calibration skipped: origin spot {}, axis spot {}",
                found(origin.is_some()),
                found(axis_point.is_some())
            );
            None
        }
    }
}

fn found(yes: bool) -> &'static str {
    if yes {
        "found"
    } else {
        "missing"
    }
}
