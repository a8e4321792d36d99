use cuebot_core::{HsvRange, MarkerShape};
use image::{GrayImage, RgbImage};
use nalgebra::Point2;

use crate::primitives::{
    bounding_quadrilateral, fill_polygon_mask, find_external_contours, largest_by_area,
    segment_within, simplify_polygon,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Calibration sheet found inside the table.
#[derive(Clone, Debug)]
pub struct MarkerRegion {
    /// Reduced outline in image coordinates (4 points for `MinAreaRect`).
    pub outline: Vec<Point2<f32>>,
    /// Filled outline; bounds the origin and axis spot searches.
    pub mask: GrayImage,
}

/// Find the calibration sheet: the largest marker-colored region inside the
/// table mask, reduced to `shape`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range, table_mask), fields(width = frame.width(), height = frame.height()))
)]
pub fn detect_marker_frame(
    frame: &RgbImage,
    range: &HsvRange,
    table_mask: &GrayImage,
    shape: MarkerShape,
) -> Option<MarkerRegion> {
    let mask = segment_within(frame, range, table_mask);
    let region = largest_by_area(find_external_contours(&mask))?;

    let outline = match shape {
        MarkerShape::MinAreaRect => bounding_quadrilateral(&region)?.to_vec(),
        MarkerShape::Polygon { epsilon_frac } => simplify_polygon(&region, epsilon_frac),
    };
    if outline.is_empty() {
        return None;
    }

    let mask = fill_polygon_mask(frame.width(), frame.height(), &outline);
    Some(MarkerRegion { outline, mask })
}
