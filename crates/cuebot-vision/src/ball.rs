use cuebot_core::{Ball, HsvRange};
use image::{GrayImage, RgbImage};

use crate::primitives::{find_external_contours, segment_within};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default minimum contour area for a ball, px².
pub const DEFAULT_MIN_BALL_AREA: f64 = 100.0;

/// Locate ball-colored blobs on the table.
///
/// Every external contour inside `table_mask` whose area is strictly greater
/// than `min_area` is reported as its minimal enclosing circle. The order is
/// contour discovery order; the list may be empty. Circles of zero radius are
/// dropped.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range, table_mask), fields(width = frame.width(), height = frame.height()))
)]
pub fn localize_balls(
    frame: &RgbImage,
    range: &HsvRange,
    table_mask: &GrayImage,
    min_area: f64,
) -> Vec<Ball> {
    let mask = segment_within(frame, range, table_mask);
    find_external_contours(&mask)
        .into_iter()
        .filter(|region| region.area() > min_area)
        .filter_map(|region| region.enclosing_circle())
        .map(|c| Ball::new(c.center, c.radius))
        .filter(|ball| !ball.is_degenerate())
        .collect()
}
