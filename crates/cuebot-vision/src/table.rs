use cuebot_core::HsvRange;
use image::{GrayImage, RgbImage};

use crate::primitives::{
    find_external_contours, largest_by_area, morph_close, morph_open, region_mask, segment,
    Region,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Usable table surface: the largest light region of the frame.
#[derive(Clone, Debug)]
pub struct TableBoundary {
    pub region: Region,
    /// Filled outline; bounds the marker and ball searches.
    pub mask: GrayImage,
}

/// Find the table surface.
///
/// Segments `range`, closes then opens the mask with a square element of
/// Chebyshev radius `morph_radius` (2 gives the usual 5x5 kernel) and keeps
/// the largest external region. `None` when nothing of the table color
/// survives the cleanup.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range), fields(width = frame.width(), height = frame.height()))
)]
pub fn detect_table_boundary(
    frame: &RgbImage,
    range: &HsvRange,
    morph_radius: u8,
) -> Option<TableBoundary> {
    let raw = segment(frame, range);
    let cleaned = morph_open(&morph_close(&raw, morph_radius), morph_radius);

    let region = largest_by_area(find_external_contours(&cleaned))?;
    let mask = region_mask(frame.width(), frame.height(), &region);
    Some(TableBoundary { region, mask })
}
