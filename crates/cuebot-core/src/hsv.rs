//! 8-bit HSV color model.
//!
//! Values follow the OpenCV 8-bit convention so that thresholds tuned with the
//! usual tooling can be pasted into a config unchanged: hue is halved into
//! `0..=179`, saturation and value span `0..=255`.

use serde::{Deserialize, Serialize};

/// Largest representable hue (degrees / 2).
pub const HUE_MAX: u8 = 179;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert an 8-bit RGB triple.
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

        let mut h_deg = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h_deg < 0.0 {
            h_deg += 360.0;
        }
        // 359.x degrees rounds up to 180, which wraps back to red.
        let h = (h_deg * 0.5).round() as u16 % (HUE_MAX as u16 + 1);

        Self {
            h: h as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

/// Inclusive lower/upper bound pair selecting pixels of one color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        let px = [hsv.h, hsv.s, hsv.v];
        (0..3).all(|c| self.lower[c] <= px[c] && px[c] <= self.upper[c])
    }

    #[inline]
    pub fn contains_rgb(&self, rgb: [u8; 3]) -> bool {
        self.contains(Hsv::from_rgb(rgb))
    }

    /// True when every channel bound is ordered and the hue stays in range.
    pub fn is_well_formed(&self) -> bool {
        (0..3).all(|c| self.lower[c] <= self.upper[c]) && self.upper[0] <= HUE_MAX
    }
}
