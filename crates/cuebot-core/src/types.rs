use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Pixel-space coordinate frame anchored on the marker sheet.
///
/// `y_axis` runs from the origin spot to the axis spot and is *not* unit
/// length. `x_axis` is `y_axis` rotated by -90° in image space
/// (`(-y.y, y.x)`), so both axes always share a magnitude and are
/// perpendicular. Because image Y grows downward this is not a right-handed
/// physical frame; the convention is kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFrame {
    pub origin: Point2<f32>,
    pub y_axis: Vector2<f32>,
    pub x_axis: Vector2<f32>,
}

impl CoordinateFrame {
    /// Build a frame from the origin and axis spot centroids.
    ///
    /// Returns `None` when the spots coincide, since a zero-length axis has no
    /// direction.
    pub fn from_spots(origin: Point2<f32>, axis_point: Point2<f32>) -> Option<Self> {
        let y_axis = axis_point - origin;
        if !(y_axis.norm_squared() > 0.0) {
            return None;
        }
        Some(Self {
            origin,
            y_axis,
            x_axis: Vector2::new(-y_axis.y, y_axis.x),
        })
    }

    /// Length of either axis in pixels.
    #[inline]
    pub fn axis_length(&self) -> f32 {
        self.y_axis.norm()
    }

    /// Tip of the Y axis, i.e. the axis spot.
    #[inline]
    pub fn y_tip(&self) -> Point2<f32> {
        self.origin + self.y_axis
    }

    /// Tip of the derived X axis.
    #[inline]
    pub fn x_tip(&self) -> Point2<f32> {
        self.origin + self.x_axis
    }
}

/// A ball candidate in pixel space: minimal enclosing circle of a region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub center_px: Point2<f32>,
    pub radius_px: f32,
}

impl Ball {
    pub fn new(center_px: Point2<f32>, radius_px: f32) -> Self {
        Self {
            center_px,
            radius_px,
        }
    }

    /// Degenerate balls (zero, negative or non-finite radius) carry no scale.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.radius_px.is_finite() && self.radius_px > 0.0)
    }
}

/// Physical measurement of one ball relative to a [`CoordinateFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallMeasurement {
    pub center_px: Point2<f32>,
    pub radius_px: f32,
    /// Distance from the origin, always `>= 0`.
    pub distance_cm: f32,
    /// Signed angle from the Y axis, in `(-180, 180]`.
    pub angle_deg: f32,
    pub x_cm: f32,
    pub y_cm: f32,
}

impl BallMeasurement {
    #[inline]
    pub fn distance_m(&self) -> f64 {
        self.distance_cm as f64 / 100.0
    }
}

/// Step/speed triple for the three independently driven channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MotionCommand {
    pub steps_x: i64,
    pub speed_x: u32,
    pub steps_y: i64,
    pub speed_y: u32,
    pub steps_z: i64,
    pub speed_z: u32,
}

impl MotionCommand {
    /// Same step count and speed on every channel.
    pub fn uniform(steps: i64, speed: u32) -> Self {
        Self {
            steps_x: steps,
            speed_x: speed,
            steps_y: steps,
            speed_y: speed,
            steps_z: steps,
            speed_z: speed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrikeCommand {
    pub charge_duration_ms: u32,
}
