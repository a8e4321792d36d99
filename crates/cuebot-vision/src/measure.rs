//! Pixel-to-physical conversion of ball positions.
//!
//! Scale comes from the ball itself: a ball of known diameter spanning
//! `2 * radius_px` pixels fixes the cm-per-pixel ratio at its location, so no
//! separate scale calibration is needed. Angles are measured from the frame's
//! Y axis, positive toward its X axis.

use cuebot_core::{Ball, BallMeasurement, CoordinateFrame};

/// Measure one ball against `frame`.
///
/// Returns `None` for geometry that would otherwise produce NaN: a
/// non-positive radius, a ball centered exactly on the origin, or a
/// zero-length axis.
pub fn measure_ball(
    frame: &CoordinateFrame,
    ball: &Ball,
    ball_diameter_cm: f32,
) -> Option<BallMeasurement> {
    if ball.is_degenerate() {
        return None;
    }
    let v = ball.center_px - frame.origin;
    let distance_px = v.norm();
    let axis_len = frame.y_axis.norm();
    let denom = distance_px * axis_len;
    if !(denom > 0.0) || !denom.is_finite() {
        return None;
    }

    let px_to_cm = ball_diameter_cm / (2.0 * ball.radius_px);
    let distance_cm = distance_px * px_to_cm;

    let cos_angle = (v.dot(&frame.y_axis) / denom).clamp(-1.0, 1.0);
    let angle = cos_angle.acos().to_degrees();
    let cross_z = frame.y_axis.x * v.y - frame.y_axis.y * v.x;
    let mut angle_deg = if cross_z < 0.0 { -angle } else { angle };
    if angle_deg <= -180.0 {
        angle_deg = 180.0;
    }

    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    Some(BallMeasurement {
        center_px: ball.center_px,
        radius_px: ball.radius_px,
        distance_cm,
        angle_deg,
        x_cm: distance_cm * sin_a,
        y_cm: distance_cm * cos_a,
    })
}

/// Measure every ball, keeping input order and skipping degenerate ones.
pub fn measure_balls(
    frame: &CoordinateFrame,
    balls: &[Ball],
    ball_diameter_cm: f32,
) -> Vec<BallMeasurement> {
    balls
        .iter()
        .filter_map(|b| measure_ball(frame, b, ball_diameter_cm))
        .collect()
}
