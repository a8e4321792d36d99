//! Debug overlay for a processed frame.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use nalgebra::Point2;

use crate::pipeline::FrameAnalysis;

const TABLE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const Y_AXIS_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const X_AXIS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BALL_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const RAY_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Draw the table outline, marker shape, axes and balls over a copy of
/// `frame`. Measured balls also get a line from the origin.
pub fn annotate(frame: &RgbImage, analysis: &FrameAnalysis) -> RgbImage {
    let mut out = frame.clone();

    if let Some(table) = &analysis.table {
        let outline: Vec<Point2<f32>> = table
            .region
            .points
            .iter()
            .map(|p| Point2::new(p.x as f32, p.y as f32))
            .collect();
        draw_closed_polyline(&mut out, &outline, TABLE_COLOR);
    }
    if let Some(marker) = &analysis.marker {
        draw_closed_polyline(&mut out, &marker.outline, MARKER_COLOR);
    }
    if let Some(cf) = &analysis.frame {
        draw_segment(&mut out, cf.origin, cf.y_tip(), Y_AXIS_COLOR);
        draw_segment(&mut out, cf.origin, cf.x_tip(), X_AXIS_COLOR);
        draw_filled_circle_mut(&mut out, to_i32(cf.origin), 3, Y_AXIS_COLOR);
        for m in &analysis.measurements {
            draw_segment(&mut out, cf.origin, m.center_px, RAY_COLOR);
        }
    }
    for ball in &analysis.balls {
        let r = ball.radius_px.round().max(1.0) as i32;
        draw_hollow_circle_mut(&mut out, to_i32(ball.center_px), r, BALL_COLOR);
    }
    out
}

fn draw_closed_polyline(img: &mut RgbImage, points: &[Point2<f32>], color: Rgb<u8>) {
    if points.len() < 2 {
        return;
    }
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_segment(img, a, b, color);
    }
}

fn draw_segment(img: &mut RgbImage, a: Point2<f32>, b: Point2<f32>, color: Rgb<u8>) {
    draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
}

#[inline]
fn to_i32(p: Point2<f32>) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuebot_core::{Ball, CoordinateFrame};

    #[test]
    fn empty_analysis_leaves_frame_untouched() {
        let frame = RgbImage::from_pixel(20, 20, Rgb([7, 7, 7]));
        let out = annotate(&frame, &FrameAnalysis::default());
        assert_eq!(out, frame);
    }

    #[test]
    fn axes_and_balls_are_drawn() {
        let frame = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let analysis = FrameAnalysis {
            frame: CoordinateFrame::from_spots(Point2::new(50.0, 80.0), Point2::new(50.0, 40.0)),
            balls: vec![Ball::new(Point2::new(20.0, 20.0), 6.0)],
            ..Default::default()
        };
        let out = annotate(&frame, &analysis);
        assert_eq!(*out.get_pixel(50, 60), Y_AXIS_COLOR);
        // X axis runs from the origin toward +x for an upward Y axis.
        assert_eq!(*out.get_pixel(70, 80), X_AXIS_COLOR);
        assert_eq!(*out.get_pixel(26, 20), BALL_COLOR);
        assert_eq!(*out.get_pixel(20, 20), Rgb([0, 0, 0]));
    }
}
