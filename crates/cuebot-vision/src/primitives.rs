//! Pixel-level building blocks shared by every detector.
//!
//! Thin adapters over `imageproc` (morphology, contour tracing, rotated
//! rectangles, polygon simplification, polygon filling) plus the pieces it does
//! not ship: HSV segmentation, polygon moments and the minimal enclosing
//! circle. Every function is pure; masks are `GrayImage`s holding 0 or 255.

use cuebot_core::HsvRange;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull, min_area_rect};
use imageproc::point::Point;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

pub const MASK_ON: u8 = 255;

/// Closed pixel outline of one connected blob, in tracing order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub points: Vec<Point<i32>>,
}

impl Region {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Polygon area enclosed by the outline (shoelace, unsigned).
    pub fn area(&self) -> f64 {
        signed_area(&self.points).abs()
    }

    /// Outline perimeter, treating the contour as closed.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    #[inline]
    pub fn centroid(&self) -> Option<Point2<f32>> {
        moment_centroid(&self.points)
    }

    #[inline]
    pub fn enclosing_circle(&self) -> Option<Circle> {
        min_enclosing_circle(&self.points)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2<f32>,
    pub radius: f32,
}

/// Select pixels whose HSV value lies in `range`.
pub fn segment(frame: &RgbImage, range: &HsvRange) -> GrayImage {
    let mut mask = GrayImage::new(frame.width(), frame.height());
    for (x, y, px) in frame.enumerate_pixels() {
        if range.contains_rgb(px.0) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }
    mask
}

/// [`segment`] restricted to the non-zero pixels of `region_mask`.
pub fn segment_within(frame: &RgbImage, range: &HsvRange, region_mask: &GrayImage) -> GrayImage {
    mask_and(&segment(frame, range), region_mask)
}

/// Pixel-wise AND of two equally sized masks.
pub fn mask_and(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = GrayImage::new(a.width(), a.height());
    for (o, (pa, pb)) in out.pixels_mut().zip(a.pixels().zip(b.pixels())) {
        if pa[0] != 0 && pb[0] != 0 {
            o[0] = MASK_ON;
        }
    }
    out
}

/// Dilate then erode with a `(2r+1)x(2r+1)` square element.
pub fn morph_close(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::close(mask, Norm::LInf, radius)
}

/// Erode then dilate with a `(2r+1)x(2r+1)` square element.
pub fn morph_open(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::open(mask, Norm::LInf, radius)
}

/// Outer contours that are not nested inside another blob.
///
/// Order is the tracing order of `imageproc` (raster scan of the first
/// boundary pixel), not sorted by size or position.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Region::new(c.points))
        .collect()
}

/// Largest region by enclosed area; the first one wins ties.
pub fn largest_by_area(regions: Vec<Region>) -> Option<Region> {
    let mut best: Option<(f64, Region)> = None;
    for region in regions {
        let area = region.area();
        if best.as_ref().map(|(a, _)| area > *a).unwrap_or(true) {
            best = Some((area, region));
        }
    }
    best.map(|(_, region)| region)
}

/// Minimum-area rotated rectangle around a region.
///
/// Outlines with fewer than three points have no rotated hull; their
/// axis-aligned box is returned instead.
pub fn bounding_quadrilateral(region: &Region) -> Option<[Point2<f32>; 4]> {
    let pts = &region.points;
    if pts.is_empty() {
        return None;
    }
    if pts.len() >= 3 {
        let rect = min_area_rect(pts);
        return Some(rect.map(to_point2));
    }
    let (x0, x1) = min_max(pts.iter().map(|p| p.x));
    let (y0, y1) = min_max(pts.iter().map(|p| p.y));
    Some([
        Point2::new(x0 as f32, y0 as f32),
        Point2::new(x1 as f32, y0 as f32),
        Point2::new(x1 as f32, y1 as f32),
        Point2::new(x0 as f32, y1 as f32),
    ])
}

/// Douglas-Peucker simplification with tolerance `epsilon_frac * perimeter`.
pub fn simplify_polygon(region: &Region, epsilon_frac: f64) -> Vec<Point2<f32>> {
    let epsilon = epsilon_frac * region.perimeter();
    if region.points.len() < 3 || !(epsilon > 0.0) {
        return region.points.iter().copied().map(to_point2).collect();
    }
    let mut simplified = approximate_polygon_dp(&region.points, epsilon, true);
    while simplified.len() > 1 && simplified.first() == simplified.last() {
        simplified.pop();
    }
    simplified.into_iter().map(to_point2).collect()
}

/// Area-weighted centroid from the polygon moments of an outline.
///
/// `cx = m10 / m00`, `cy = m01 / m00`; `None` when `m00 == 0` (points,
/// segments and other zero-area outlines).
pub fn moment_centroid(points: &[Point<i32>]) -> Option<Point2<f32>> {
    if points.len() < 3 {
        return None;
    }
    let mut a00 = 0.0f64;
    let mut a10 = 0.0f64;
    let mut a01 = 0.0f64;
    let mut prev = points[points.len() - 1];
    for &p in points {
        let (xp, yp) = (prev.x as f64, prev.y as f64);
        let (x, y) = (p.x as f64, p.y as f64);
        let cross = xp * y - x * yp;
        a00 += cross;
        a10 += cross * (xp + x);
        a01 += cross * (yp + y);
        prev = p;
    }
    if a00 == 0.0 {
        return None;
    }
    // m00 = a00 / 2, m10 = a10 / 6, m01 = a01 / 6
    let cx = a10 / (3.0 * a00);
    let cy = a01 / (3.0 * a00);
    Some(Point2::new(cx as f32, cy as f32))
}

/// Smallest circle containing every point.
///
/// Runs the incremental (Welzl-style) construction on the convex hull, which
/// has the same enclosing circle and far fewer points than a traced contour.
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Option<Circle> {
    if points.is_empty() {
        return None;
    }
    let hull: Vec<[f64; 2]> = if points.len() >= 3 {
        convex_hull(points)
            .into_iter()
            .map(|p| [p.x as f64, p.y as f64])
            .collect()
    } else {
        points.iter().map(|p| [p.x as f64, p.y as f64]).collect()
    };
    if hull.is_empty() {
        return None;
    }

    let mut c = CircleF64::point(hull[0]);
    for i in 1..hull.len() {
        if c.contains(hull[i]) {
            continue;
        }
        c = CircleF64::point(hull[i]);
        for j in 0..i {
            if c.contains(hull[j]) {
                continue;
            }
            c = CircleF64::diameter(hull[i], hull[j]);
            for k in 0..j {
                if !c.contains(hull[k]) {
                    c = CircleF64::through(hull[i], hull[j], hull[k]);
                }
            }
        }
    }

    Some(Circle {
        center: Point2::new(c.center[0] as f32, c.center[1] as f32),
        radius: c.radius as f32,
    })
}

/// Rasterize a closed polygon (interior and boundary) into a fresh mask.
pub fn fill_polygon_mask(width: u32, height: u32, polygon: &[Point2<f32>]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let mut poly: Vec<Point<i32>> = polygon
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    poly.dedup();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    match poly.len() {
        0 => {}
        1 | 2 => {
            let a = poly[0];
            let b = poly[poly.len() - 1];
            draw_line_segment_mut(
                &mut mask,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                Luma([MASK_ON]),
            );
        }
        _ => draw_polygon_mut(&mut mask, &poly, Luma([MASK_ON])),
    }
    mask
}

/// Filled mask of a traced region.
pub fn region_mask(width: u32, height: u32, region: &Region) -> GrayImage {
    let outline: Vec<Point2<f32>> = region.points.iter().copied().map(to_point2).collect();
    fill_polygon_mask(width, height, &outline)
}

/// Every external region of `range`, optionally restricted to a mask.
///
/// General-purpose helper for color ranges the measurement pipeline does not
/// consume (e.g. the auxiliary robot range).
pub fn detect_regions(
    frame: &RgbImage,
    range: &HsvRange,
    region_mask: Option<&GrayImage>,
) -> Vec<Region> {
    let mask = match region_mask {
        Some(m) => segment_within(frame, range, m),
        None => segment(frame, range),
    };
    find_external_contours(&mask)
}

fn signed_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    let mut prev = points[points.len() - 1];
    for &p in points {
        acc += prev.x as f64 * p.y as f64 - p.x as f64 * prev.y as f64;
        prev = p;
    }
    0.5 * acc
}

fn min_max(values: impl Iterator<Item = i32>) -> (i32, i32) {
    values.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

#[inline]
fn to_point2(p: Point<i32>) -> Point2<f32> {
    Point2::new(p.x as f32, p.y as f32)
}

#[derive(Clone, Copy, Debug)]
struct CircleF64 {
    center: [f64; 2],
    radius: f64,
}

impl CircleF64 {
    const EPS: f64 = 1e-7;

    fn point(p: [f64; 2]) -> Self {
        Self {
            center: p,
            radius: 0.0,
        }
    }

    fn diameter(a: [f64; 2], b: [f64; 2]) -> Self {
        let center = [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])];
        Self {
            center,
            radius: dist(center, a),
        }
    }

    /// Circumcircle of three points; collinear triples fall back to the
    /// widest pair.
    fn through(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Self {
        let (bx, by) = (b[0] - a[0], b[1] - a[1]);
        let (cx, cy) = (c[0] - a[0], c[1] - a[1]);
        let d = 2.0 * (bx * cy - by * cx);
        if d.abs() < 1e-12 {
            let pairs = [
                Self::diameter(a, b),
                Self::diameter(a, c),
                Self::diameter(b, c),
            ];
            return pairs
                .into_iter()
                .fold(Self::point(a), |best, p| if p.radius > best.radius { p } else { best });
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        let center = [a[0] + ux, a[1] + uy];
        Self {
            center,
            radius: (ux * ux + uy * uy).sqrt(),
        }
    }

    #[inline]
    fn contains(&self, p: [f64; 2]) -> bool {
        dist(self.center, p) <= self.radius + Self::EPS
    }
}

#[inline]
fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn square(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]
    }

    #[test]
    fn square_moments_and_area() {
        let region = Region::new(square(10, 20, 10));
        assert_abs_diff_eq!(region.area(), 100.0);
        let c = region.centroid().expect("centroid");
        assert_abs_diff_eq!(c.x, 15.0);
        assert_abs_diff_eq!(c.y, 25.0);
    }

    #[test]
    fn centroid_is_orientation_independent() {
        let mut pts = square(0, 0, 4);
        pts.reverse();
        let c = moment_centroid(&pts).expect("centroid");
        assert_abs_diff_eq!(c.x, 2.0);
        assert_abs_diff_eq!(c.y, 2.0);
    }

    #[test]
    fn zero_area_outline_has_no_centroid() {
        assert!(moment_centroid(&[Point::new(3, 3)]).is_none());
        let line = [Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)];
        assert!(moment_centroid(&line).is_none());
    }

    #[test]
    fn enclosing_circle_of_square_corners() {
        let c = min_enclosing_circle(&square(0, 0, 2)).expect("circle");
        assert_abs_diff_eq!(c.center.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.center.y, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.radius, 2f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn enclosing_circle_of_obtuse_triangle_uses_longest_side() {
        let pts = [Point::new(0, 0), Point::new(10, 0), Point::new(5, 1)];
        let c = min_enclosing_circle(&pts).expect("circle");
        assert_abs_diff_eq!(c.center.x, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.center.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.radius, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn single_pixel_region_has_zero_radius() {
        let c = min_enclosing_circle(&[Point::new(7, 9)]).expect("circle");
        assert_eq!(c.radius, 0.0);
        assert_eq!(c.center, Point2::new(7.0, 9.0));
    }

    #[test]
    fn contours_of_drawn_disk() {
        let mut mask = GrayImage::new(80, 80);
        draw_filled_circle_mut(&mut mask, (40, 30), 10, Luma([MASK_ON]));
        let regions = find_external_contours(&mask);
        assert_eq!(regions.len(), 1);
        let circle = regions[0].enclosing_circle().expect("circle");
        assert_abs_diff_eq!(circle.center.x, 40.0, epsilon = 0.5);
        assert_abs_diff_eq!(circle.center.y, 30.0, epsilon = 0.5);
        assert_abs_diff_eq!(circle.radius, 10.0, epsilon = 0.6);
        let centroid = regions[0].centroid().expect("centroid");
        assert_abs_diff_eq!(centroid.x, 40.0, epsilon = 0.5);
        assert_abs_diff_eq!(centroid.y, 30.0, epsilon = 0.5);
    }

    #[test]
    fn nested_blobs_are_not_external() {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(50, 50), Luma([MASK_ON]));
        draw_filled_rect_mut(&mut mask, Rect::at(15, 15).of_size(30, 30), Luma([0]));
        draw_filled_rect_mut(&mut mask, Rect::at(25, 25).of_size(10, 10), Luma([MASK_ON]));
        let regions = find_external_contours(&mask);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].area() > 2000.0);
    }

    #[test]
    fn largest_by_area_picks_biggest_and_handles_empty() {
        assert!(largest_by_area(Vec::new()).is_none());
        let small = Region::new(square(0, 0, 2));
        let big = Region::new(square(10, 10, 8));
        let best = largest_by_area(vec![small, big.clone()]).expect("largest");
        assert_eq!(best, big);
    }

    #[test]
    fn close_fills_pinholes_and_open_drops_speckle() {
        let mut mask = GrayImage::new(50, 50);
        draw_filled_rect_mut(&mut mask, Rect::at(15, 15).of_size(20, 20), Luma([MASK_ON]));
        mask.put_pixel(25, 25, Luma([0]));
        mask.put_pixel(3, 3, Luma([MASK_ON]));
        let cleaned = morph_open(&morph_close(&mask, 2), 2);
        assert_eq!(cleaned.get_pixel(25, 25)[0], MASK_ON);
        assert_eq!(cleaned.get_pixel(3, 3)[0], 0);
    }

    #[test]
    fn polygon_fill_covers_interior() {
        let quad = [
            Point2::new(10.0, 10.0),
            Point2::new(30.0, 10.0),
            Point2::new(30.0, 30.0),
            Point2::new(10.0, 30.0),
        ];
        let mask = fill_polygon_mask(40, 40, &quad);
        assert_eq!(mask.get_pixel(20, 20)[0], MASK_ON);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(35, 20)[0], 0);
    }

    #[test]
    fn polygon_fill_tolerates_closed_and_degenerate_input() {
        let closed = [
            Point2::new(2.0, 2.0),
            Point2::new(8.0, 2.0),
            Point2::new(8.0, 8.0),
            Point2::new(2.0, 2.0),
        ];
        let mask = fill_polygon_mask(10, 10, &closed);
        assert_eq!(mask.get_pixel(7, 4)[0], MASK_ON);
        let empty = fill_polygon_mask(10, 10, &[]);
        assert!(empty.pixels().all(|p| p[0] == 0));
        let dot = fill_polygon_mask(10, 10, &[Point2::new(4.0, 4.0)]);
        assert_eq!(dot.get_pixel(4, 4)[0], MASK_ON);
    }

    #[test]
    fn bounding_quad_of_axis_aligned_rect() {
        let region = Region::new(square(4, 6, 10));
        let quad = bounding_quadrilateral(&region).expect("quad");
        let xs: Vec<f32> = quad.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = quad.iter().map(|p| p.y).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 4.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 14.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 6.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 16.0);
    }

    #[test]
    fn simplify_keeps_rectangle_corners() {
        let mut pts = Vec::new();
        for x in 0..=20 {
            pts.push(Point::new(x, 0));
        }
        for y in 1..=10 {
            pts.push(Point::new(20, y));
        }
        for x in (0..20).rev() {
            pts.push(Point::new(x, 10));
        }
        for y in (1..10).rev() {
            pts.push(Point::new(0, y));
        }
        let n = pts.len();
        let simplified = simplify_polygon(&Region::new(pts), 0.01);
        assert!(simplified.len() < n / 4, "got {simplified:?}");
        for corner in [(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)] {
            assert!(
                simplified.contains(&Point2::new(corner.0, corner.1)),
                "missing corner {corner:?} in {simplified:?}"
            );
        }
    }

    #[test]
    fn segmentation_selects_only_range() {
        let mut frame = RgbImage::new(4, 1);
        frame.put_pixel(0, 0, image::Rgb([0, 255, 0]));
        frame.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        frame.put_pixel(2, 0, image::Rgb([0, 200, 0]));
        let green = HsvRange::new([50, 100, 100], [70, 255, 255]);
        let mask = segment(&frame, &green);
        let bits: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        assert_eq!(bits, vec![MASK_ON, 0, MASK_ON, 0]);

        let mut region = GrayImage::new(4, 1);
        region.put_pixel(2, 0, Luma([MASK_ON]));
        let within = segment_within(&frame, &green, &region);
        let bits: Vec<u8> = within.pixels().map(|p| p[0]).collect();
        assert_eq!(bits, vec![0, 0, MASK_ON, 0]);
    }

    #[test]
    fn detect_regions_finds_every_blob_optionally_masked() {
        let aux = HsvRange::new([145, 0, 30], [179, 100, 255]);
        let tint = image::Rgb([200, 150, 180]);
        let mut frame = RgbImage::from_pixel(60, 40, image::Rgb([20, 20, 20]));
        draw_filled_rect_mut(&mut frame, Rect::at(5, 5).of_size(10, 10), tint);
        draw_filled_rect_mut(&mut frame, Rect::at(40, 20).of_size(12, 8), tint);

        assert_eq!(detect_regions(&frame, &aux, None).len(), 2);

        let mut left = GrayImage::new(60, 40);
        draw_filled_rect_mut(&mut left, Rect::at(0, 0).of_size(30, 40), Luma([MASK_ON]));
        let found = detect_regions(&frame, &aux, Some(&left));
        assert_eq!(found.len(), 1);
        assert!(found[0].area() > 60.0);
    }
}
