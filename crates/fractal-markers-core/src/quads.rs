//! Convex quadrilateral candidates from a binary image.

use crate::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;

/// A convex 4-gon approximated from one contour, in contour order.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadCandidate {
    pub corners: [Point2<f32>; 4],
    /// Number of pixels on the source contour.
    pub contour_len: usize,
}

/// Trace every contour of `binary` (non-zero = foreground), keep those with
/// at least `min_contour_len` points whose Douglas–Peucker approximation
/// (epsilon `eps_frac * len`) is a convex quadrilateral.
pub fn find_quad_candidates(
    binary: &GrayImage,
    min_contour_len: usize,
    eps_frac: f64,
) -> Vec<QuadCandidate> {
    let luma = binary.view().to_luma();
    let contours = find_contours::<i32>(&luma);

    let mut out = Vec::new();
    for contour in &contours {
        let len = contour.points.len();
        if len < min_contour_len.max(3) {
            continue;
        }
        let eps = len as f64 * eps_frac;
        let approx = approximate_polygon_dp(&contour.points, eps, true);
        let Some(corners) = as_quad(&approx, eps as f32) else {
            continue;
        };
        if !is_convex(&corners) {
            continue;
        }
        out.push(QuadCandidate {
            corners,
            contour_len: len,
        });
    }

    log::trace!(
        "quad candidates: {} of {} contours",
        out.len(),
        contours.len()
    );
    out
}

fn as_quad(poly: &[Point<i32>], eps: f32) -> Option<[Point2<f32>; 4]> {
    let mut pts: Vec<Point2<f32>> = poly
        .iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect();
    drop_redundant_vertices(&mut pts, eps);
    if pts.len() != 4 {
        return None;
    }
    Some([pts[0], pts[1], pts[2], pts[3]])
}

/// Close an open Douglas–Peucker result: the contour start is always kept by
/// the approximation even when it sits next to the end point or on an edge,
/// so drop vertices closer than `eps` to the chord of their cyclic neighbours.
fn drop_redundant_vertices(pts: &mut Vec<Point2<f32>>, eps: f32) {
    let mut changed = true;
    while changed && pts.len() > 3 {
        changed = false;
        for i in 0..pts.len() {
            let n = pts.len();
            let prev = pts[(i + n - 1) % n];
            let next = pts[(i + 1) % n];
            if (pts[i] - prev).norm() < 1.0 || point_line_distance(pts[i], prev, next) < eps {
                pts.remove(i);
                changed = true;
                break;
            }
        }
    }
}

fn point_line_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len = ab.norm();
    if len < f32::EPSILON {
        return (p - a).norm();
    }
    ((p - a).x * ab.y - (p - a).y * ab.x).abs() / len
}

/// Strict convexity: all consecutive edge cross products share one sign.
pub fn is_convex(q: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = q[i];
        let b = q[(i + 1) % 4];
        let c = q[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
