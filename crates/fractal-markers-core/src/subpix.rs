//! Iterative gradient-orthogonality corner refinement.
//!
//! For a corner `q`, every image gradient `g(p)` sampled near it is
//! orthogonal to `p - q`. Each iteration solves the 2×2 normal equations
//! `Σ w g gᵀ · q = Σ w g gᵀ · p` over a square window and moves `q` to the
//! solution, stopping when the step drops below `epsilon` or after
//! `max_iters` iterations.

use crate::{sample_bilinear, GrayImageView};
use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubpixParams {
    /// Window half size in pixels; the window spans `2 * half_window + 1`.
    pub half_window: u32,
    pub max_iters: u32,
    /// Stop once a step is shorter than this many pixels.
    pub epsilon: f32,
}

impl Default for SubpixParams {
    fn default() -> Self {
        Self {
            half_window: 4,
            max_iters: 12,
            epsilon: 0.005,
        }
    }
}

/// Refine every point of `points` in place.
///
/// Points whose solve is singular, or that would leave their search window,
/// keep their input position.
pub fn refine_corners_subpix(
    src: &GrayImageView<'_>,
    points: &mut [Point2<f32>],
    params: &SubpixParams,
) {
    let weights = window_weights(params.half_window as i32);
    for p in points.iter_mut() {
        if let Some(r) = refine_one(src, *p, params, &weights) {
            *p = r;
        }
    }
}

fn window_weights(half: i32) -> Vec<f32> {
    let side = (2 * half + 1) as usize;
    let denom = (half.max(1) * half.max(1)) as f32;
    let mut w = Vec::with_capacity(side * side);
    for dy in -half..=half {
        for dx in -half..=half {
            let ex = (dx * dx) as f32 / denom;
            let ey = (dy * dy) as f32 / denom;
            w.push((-ex).exp() * (-ey).exp());
        }
    }
    w
}

fn refine_one(
    src: &GrayImageView<'_>,
    start: Point2<f32>,
    params: &SubpixParams,
    weights: &[f32],
) -> Option<Point2<f32>> {
    let half = params.half_window as i32;
    let eps_sq = params.epsilon * params.epsilon;
    let mut q = start;

    for _ in 0..params.max_iters.max(1) {
        let mut a = Matrix2::<f32>::zeros();
        let mut b = Vector2::<f32>::zeros();
        let mut k = 0;
        for dy in -half..=half {
            for dx in -half..=half {
                let px = q.x + dx as f32;
                let py = q.y + dy as f32;
                let gx = 0.5 * (sample_bilinear(src, px + 1.0, py) - sample_bilinear(src, px - 1.0, py));
                let gy = 0.5 * (sample_bilinear(src, px, py + 1.0) - sample_bilinear(src, px, py - 1.0));
                let w = weights[k];
                k += 1;

                let gxx = w * gx * gx;
                let gxy = w * gx * gy;
                let gyy = w * gy * gy;
                a[(0, 0)] += gxx;
                a[(0, 1)] += gxy;
                a[(1, 0)] += gxy;
                a[(1, 1)] += gyy;
                b[0] += gxx * px + gxy * py;
                b[1] += gxy * px + gyy * py;
            }
        }

        let next = a.try_inverse().map(|inv| inv * b)?;
        let next = Point2::new(next[0], next[1]);
        let step = (next - q).norm_squared();
        q = next;
        if step <= eps_sq {
            break;
        }
    }

    let moved = q - start;
    if !q.x.is_finite()
        || !q.y.is_finite()
        || moved.x.abs() > half as f32
        || moved.y.abs() > half as f32
    {
        return None;
    }
    Some(q)
}
