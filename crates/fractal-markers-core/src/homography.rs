//! Planar homographies: exact 4-point solve and least-squares DLT.

use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Projective transform `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    /// Map a point set through the transform.
    pub fn apply_all(&self, pts: &[Point2<f32>]) -> Vec<Point2<f32>> {
        pts.iter().map(|&p| self.apply(p)).collect()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Hartley normalization: translate to the centroid and scale so the mean
/// distance from it is sqrt(2).
fn normalize_points(pts: &[Point2<f32>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = pts
        .iter()
        .map(|p| {
            let dx = p.x as f64 - cx;
            let dy = p.y as f64 - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts
        .iter()
        .map(|p| {
            let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
            Point2::new(v[0], v[1])
        })
        .collect();
    (out, t)
}

/// `H = T_dst^-1 * Hn * T_src`, scaled so `H[2,2] == 1`.
fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Homography> {
    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / s))
}

/// Exact homography from four correspondences. Corner order must match
/// between `src` and `dst`.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns [h11 h12 h13 h21 h22 h23 h31 h32], h33 = 1.
    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );
    denormalize(hn, t_src, t_dst)
}

/// Least-squares homography `dst ~ H * src` from N >= 4 correspondences.
///
/// Four points use the exact solver; more points use the normalized DLT
/// (smallest right singular vector).
pub fn estimate_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    if let (Ok(s4), Ok(d4)) = (
        <&[Point2<f32>; 4]>::try_from(src),
        <&[Point2<f32>; 4]>::try_from(dst),
    ) {
        return homography_from_4pt(s4, d4);
    }

    let (s, ts) = normalize_points(src);
    let (d, td) = normalize_points(dst);

    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for k in 0..n {
        let (x, y) = (s[k].x, s[k].y);
        let (u, v) = (d[k].x, d[k].y);

        // [ -x -y -1   0  0  0   u*x u*y u ]
        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        // [ 0  0  0  -x -y -1   v*x v*y v ]
        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let vt = svd.v_t?;
    let (_, last) = svd
        .singular_values
        .iter()
        .enumerate()
        .fold((f64::INFINITY, 0), |(best, bi), (i, &sv)| {
            if sv < best {
                (sv, i)
            } else {
                (best, bi)
            }
        });
    let h = vt.row(last);
    let hn = Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
    denormalize(hn, ts, td)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({:.5},{:.5}) ~ ({:.5},{:.5})",
            a.x,
            a.y,
            b.x,
            b.y
        );
    }

    fn ground_truth() -> Homography {
        Homography::new(Matrix3::new(
            120.0, 8.0, 320.0, //
            -5.0, -110.0, 240.0, //
            0.02, 0.01, 1.0,
        ))
    }

    #[test]
    fn unit_square_maps_onto_quad() {
        let unit = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let quad = [
            Point2::new(10.0_f32, 12.0),
            Point2::new(110.0, 20.0),
            Point2::new(105.0, 118.0),
            Point2::new(6.0, 100.0),
        ];
        let h = homography_from_4pt(&unit, &quad).expect("solvable");
        for (u, q) in unit.iter().zip(quad.iter()) {
            assert_close(h.apply(*u), *q, 1e-3);
        }
        let inv = h.inverse().expect("invertible");
        assert_close(inv.apply(h.apply(Point2::new(0.3, 0.7))), Point2::new(0.3, 0.7), 1e-4);
    }

    #[test]
    fn least_squares_recovers_model_to_image_map() {
        let gt = ground_truth();
        let model: Vec<Point2<f32>> = (-2..=2)
            .flat_map(|y| (-2..=2).map(move |x| Point2::new(x as f32 * 0.4, y as f32 * 0.4)))
            .collect();
        let img = gt.apply_all(&model);
        let est = estimate_homography(&model, &img).expect("estimate");
        for p in [Point2::new(0.0_f32, 0.0), Point2::new(0.9, -0.3)] {
            assert_close(est.apply(p), gt.apply(p), 1e-2);
        }
    }

    #[test]
    fn degenerate_or_mismatched_input_fails() {
        let a = [Point2::new(0.0_f32, 0.0); 4];
        assert!(estimate_homography(&a, &a[..3]).is_none());
        assert!(homography_from_4pt(&a, &a).is_none());
    }
}
