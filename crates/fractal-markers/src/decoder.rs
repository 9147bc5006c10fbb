//! Candidate quad → marker id decoding.

use crate::MarkerModelSet;
use fractal_markers_core::{homography_from_4pt, sample_bit_intensity, GrayImageView, Homography};
use nalgebra::Point2;

/// A candidate that decoded to a model.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedCandidate {
    pub id: i32,
    /// Clockwise quarter turns applied to the sampled grid before it matched.
    pub rotation: u8,
    /// Candidate corners rotated into model corner order.
    pub corners: [Point2<f32>; 4],
}

/// Decodes quadrilateral candidates against every bit-count bucket of a set.
pub struct CandidateDecoder<'a> {
    set: &'a MarkerModelSet,
}

impl<'a> CandidateDecoder<'a> {
    pub fn new(set: &'a MarkerModelSet) -> Self {
        Self { set }
    }

    /// Try every bit-count bucket; each bucket yields at most one match.
    ///
    /// `corners` must already be orientation-normalized.
    pub fn decode(
        &self,
        image: &GrayImageView<'_>,
        corners: &[Point2<f32>; 4],
    ) -> Vec<DecodedCandidate> {
        let Some(h) = homography_from_4pt(&UNIT_SQUARE, corners) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (&bit_count, ids) in self.set.bit_count_index() {
            let n = (bit_count as f64).sqrt().round() as usize;
            let grid = sample_bit_grid(image, &h, n + 2);
            let Some((id, rotation)) = decode_bits(self.set, &grid, n, ids) else {
                continue;
            };
            let mut corners = *corners;
            corners.rotate_right(rotation as usize);
            log::trace!("candidate decoded as marker {id} (rotation {rotation})");
            out.push(DecodedCandidate {
                id,
                rotation,
                corners,
            });
        }
        out
    }
}

const UNIT_SQUARE: [Point2<f32>; 4] = [
    Point2::new(0.0, 0.0),
    Point2::new(1.0, 0.0),
    Point2::new(1.0, 1.0),
    Point2::new(0.0, 1.0),
];

/// Sample a `side × side` grid at cell centres of the unit square mapped
/// through `h`, binarized against the grid mean (`v > mean → 1`).
pub fn sample_bit_grid(image: &GrayImageView<'_>, h: &Homography, side: usize) -> Vec<u8> {
    let mut values = Vec::with_capacity(side * side);
    for r in 0..side {
        for c in 0..side {
            let u = (c as f32 + 0.5) / side as f32;
            let v = (r as f32 + 0.5) / side as f32;
            let p = h.apply(Point2::new(u, v));
            let intensity = sample_bit_intensity(image, p.x, p.y);
            values.push((intensity + 0.5).clamp(0.0, 255.0) as u8);
        }
    }

    let mean = values.iter().map(|&v| v as f32).sum::<f32>() / values.len().max(1) as f32;
    values
        .into_iter()
        .map(|v| u8::from(v as f32 > mean))
        .collect()
}

/// Match a bordered `(n + 2)²` grid against the models in `ids`.
///
/// Returns `(id, rotation)` for the first exact masked match, trying ids in
/// the given order for each of the four clockwise rotations.
pub fn decode_bits(
    set: &MarkerModelSet,
    grid: &[u8],
    n: usize,
    ids: &[i32],
) -> Option<(i32, u8)> {
    let side = n + 2;
    if grid.len() != side * side {
        return None;
    }
    let border_is_black = (0..side).all(|i| {
        grid[i] == 0
            && grid[(side - 1) * side + i] == 0
            && grid[i * side] == 0
            && grid[i * side + side - 1] == 0
    });
    if !border_is_black {
        return None;
    }

    let mut inner: Vec<u8> = (0..n)
        .flat_map(|r| grid[(r + 1) * side + 1..(r + 1) * side + 1 + n].iter().copied())
        .collect();

    for rotation in 0..4u8 {
        for &id in ids {
            let Some(model) = set.get(id) else { continue };
            if model.grid_size() != n {
                continue;
            }
            let matches = inner
                .iter()
                .zip(model.bits())
                .zip(model.mask())
                .all(|((&seen, &bit), &keep)| keep == 0 || seen == bit);
            if matches {
                return Some((id, rotation));
            }
        }
        inner = rotate_cw(&inner, n);
    }
    None
}

/// Quarter turn clockwise: `out[i][j] = in[n - 1 - j][i]`.
pub fn rotate_cw(grid: &[u8], n: usize) -> Vec<u8> {
    let mut out = vec![0; n * n];
    for i in 0..n {
        for j in 0..n {
            out[i * n + j] = grid[(n - 1 - j) * n + i];
        }
    }
    out
}
