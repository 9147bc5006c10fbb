//! Rasterize markers into grayscale images.
//!
//! Bits equal to 1 are white, 0 black, every marker gets its one-cell black
//! border and masked cells show the nested sub-marker.

use crate::{MarkerModel, MarkerModelSet};
use fractal_markers_core::GrayImage;
use nalgebra::Point2;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Placement of a rendered marker: model units to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderLayout {
    /// Model-space top-left corner of the rendered marker.
    origin: Point2<f32>,
    px_per_unit: f32,
    margin_px: u32,
}

impl RenderLayout {
    /// Pixel-centre image coordinates of a model-space point.
    pub fn to_image(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(
            self.margin_px as f32 + (p.x - self.origin.x) * self.px_per_unit - 0.5,
            self.margin_px as f32 + (self.origin.y - p.y) * self.px_per_unit - 0.5,
        )
    }

    fn to_model(&self, px: usize, py: usize) -> Point2<f32> {
        Point2::new(
            self.origin.x + (px as f32 + 0.5 - self.margin_px as f32) / self.px_per_unit,
            self.origin.y - (py as f32 + 0.5 - self.margin_px as f32) / self.px_per_unit,
        )
    }
}

/// Render the root marker of `set` (and thereby every nested marker) on a
/// white background with `margin_px` pixels around it.
pub fn render_family(set: &MarkerModelSet, px_per_unit: f32, margin_px: u32) -> (GrayImage, RenderLayout) {
    render_marker(set, set.root(), px_per_unit, margin_px)
}

/// Render a single marker of `set` together with its sub-markers.
pub fn render_marker(
    set: &MarkerModelSet,
    model: &MarkerModel,
    px_per_unit: f32,
    margin_px: u32,
) -> (GrayImage, RenderLayout) {
    let c0 = model.corners()[0];
    let layout = RenderLayout {
        origin: Point2::new(c0.x, c0.y),
        px_per_unit,
        margin_px,
    };
    let side_px = (model.side_length() * px_per_unit).round().max(0.0) as usize;
    let size = side_px + 2 * margin_px as usize;

    let mut img = GrayImage::filled(size, size, WHITE);
    for py in 0..size {
        for px in 0..size {
            let p = layout.to_model(px, py);
            if let Some(v) = shade(set, model, p) {
                img.set(px, py, v);
            }
        }
    }
    log::debug!(
        "rendered marker {} at {} px/unit into {}x{}",
        model.id(),
        px_per_unit,
        size,
        size
    );
    (img, layout)
}

/// Intensity of model point `p`, or `None` outside `model`.
fn shade(set: &MarkerModelSet, model: &MarkerModel, p: Point2<f32>) -> Option<u8> {
    let (row, col) = cell_of(model, p)?;
    let n = model.grid_size();
    if row == 0 || col == 0 || row == n + 1 || col == n + 1 {
        return Some(BLACK);
    }
    let (r, c) = (row - 1, col - 1);
    if !model.is_masked(r, c) {
        return Some(if model.bit(r, c) == 1 { WHITE } else { BLACK });
    }
    let nested = model
        .sub_marker_ids()
        .iter()
        .filter_map(|&id| set.get(id))
        .find_map(|sub| shade(set, sub, p));
    Some(nested.unwrap_or(WHITE))
}

/// `(row, col)` in the bordered `(N + 2)²` grid.
fn cell_of(model: &MarkerModel, p: Point2<f32>) -> Option<(usize, usize)> {
    let tl = model.corners()[0];
    let cell = model.cell_size();
    let u = (p.x - tl.x) / cell;
    let v = (tl.y - p.y) / cell;
    let cells = (model.grid_size() + 2) as f32;
    if !(0.0..cells).contains(&u) || !(0.0..cells).contains(&v) {
        return None;
    }
    Some((v as usize, u as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarkerFamily;

    #[test]
    fn rendered_cells_follow_model_bits() {
        let set = MarkerModelSet::from_family(MarkerFamily::Fractal2L6).unwrap();
        // side 2 at 60 px/unit → 120 px, 12 cells of 10 px
        let (img, layout) = render_family(&set, 60.0, 10);
        assert_eq!((img.width, img.height), (140, 140));
        assert_eq!(img.get(2, 2), WHITE);
        assert_eq!(img.get(15, 15), BLACK);

        let root = set.root();
        for r in 0..10 {
            for c in 0..10 {
                if root.is_masked(r, c) {
                    continue;
                }
                let px = 10 + (c + 1) * 10 + 5;
                let py = 10 + (r + 1) * 10 + 5;
                let want = if root.bit(r, c) == 1 { WHITE } else { BLACK };
                assert_eq!(img.get(px, py), want, "cell ({r},{c})");
            }
        }

        let tl = layout.to_image(Point2::new(-1.0, 1.0));
        assert!((tl.x - 9.5).abs() < 1e-4 && (tl.y - 9.5).abs() < 1e-4);
    }

    #[test]
    fn masked_area_shows_the_sub_marker() {
        let set = MarkerModelSet::from_family(MarkerFamily::Fractal2L6).unwrap();
        let (img, _) = render_family(&set, 60.0, 0);
        // sub-marker 1 spans root cells 4..8 (bordered grid) = px 40..80,
        // its own cells are 5 px with a black border
        assert_eq!(img.get(41, 41), BLACK);
        let sub = set.get(1).unwrap();
        for r in 0..6 {
            for c in 0..6 {
                let px = 40 + (c + 1) * 5 + 2;
                let py = 40 + (r + 1) * 5 + 2;
                let want = if sub.bit(r, c) == 1 { WHITE } else { BLACK };
                assert_eq!(img.get(px, py), want, "sub cell ({r},{c})");
            }
        }
    }
}
