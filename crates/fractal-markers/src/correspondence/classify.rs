use crate::CornerClass;
use fractal_markers_core::GrayImageView;
use nalgebra::Point2;

/// Class of the window of radius `radius` centred on `p`.
///
/// With `size_norm`, `p` is a model-space point in `[-size/2, size/2]` and is
/// first mapped onto the image (y up). Windows that leave the image are
/// unclassified.
pub fn classify_keypoint(
    image: &GrayImageView<'_>,
    p: Point2<f32>,
    radius: usize,
    flat_range: u8,
    size_norm: Option<f32>,
) -> Option<CornerClass> {
    let (mut x, mut y) = (p.x, p.y);
    if let Some(s) = size_norm.filter(|&s| s > 0.0) {
        x = image.width as f32 * (x / s + 0.5);
        y = image.height as f32 * (-y / s + 0.5);
    }
    let cx = (x + 0.5).floor() as i64;
    let cy = (y + 0.5).floor() as i64;
    let r = radius as i64;
    if cx - r < 0 || cy - r < 0 || cx + r >= image.width as i64 || cy + r >= image.height as i64 {
        return None;
    }

    let side = 2 * radius + 1;
    let (x0, y0) = ((cx - r) as usize, (cy - r) as usize);
    let window: Vec<u8> = (0..side)
        .flat_map(|dy| (0..side).map(move |dx| (dx, dy)))
        .map(|(dx, dy)| image.at(x0 + dx, y0 + dy))
        .collect();
    classify_window(&window, side, flat_range)
}

/// Class of a square `side × side` intensity window.
///
/// Low-contrast windows are `Light`. Otherwise the window is split at its
/// mid-range and the 4-connected regions of both phases are counted: two
/// regions give `Light` when the bright phase covers more than half the
/// window and `Dark` otherwise, more give `Saddle`.
pub fn classify_window(window: &[u8], side: usize, flat_range: u8) -> Option<CornerClass> {
    let (min, max) = window
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max.saturating_sub(min) < flat_range {
        return Some(CornerClass::Light);
    }

    let mid = (max as f32 + min as f32) / 2.0;
    let bright: Vec<bool> = window.iter().map(|&v| v as f32 > mid).collect();
    let bright_count = bright.iter().filter(|&&b| b).count();

    match count_regions(&bright, side) {
        2 if bright_count > window.len() - bright_count => Some(CornerClass::Light),
        2 => Some(CornerClass::Dark),
        n if n > 2 => Some(CornerClass::Saddle),
        _ => None,
    }
}

/// Number of 4-connected same-valued regions, raster-order union-find.
fn count_regions(cells: &[bool], side: usize) -> usize {
    let mut uf = UnionFind::new(cells.len());
    for y in 0..side {
        for x in 0..side {
            let i = y * side + x;
            if x > 0 && cells[i - 1] == cells[i] {
                uf.union(i - 1, i);
            }
            if y > 0 && cells[i - side] == cells[i] {
                uf.union(i - side, i);
            }
        }
    }
    (0..cells.len()).filter(|&i| uf.find(i) == i).count()
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
