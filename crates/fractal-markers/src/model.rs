//! A single fractal marker: bit grid, sub-marker mask and derived keypoints.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Local corner topology shared by model keypoints and image keypoints.
///
/// Codes are stable: `Light = 0`, `Dark = 1`, `Saddle = 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerClass {
    /// One dark quadrant (three of four cells white). Also used for flat
    /// image windows and the outer marker corners.
    Light,
    /// One white quadrant.
    Dark,
    /// Diagonal checker pattern.
    Saddle,
}

impl CornerClass {
    pub fn code(self) -> u8 {
        match self {
            CornerClass::Light => 0,
            CornerClass::Dark => 1,
            CornerClass::Saddle => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CornerClass::Light),
            1 => Some(CornerClass::Dark),
            2 => Some(CornerClass::Saddle),
            _ => None,
        }
    }
}

/// Model-space keypoint (`z = 0`) with its expected class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelKeypoint {
    pub position: Point3<f32>,
    pub class: CornerClass,
}

/// Cell rectangle `[y0, y0 + size) × [x0, x0 + size)` owned by a sub-marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SubRegion {
    pub x0: usize,
    pub y0: usize,
    pub size: usize,
}

/// One marker of a family.
///
/// `bits` and `mask` are `n × n`, row-major, row 0 at the top. Mask cells set
/// to 0 belong to a nested sub-marker and are ignored when decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerModel {
    id: i32,
    n: usize,
    bits: Vec<u8>,
    mask: Vec<u8>,
    corners: [Point3<f32>; 4],
    sub_marker_ids: Vec<i32>,
    keypoints: Vec<ModelKeypoint>,
}

impl MarkerModel {
    /// A model with a full mask and only its four corners as keypoints.
    pub(crate) fn new(
        id: i32,
        n: usize,
        bits: Vec<u8>,
        corners: [Point3<f32>; 4],
        sub_marker_ids: Vec<i32>,
    ) -> Self {
        let keypoints = corners
            .iter()
            .map(|&position| ModelKeypoint {
                position,
                class: CornerClass::Light,
            })
            .collect();
        Self {
            id,
            n,
            mask: vec![1; bits.len()],
            bits,
            corners,
            sub_marker_ids,
            keypoints,
        }
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Bit grid side `N`.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn bit_count(&self) -> usize {
        self.n * self.n
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    #[inline]
    pub fn bit(&self, row: usize, col: usize) -> u8 {
        self.bits[row * self.n + col]
    }

    #[inline]
    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask[row * self.n + col] == 0
    }

    /// Outer corners: top-left, top-right, bottom-right, bottom-left (y up).
    pub fn corners(&self) -> &[Point3<f32>; 4] {
        &self.corners
    }

    /// Outer corners projected onto the marker plane.
    pub fn corners_2d(&self) -> [Point2<f32>; 4] {
        self.corners.map(|c| Point2::new(c.x, c.y))
    }

    pub fn sub_marker_ids(&self) -> &[i32] {
        &self.sub_marker_ids
    }

    /// Outer corners first, then every internal corner.
    pub fn keypoints(&self) -> &[ModelKeypoint] {
        &self.keypoints
    }

    /// Distance between corner 0 and corner 1.
    pub fn side_length(&self) -> f32 {
        (self.corners[1] - self.corners[0]).norm()
    }

    /// Side of one grid cell; the marker spans `N + 2` cells including its border.
    pub fn cell_size(&self) -> f32 {
        self.side_length() / (self.n + 2) as f32
    }

    /// Grid cells covered by `sub`, placed through its corner 0.
    pub(crate) fn sub_region(&self, sub: &MarkerModel) -> Option<SubRegion> {
        let cell = self.cell_size();
        if cell.is_nan() || cell <= 0.0 {
            return None;
        }
        let half = self.n as f32 / 2.0;
        let x0 = (sub.corners[0].x / cell + half).round();
        let y0 = (-sub.corners[0].y / cell + half).round();
        let size = (sub.side_length() / cell).round();
        if x0 < 0.0 || y0 < 0.0 || size < 1.0 {
            return None;
        }
        let (x0, y0, size) = (x0 as usize, y0 as usize, size as usize);
        if x0 + size > self.n || y0 + size > self.n {
            return None;
        }
        Some(SubRegion { x0, y0, size })
    }

    /// Clear the mask over `region`. Returns `false` if any cell was already
    /// cleared, leaving the mask untouched.
    pub(crate) fn mask_region(&mut self, region: SubRegion) -> bool {
        let rows = region.y0..region.y0 + region.size;
        let cols = region.x0..region.x0 + region.size;
        let overlaps = rows
            .clone()
            .any(|r| cols.clone().any(|c| self.is_masked(r, c)));
        if overlaps {
            return false;
        }
        for r in rows {
            for c in cols.clone() {
                self.mask[r * self.n + c] = 0;
            }
        }
        true
    }

    /// Append one keypoint per internal corner of the grid.
    ///
    /// Masked cells count as white and the grid is framed by one black cell,
    /// so a 2×2 window with top-left `(x, y)` spans the corner between inner
    /// cells `x - 1, x` and rows `y - 1, y`.
    pub(crate) fn derive_keypoints(&mut self) {
        self.keypoints.truncate(4);

        let n = self.n;
        let side = n + 2;
        let mut framed = vec![0u8; side * side];
        for r in 0..n {
            for c in 0..n {
                let v = if self.is_masked(r, c) { 1 } else { self.bit(r, c) };
                framed[(r + 1) * side + c + 1] = v;
            }
        }

        let cell = self.cell_size();
        let half = n as f32 / 2.0;
        for y in 0..=n {
            for x in 0..=n {
                let tl = framed[y * side + x];
                let tr = framed[y * side + x + 1];
                let bl = framed[(y + 1) * side + x];
                let br = framed[(y + 1) * side + x + 1];
                let class = match tl + tr + bl + br {
                    1 => CornerClass::Dark,
                    3 => CornerClass::Light,
                    2 if tl == br && tr == bl => CornerClass::Saddle,
                    _ => continue,
                };
                let position = Point3::new(
                    (x as f32 - half) * cell,
                    -(y as f32 - half) * cell,
                    0.0,
                );
                self.keypoints.push(ModelKeypoint { position, class });
            }
        }
    }

    /// Multiply every corner and keypoint coordinate by `factor`.
    pub(crate) fn scale(&mut self, factor: f32) {
        for c in &mut self.corners {
            c.coords *= factor;
        }
        for k in &mut self.keypoints {
            k.position.coords *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f32) -> [Point3<f32>; 4] {
        [
            Point3::new(-half, half, 0.0),
            Point3::new(half, half, 0.0),
            Point3::new(half, -half, 0.0),
            Point3::new(-half, -half, 0.0),
        ]
    }

    #[test]
    fn corner_class_codes_are_stable() {
        for class in [CornerClass::Light, CornerClass::Dark, CornerClass::Saddle] {
            assert_eq!(CornerClass::from_code(class.code()), Some(class));
        }
        assert_eq!(CornerClass::Dark.code(), 1);
        assert_eq!(CornerClass::from_code(3), None);
    }

    #[test]
    fn single_white_cell_has_four_dark_corners() {
        // 1×1 grid, one white cell in a black frame.
        let mut m = MarkerModel::new(0, 1, vec![1], square(1.5), vec![]);
        m.derive_keypoints();
        let inner = &m.keypoints()[4..];
        assert_eq!(inner.len(), 4);
        assert!(inner.iter().all(|k| k.class == CornerClass::Dark));
        // cell = 3 / 3 = 1; corners at (±0.5, ±0.5)
        assert!(inner
            .iter()
            .all(|k| k.position.x.abs() == 0.5 && k.position.y.abs() == 0.5));
    }

    #[test]
    fn checker_centre_is_saddle() {
        let mut m = MarkerModel::new(0, 2, vec![1, 0, 0, 1], square(2.0), vec![]);
        m.derive_keypoints();
        let centre = m
            .keypoints()
            .iter()
            .skip(4)
            .find(|k| k.position.x == 0.0 && k.position.y == 0.0)
            .unwrap();
        assert_eq!(centre.class, CornerClass::Saddle);
    }

    #[test]
    fn masked_cells_read_as_white() {
        let mut m = MarkerModel::new(0, 2, vec![0; 4], square(2.0), vec![]);
        assert!(m.mask_region(SubRegion {
            x0: 0,
            y0: 0,
            size: 2
        }));
        assert!(!m.mask_region(SubRegion {
            x0: 1,
            y0: 1,
            size: 1
        }));
        m.derive_keypoints();
        // the masked block behaves like a 2×2 white square: four Dark corners
        let inner = &m.keypoints()[4..];
        assert_eq!(inner.len(), 4);
        assert!(inner.iter().all(|k| k.class == CornerClass::Dark));
    }

    #[test]
    fn first_keypoints_are_light_corners() {
        let mut m = MarkerModel::new(3, 1, vec![1], square(1.5), vec![]);
        m.derive_keypoints();
        for (k, c) in m.keypoints().iter().zip(m.corners()) {
            assert_eq!(k.position, *c);
            assert_eq!(k.class, CornerClass::Light);
        }
        assert!((m.side_length() - 3.0).abs() < 1e-6);
    }
}
