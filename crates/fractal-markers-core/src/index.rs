//! Nearest-neighbour lookup over 2D points.

use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point2;

/// Static kd-tree over a point list; items are indices into that list.
pub struct PointIndex {
    tree: KdTree<f32, 2>,
    len: usize,
}

impl PointIndex {
    pub fn new(points: &[Point2<f32>]) -> Self {
        let coords: Vec<[f32; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
        let tree: KdTree<f32, 2> = (&coords).into();
        Self {
            tree,
            len: coords.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the closest point and its squared distance, `None` when empty.
    pub fn nearest(&self, p: Point2<f32>) -> Option<(usize, f32)> {
        if self.is_empty() {
            return None;
        }
        let nn = self.tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
        Some((nn.item as usize, nn.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_returns_index_and_squared_distance() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        let idx = PointIndex::new(&pts);
        assert_eq!(idx.len(), 3);
        let (i, d2) = idx.nearest(Point2::new(9.0, 2.0)).unwrap();
        assert_eq!(i, 1);
        assert!((d2 - 5.0).abs() < 1e-5);
    }

    #[test]
    fn empty_index_has_no_neighbour() {
        let idx = PointIndex::new(&[]);
        assert!(idx.is_empty());
        assert!(idx.nearest(Point2::new(1.0, 1.0)).is_none());
    }
}
