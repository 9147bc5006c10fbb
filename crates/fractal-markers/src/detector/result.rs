use crate::ModelKeypoint;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// A recognized marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: i32,
    /// Refined image corners in model corner order (TL, TR, BR, BL).
    pub corners: [Point2<f32>; 4],
    /// Model keypoints of this marker, outer corners first.
    pub keypoints: Vec<ModelKeypoint>,
    /// Perimeter of the unrefined candidate quad.
    pub perimeter: f32,
}

/// Parallel model-space / image-space point lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Correspondences {
    pub object_points: Vec<Point3<f32>>,
    pub image_points: Vec<Point2<f32>>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.object_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_points.is_empty()
    }

    pub fn push(&mut self, object: Point3<f32>, image: Point2<f32>) {
        self.object_points.push(object);
        self.image_points.push(image);
    }
}

/// Markers plus dense correspondences from one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FractalDetection {
    pub markers: Vec<DetectedMarker>,
    pub correspondences: Correspondences,
}
