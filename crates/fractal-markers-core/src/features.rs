//! FAST-9 keypoints for dense corner matching.

use crate::GrayImageView;
use imageproc::corners::corners_fast9;
use nalgebra::Point2;

/// Image keypoint with its detector response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub position: Point2<f32>,
    pub response: f32,
}

/// FAST-9 corners of `src` with intensity threshold `threshold`.
///
/// Positions are integer pixel coordinates; the response is the FAST score.
pub fn detect_fast_keypoints(src: &GrayImageView<'_>, threshold: u8) -> Vec<Keypoint> {
    let luma = src.to_luma();
    let kps: Vec<Keypoint> = corners_fast9(&luma, threshold)
        .into_iter()
        .map(|c| Keypoint {
            position: Point2::new(c.x as f32, c.y as f32),
            response: c.score,
        })
        .collect();
    log::trace!("fast9: {} keypoints (threshold {})", kps.len(), threshold);
    kps
}
