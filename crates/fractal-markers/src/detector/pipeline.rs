use super::{DetectError, DetectedMarker, DetectorParams, FractalDetection};
use crate::correspondence::CorrespondenceMatcher;
use crate::decoder::CandidateDecoder;
use crate::{ConfigError, MarkerFamily, MarkerModelSet, StateError};
use fractal_markers_core::{
    adaptive_threshold_mean_inv, adaptive_window_size, find_quad_candidates,
    refine_corners_subpix, GrayImageView,
};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Decoded quad before refinement.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MarkerCandidate {
    pub id: i32,
    pub corners: [Point2<f32>; 4],
    pub perimeter: f32,
}

/// Detector for one marker family.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    set: MarkerModelSet,
    params: DetectorParams,
}

impl MarkerDetector {
    pub fn new(set: MarkerModelSet, params: DetectorParams) -> Self {
        Self { set, params }
    }

    /// Detector for an embedded family with default parameters.
    pub fn from_family(family: MarkerFamily) -> Result<Self, ConfigError> {
        Ok(Self::new(
            MarkerModelSet::from_family(family)?,
            DetectorParams::default(),
        ))
    }

    /// Set model coordinates so the root marker side equals `size` meters.
    pub fn with_physical_size(mut self, size: f32) -> Result<Self, StateError> {
        self.set.convert_to_physical_scale(size)?;
        Ok(self)
    }

    #[inline]
    pub fn set(&self) -> &MarkerModelSet {
        &self.set
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Find every marker of the family visible in `image`.
    ///
    /// Markers come out in ascending id order, at most one per id. An image
    /// without markers gives an empty list.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(w = image.width, h = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Result<Vec<DetectedMarker>, DetectError> {
        validate(image)?;
        if image.data.is_empty() {
            return Ok(Vec::new());
        }

        let window = adaptive_window_size(
            image.width,
            self.params.threshold_window_ref,
            self.params.threshold_ref_width,
        );
        let binary = adaptive_threshold_mean_inv(image, window, self.params.threshold_offset);
        let quads = find_quad_candidates(
            &binary,
            self.params.min_contour_len,
            self.params.poly_epsilon_frac,
        );

        let decoder = CandidateDecoder::new(&self.set);
        let mut candidates = Vec::new();
        for quad in &quads {
            let corners = normalize_orientation(quad.corners);
            for decoded in decoder.decode(image, &corners) {
                candidates.push(MarkerCandidate {
                    id: decoded.id,
                    perimeter: perimeter(&decoded.corners),
                    corners: decoded.corners,
                });
            }
        }
        log::debug!(
            "window {}: {} quads, {} decoded candidates",
            window,
            quads.len(),
            candidates.len()
        );

        let candidates = dedup_by_id(candidates);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut flat: Vec<Point2<f32>> = candidates
            .iter()
            .flat_map(|c| c.corners.iter().copied())
            .collect();
        refine_corners_subpix(image, &mut flat, &self.params.subpix);

        let markers: Vec<DetectedMarker> = candidates
            .iter()
            .zip(flat.chunks_exact(4))
            .filter_map(|(c, refined)| {
                let model = self.set.get(c.id)?;
                Some(DetectedMarker {
                    id: c.id,
                    corners: [refined[0], refined[1], refined[2], refined[3]],
                    keypoints: model.keypoints().to_vec(),
                    perimeter: c.perimeter,
                })
            })
            .collect();

        log::debug!(
            "detected markers: {:?}",
            markers.iter().map(|m| m.id).collect::<Vec<_>>()
        );
        Ok(markers)
    }

    /// Convert a decoded image of any pixel format to 8-bit luma and run
    /// [`Self::detect_with_correspondences`] on it.
    pub fn detect_image(&self, img: &image::DynamicImage) -> Result<FractalDetection, DetectError> {
        let luma = img.to_luma8();
        self.detect_with_correspondences(&GrayImageView::from_luma(&luma))
    }

    /// [`Self::detect`] followed by dense correspondence matching.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(w = image.width, h = image.height))
    )]
    pub fn detect_with_correspondences(
        &self,
        image: &GrayImageView<'_>,
    ) -> Result<FractalDetection, DetectError> {
        let markers = self.detect(image)?;
        let correspondences = if markers.is_empty() {
            Default::default()
        } else {
            CorrespondenceMatcher::new(&self.set, &self.params.matcher, &self.params.subpix)
                .match_markers(image, &markers)
        };
        Ok(FractalDetection {
            markers,
            correspondences,
        })
    }
}

fn validate(image: &GrayImageView<'_>) -> Result<(), DetectError> {
    if image.data.len() != image.width * image.height {
        return Err(DetectError::InvalidImage {
            width: image.width,
            height: image.height,
            len: image.data.len(),
        });
    }
    Ok(())
}

/// Swap points 1 and 3 when `(p1 - p0) × (p2 - p0)` is negative, so the
/// quad runs clockwise on screen.
pub(crate) fn normalize_orientation(mut q: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let d1 = q[1] - q[0];
    let d2 = q[2] - q[0];
    if d1.x * d2.y - d1.y * d2.x < 0.0 {
        q.swap(1, 3);
    }
    q
}

fn perimeter(q: &[Point2<f32>; 4]) -> f32 {
    (0..4).map(|i| (q[(i + 1) % 4] - q[i]).norm()).sum()
}

/// Keep the largest-perimeter candidate per id, ordered by id.
pub(crate) fn dedup_by_id(mut candidates: Vec<MarkerCandidate>) -> Vec<MarkerCandidate> {
    candidates.sort_by(|a, b| {
        a.id.cmp(&b.id)
            .then_with(|| b.perimeter.total_cmp(&a.perimeter))
    });
    candidates.dedup_by_key(|c| c.id);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i32, perimeter: f32) -> MarkerCandidate {
        MarkerCandidate {
            id,
            corners: [Point2::new(perimeter, 0.0); 4],
            perimeter,
        }
    }

    #[test]
    fn dedup_keeps_largest_per_id() {
        let out = dedup_by_id(vec![
            candidate(7, 100.0),
            candidate(3, 50.0),
            candidate(7, 140.0),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, 3);
        assert_eq!(out[1].id, 7);
        assert_eq!(out[1].perimeter, 140.0);
    }

    #[test]
    fn orientation_is_made_clockwise() {
        let ccw = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
        ];
        let cw = normalize_orientation(ccw);
        assert_eq!(cw[1], Point2::new(10.0, 0.0));
        assert_eq!(cw[3], Point2::new(0.0, 10.0));
        assert_eq!(normalize_orientation(cw), cw);
    }

    #[test]
    fn perimeter_of_square() {
        let q = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert!((perimeter(&q) - 40.0).abs() < 1e-5);
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        let det = MarkerDetector::from_family(MarkerFamily::Fractal2L6).unwrap();
        let data = vec![0u8; 10];
        let view = GrayImageView {
            width: 4,
            height: 4,
            data: &data,
        };
        assert_eq!(
            det.detect(&view).unwrap_err(),
            DetectError::InvalidImage {
                width: 4,
                height: 4,
                len: 10
            }
        );
    }

    #[test]
    fn blank_and_empty_images_give_no_markers() {
        let det = MarkerDetector::from_family(MarkerFamily::Fractal3L6).unwrap();
        let blank = vec![200u8; 64 * 48];
        let view = GrayImageView {
            width: 64,
            height: 48,
            data: &blank,
        };
        assert!(det.detect(&view).unwrap().is_empty());

        let empty = GrayImageView {
            width: 0,
            height: 0,
            data: &[],
        };
        let res = det.detect_with_correspondences(&empty).unwrap();
        assert!(res.markers.is_empty());
        assert!(res.correspondences.is_empty());
    }
}
