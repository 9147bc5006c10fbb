use super::{classify_keypoint, prune_keypoints};
use crate::{CornerClass, Correspondences, DetectedMarker, MarkerModelSet, MatcherParams};
use fractal_markers_core::{
    detect_fast_keypoints, estimate_homography, refine_corners_subpix, GrayImageView, Homography,
    Keypoint, PointIndex, SubpixParams,
};
use nalgebra::{Point2, Point3};
use std::collections::HashMap;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Matches every model keypoint of a set against image keypoints.
pub struct CorrespondenceMatcher<'a> {
    set: &'a MarkerModelSet,
    params: &'a MatcherParams,
    subpix: &'a SubpixParams,
}

/// Classified image keypoints with a spatial index over them.
struct KeypointField {
    points: Vec<Point2<f32>>,
    classes: Vec<Option<CornerClass>>,
    index: PointIndex,
}

impl<'a> CorrespondenceMatcher<'a> {
    pub fn new(set: &'a MarkerModelSet, params: &'a MatcherParams, subpix: &'a SubpixParams) -> Self {
        Self {
            set,
            params,
            subpix,
        }
    }

    /// Detect FAST keypoints in `image` and match them against the set.
    ///
    /// Returns empty lists when `markers` is empty or no homography can be
    /// fitted to them.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image, markers), fields(markers = markers.len()))
    )]
    pub fn match_markers(&self, image: &GrayImageView<'_>, markers: &[DetectedMarker]) -> Correspondences {
        if markers.is_empty() {
            return Correspondences::default();
        }
        let keypoints = detect_fast_keypoints(image, self.params.fast_threshold);
        self.match_keypoints(image, markers, &keypoints)
    }

    /// Match against caller-provided image keypoints.
    pub fn match_keypoints(
        &self,
        image: &GrayImageView<'_>,
        markers: &[DetectedMarker],
        keypoints: &[Keypoint],
    ) -> Correspondences {
        let Some(h) = self.fit_homography(markers) else {
            log::debug!("no homography from {} markers", markers.len());
            return Correspondences::default();
        };

        let field = self.keypoint_field(image, keypoints);
        let mut out = Correspondences::default();
        let mut claims = Claims::default();

        for model in self.set.models() {
            let object: Vec<Point2<f32>> = model
                .keypoints()
                .iter()
                .map(|k| Point2::new(k.position.x, k.position.y))
                .collect();
            let projected = h.apply_all(&object);

            if well_separated(&projected, self.params.min_projected_sep_sq) {
                for ((p, obj), kp) in projected.iter().zip(&object).zip(model.keypoints()) {
                    if !inside(image, *p) {
                        continue;
                    }
                    let Some((ki, d2)) = self.accept(&field, *p, kp.class) else {
                        continue;
                    };
                    let object = Point3::new(obj.x, obj.y, 0.0);
                    claims.offer(&mut out, ki, d2, object, field.points[ki]);
                }
            } else if let Some(det) = markers.iter().find(|m| m.id == model.id()) {
                for (c, img) in model.corners().iter().zip(det.corners) {
                    out.push(Point3::new(c.x, c.y, 0.0), img);
                }
            }
        }

        if !out.is_empty() {
            refine_corners_subpix(image, &mut out.image_points, self.subpix);
        }
        log::debug!(
            "correspondences: {} ({} keypoints claimed)",
            out.len(),
            claims.by_keypoint.len()
        );
        out
    }

    /// Least-squares homography from model corners to detected image corners.
    fn fit_homography(&self, markers: &[DetectedMarker]) -> Option<Homography> {
        let mut src = Vec::with_capacity(markers.len() * 4);
        let mut dst = Vec::with_capacity(markers.len() * 4);
        for m in markers {
            let Some(model) = self.set.get(m.id) else {
                continue;
            };
            src.extend(model.corners_2d());
            dst.extend(m.corners);
        }
        estimate_homography(&src, &dst)
    }

    fn keypoint_field(&self, image: &GrayImageView<'_>, keypoints: &[Keypoint]) -> KeypointField {
        let pruned = prune_keypoints(
            keypoints,
            self.params.response_keep_frac,
            self.params.nms_dist_sq,
        );
        let points: Vec<Point2<f32>> = pruned.iter().map(|k| k.position).collect();
        let classes = points
            .iter()
            .map(|&p| {
                classify_keypoint(
                    image,
                    p,
                    self.params.class_window_radius,
                    self.params.flat_range,
                    None,
                )
            })
            .collect();
        log::trace!("keypoints: {} raw, {} after pruning", keypoints.len(), points.len());
        KeypointField {
            index: PointIndex::new(&points),
            points,
            classes,
        }
    }

    /// Nearest keypoint to `p` if it is in range, not coincident with `p`, and
    /// has the expected class.
    fn accept(&self, field: &KeypointField, p: Point2<f32>, class: CornerClass) -> Option<(usize, f32)> {
        let (ki, d2) = field.index.nearest(p)?;
        if d2 == 0.0 || d2 > self.params.search_radius_sq || d2 > self.params.max_match_dist_sq {
            return None;
        }
        (field.classes[ki] == Some(class)).then_some((ki, d2))
    }
}

/// Output slot and squared distance of the claim on each image keypoint.
#[derive(Default)]
struct Claims {
    by_keypoint: HashMap<usize, (usize, f32)>,
}

impl Claims {
    /// Record a match; a keypoint claimed again keeps the closer model point.
    fn offer(
        &mut self,
        out: &mut Correspondences,
        keypoint: usize,
        d2: f32,
        object: Point3<f32>,
        image: Point2<f32>,
    ) {
        match self.by_keypoint.get_mut(&keypoint) {
            Some((slot, best)) => {
                if d2 < *best {
                    *best = d2;
                    out.object_points[*slot] = object;
                }
            }
            None => {
                self.by_keypoint.insert(keypoint, (out.len(), d2));
                out.push(object, image);
            }
        }
    }
}

fn inside(image: &GrayImageView<'_>, p: Point2<f32>) -> bool {
    p.x > 0.0 && p.x < image.width as f32 && p.y > 0.0 && p.y < image.height as f32
}

/// Every pair of points is at least `min_sq` apart (squared).
fn well_separated(points: &[Point2<f32>], min_sq: f32) -> bool {
    points.iter().enumerate().all(|(i, a)| {
        points[i + 1..]
            .iter()
            .all(|b| (a - b).norm_squared() >= min_sq)
    })
}
