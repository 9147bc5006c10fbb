use fractal_markers_core::SubpixParams;
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::MarkerDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Contours with fewer points are not considered.
    pub min_contour_len: usize,
    /// Douglas–Peucker epsilon as a fraction of the contour length.
    pub poly_epsilon_frac: f64,
    /// Threshold window at `threshold_ref_width`; scaled with the image width.
    pub threshold_window_ref: u32,
    pub threshold_ref_width: u32,
    /// Pixels darker than `local_mean - threshold_offset` are foreground.
    pub threshold_offset: i32,
    /// Refinement applied to detected corners and matched keypoints.
    pub subpix: SubpixParams,
    pub matcher: MatcherParams,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            min_contour_len: 120,
            poly_epsilon_frac: 0.05,
            threshold_window_ref: 15,
            threshold_ref_width: 1920,
            threshold_offset: 7,
            subpix: SubpixParams::default(),
            matcher: MatcherParams::default(),
        }
    }
}

/// Dense keypoint matching settings. Distances are squared pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// FAST-9 intensity threshold.
    pub fast_threshold: u8,
    /// Keypoints below `min + keep_frac * (max - min)` response are dropped.
    pub response_keep_frac: f32,
    pub nms_dist_sq: f32,
    /// Classification window is `2 * radius + 1` pixels wide.
    pub class_window_radius: usize,
    /// Windows with a smaller intensity range are flat.
    pub flat_range: u8,
    /// A model is matched point-wise only if all its projected keypoints are
    /// at least this far apart.
    pub min_projected_sep_sq: f32,
    pub search_radius_sq: f32,
    pub max_match_dist_sq: f32,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            fast_threshold: 10,
            response_keep_frac: 0.2,
            nms_dist_sq: 100.0,
            class_window_radius: 5,
            flat_range: 25,
            min_projected_sep_sq: 150.0,
            search_radius_sq: 400.0,
            max_match_dist_sq: 320.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let p: DetectorParams =
            serde_json::from_str(r#"{ "min_contour_len": 60, "matcher": { "fast_threshold": 20 } }"#)
                .unwrap();
        assert_eq!(p.min_contour_len, 60);
        assert_eq!(p.matcher.fast_threshold, 20);
        assert_eq!(p.matcher.max_match_dist_sq, 320.0);
        assert_eq!(p.subpix, SubpixParams::default());
        assert_eq!(p.threshold_offset, 7);
    }
}
