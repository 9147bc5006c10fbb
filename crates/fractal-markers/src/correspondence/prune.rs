use fractal_markers_core::Keypoint;

/// Drop weak keypoints and suppress close neighbours.
///
/// Keypoints below `min + keep_frac * (max - min)` response go first. Then,
/// in index order, of every surviving pair closer than `nms_dist_sq` only the
/// stronger one is kept; on equal response the later index wins. This is a
/// greedy pass, not a global optimum.
pub fn prune_keypoints(keypoints: &[Keypoint], keep_frac: f32, nms_dist_sq: f32) -> Vec<Keypoint> {
    let Some(first) = keypoints.first() else {
        return Vec::new();
    };
    let (min, max) = keypoints
        .iter()
        .fold((first.response, first.response), |(lo, hi), k| {
            (lo.min(k.response), hi.max(k.response))
        });
    let threshold = min + keep_frac * (max - min);

    let mut alive: Vec<bool> = keypoints.iter().map(|k| k.response >= threshold).collect();
    for i in 0..keypoints.len() {
        if !alive[i] {
            continue;
        }
        for j in i + 1..keypoints.len() {
            if !alive[j] {
                continue;
            }
            let d2 = (keypoints[i].position - keypoints[j].position).norm_squared();
            if d2 >= nms_dist_sq {
                continue;
            }
            if keypoints[j].response >= keypoints[i].response {
                alive[i] = false;
                break;
            }
            alive[j] = false;
        }
    }

    keypoints
        .iter()
        .zip(alive)
        .filter_map(|(k, keep)| keep.then_some(*k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn kp(x: f32, y: f32, response: f32) -> Keypoint {
        Keypoint {
            position: Point2::new(x, y),
            response,
        }
    }

    #[test]
    fn weak_responses_are_dropped() {
        let kps = [kp(0.0, 0.0, 10.0), kp(50.0, 0.0, 11.0), kp(100.0, 0.0, 60.0)];
        // threshold = 10 + 0.2 * 50 = 20
        let out = prune_keypoints(&kps, 0.2, 100.0);
        assert_eq!(out, vec![kps[2]]);
    }

    #[test]
    fn close_pairs_keep_the_stronger() {
        let kps = [
            kp(0.0, 0.0, 50.0),
            kp(5.0, 0.0, 80.0),
            kp(40.0, 0.0, 70.0),
            kp(43.0, 4.0, 30.0),
        ];
        let out = prune_keypoints(&kps, 0.0, 100.0);
        assert_eq!(out, vec![kps[1], kps[2]]);
    }

    #[test]
    fn equal_responses_keep_the_later_index() {
        let kps = [kp(0.0, 0.0, 40.0), kp(3.0, 0.0, 40.0)];
        let out = prune_keypoints(&kps, 0.2, 100.0);
        assert_eq!(out, vec![kps[1]]);
    }

    #[test]
    fn distance_threshold_is_strict() {
        let kps = [kp(0.0, 0.0, 40.0), kp(10.0, 0.0, 40.0)];
        assert_eq!(prune_keypoints(&kps, 0.2, 100.0).len(), 2);
        assert!(prune_keypoints(&[], 0.2, 100.0).is_empty());
    }
}
