//! Dense model ↔ image correspondences from detected markers.
//!
//! Image keypoints are pruned, classified by local topology and matched to
//! homography-projected model keypoints of the same [`crate::CornerClass`].

mod classify;
mod matcher;
mod prune;

pub use classify::{classify_keypoint, classify_window};
pub use matcher::CorrespondenceMatcher;
pub use prune::prune_keypoints;
