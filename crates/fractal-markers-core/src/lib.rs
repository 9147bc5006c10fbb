//! Image primitives for fractal marker detection.
//!
//! Everything here works on 8-bit grayscale buffers and plain `nalgebra`
//! points; the marker logic itself lives in the `fractal-markers` crate.

mod features;
mod homography;
mod image;
mod index;
mod logger;
mod quads;
mod subpix;
mod threshold;

pub use features::{detect_fast_keypoints, Keypoint};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use image::{sample_bilinear, sample_bit_intensity, GrayImage, GrayImageView};
pub use index::PointIndex;
pub use quads::{find_quad_candidates, is_convex, QuadCandidate};
pub use subpix::{refine_corners_subpix, SubpixParams};
pub use threshold::{adaptive_threshold_mean_inv, adaptive_window_size};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
