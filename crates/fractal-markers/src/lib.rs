//! Fractal fiducial marker detection with dense inner-corner correspondences.
//!
//! A fractal marker nests smaller markers inside the code area of larger
//! ones, so a target stays recognizable from close up to far away. This
//! crate provides:
//! - the marker model (bits, sub-marker masks, derived keypoints) for the
//!   built-in `FRACTAL_nL_6` families,
//! - a detector that finds and decodes marker borders in a grayscale image,
//! - a matcher that recovers every visible inner corner, including corners of
//!   markers that could not be decoded directly.
//!
//! Image primitives live in `fractal-markers-core`.

mod builtins;
mod correspondence;
mod decoder;
mod descriptor;
mod detector;
mod error;
mod io;
mod model;
mod render;
mod set;

pub use builtins::MarkerFamily;
pub use correspondence::{
    classify_keypoint, classify_window, prune_keypoints, CorrespondenceMatcher,
};
pub use decoder::{decode_bits, rotate_cw, sample_bit_grid, CandidateDecoder, DecodedCandidate};
pub use detector::{
    Correspondences, DetectError, DetectedMarker, DetectorParams, FractalDetection,
    MarkerDetector, MatcherParams,
};
pub use error::{ConfigError, StateError};
pub use io::{FractalDetectConfig, FractalDetectReport, FractalIoError, FractalSetupError};
pub use model::{CornerClass, MarkerModel, ModelKeypoint};
pub use render::{render_family, render_marker, RenderLayout};
pub use set::{MarkerModelSet, Units};

pub use fractal_markers_core::{GrayImage, GrayImageView, Homography, SubpixParams};
