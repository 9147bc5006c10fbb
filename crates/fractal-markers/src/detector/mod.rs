//! Fractal marker detection pipeline.
//!
//! Adaptive threshold → contours → convex quads → decoding → per-id
//! deduplication → subpixel refinement, optionally followed by dense
//! correspondence matching.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::DetectError;
pub use params::{DetectorParams, MatcherParams};
pub use pipeline::MarkerDetector;
pub use result::{Correspondences, DetectedMarker, FractalDetection};
