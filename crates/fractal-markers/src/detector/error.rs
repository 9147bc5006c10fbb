/// Errors returned by the marker detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("image buffer holds {len} bytes, expected {width}x{height}")]
    InvalidImage {
        width: usize,
        height: usize,
        len: usize,
    },
}
