//! Errors raised while building or mutating a marker set.

/// Marker family or descriptor problems found during construction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown marker family `{0}`")]
    UnknownFamily(String),
    #[error("descriptor truncated reading `{field}` at byte {offset}")]
    Truncated { field: &'static str, offset: usize },
    #[error("descriptor has {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("invalid unit code {0}")]
    InvalidUnits(i32),
    #[error("negative `{field}` count {value}")]
    NegativeCount { field: &'static str, value: i32 },
    #[error("marker {id}: bit count {bits} is not a non-zero perfect square")]
    NonSquareBits { id: i32, bits: i32 },
    #[error("marker {id}: bit value {value} is not 0 or 1")]
    InvalidBit { id: i32, value: u8 },
    #[error("duplicate marker id {0}")]
    DuplicateId(i32),
    #[error("root marker {0} is not defined")]
    UnknownRoot(i32),
    #[error("marker {parent} references unknown sub-marker {child}")]
    UnknownSubMarker { parent: i32, child: i32 },
    #[error("marker {parent}: sub-marker {child} lies outside the bit grid")]
    SubMarkerOutOfBounds { parent: i32, child: i32 },
    #[error("marker {parent}: sub-marker {child} overlaps another sub-marker")]
    OverlappingSubMarkers { parent: i32, child: i32 },
    #[error("marker {0} has a degenerate side length")]
    DegenerateMarker(i32),
}

/// Operation not allowed in the set's current state.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("marker set is already in {0} units; physical scale can only be applied once")]
    AlreadyPhysical(crate::Units),
    #[error("physical size must be finite and positive, got {0}")]
    InvalidSize(f32),
}
