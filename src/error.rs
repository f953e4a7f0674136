//! Error types for lattice sampling, scheme compilation and editing

use glam::IVec3;
use thiserror::Error;

use crate::session::ChildHandle;

/// Errors that can occur while building lattices, compiling schemes or
/// editing a session
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SchemeError {
    /// Subdivision size outside `[1, max]`
    #[error("size must be in [1, {max}], got {size}")]
    InvalidSize {
        /// Requested size
        size: i32,
        /// Largest accepted size
        max: i32,
    },

    /// Lattice coordinate outside `[0, size]^3`
    #[error("coordinate {coord} is outside the lattice [0, {size}]^3")]
    OutOfRangeCoordinate {
        /// Offending coordinate
        coord: IVec3,
        /// Active lattice size
        size: i32,
    },

    /// Linear index outside the point buffer
    #[error("index {index} is outside the lattice point buffer (len {len})")]
    OutOfRangeIndex {
        /// Offending index
        index: usize,
        /// Number of stored points
        len: usize,
    },

    /// Query or clip box that is inverted or leaves the lattice
    #[error("invalid bounds: min {min} / max {max}")]
    InvalidBounds {
        /// Minimum corner
        min: IVec3,
        /// Maximum corner
        max: IVec3,
    },

    /// Influence with a corner outside `[0, 8)` or a non-positive / non-finite weight
    #[error("invalid influence: corner {corner}, weight {weight}")]
    InvalidInfluence {
        /// Source corner index
        corner: usize,
        /// Weight
        weight: f64,
    },

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Child handle no longer refers to a live child
    #[error("stale child handle {0:?}")]
    StaleHandle(ChildHandle),

    /// Size would be too small to represent an existing child
    #[error("size {size} is smaller than the extent {required} of an existing child")]
    SizeBelowChildren {
        /// Requested size
        size: i32,
        /// Smallest size representing every child
        required: i32,
    },
}

/// Result type alias for scheme operations
pub type Result<T> = std::result::Result<T, SchemeError>;
