//! Error types for Rootstar topographic imaging
//!
//! These errors work in `no_std` environments and carry the index of the
//! offending electrode so callers can point at the bad montage entry.

use core::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Projection Errors
// ============================================================================

/// Errors from projecting 3D electrode positions onto the scalp plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionError {
    /// Position vector has zero length, so its azimuth is undefined
    DegeneratePosition {
        /// Index of the electrode in the input montage
        index: usize,
    },
    /// Position contains NaN or infinity
    NonFinitePosition {
        /// Index of the electrode in the input montage
        index: usize,
    },
    /// No electrodes supplied
    EmptyMontage,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePosition { index } => {
                write!(f, "Electrode {index} sits at the origin; azimuth is undefined")
            }
            Self::NonFinitePosition { index } => {
                write!(f, "Electrode {index} has a non-finite coordinate")
            }
            Self::EmptyMontage => write!(f, "Montage contains no electrodes"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProjectionError {}

// ============================================================================
// Shape Errors
// ============================================================================

/// Errors from mismatched array dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeError {
    /// Flat feature width is not a whole number of channel blocks
    NotDivisible {
        /// Number of feature columns
        columns: usize,
        /// Number of electrodes per channel block
        sensors: usize,
    },
    /// Two arrays that must agree in length do not
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDivisible { columns, sensors } => {
                write!(f, "{columns} feature columns are not a multiple of {sensors} electrodes")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {expected}, got {actual}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ShapeError {}
