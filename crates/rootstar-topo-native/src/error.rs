//! Error Types for Native Image Generation
//!
//! Error types for layout triangulation and the imaging pipeline using
//! `thiserror`.

use rootstar_topo_core::{ProjectionError, ShapeError};
use thiserror::Error;

/// Layout / triangulation error types
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Fewer than three distinct electrode positions
    #[error("Triangulation needs at least 3 distinct electrodes, got {got}")]
    TooFewSensors {
        /// Number of distinct positions found
        got: usize,
    },

    /// Every electrode lies on one line, so no interpolation hull exists
    #[error("All {count} electrodes are collinear; the interpolation hull is empty")]
    Collinear {
        /// Number of electrodes checked
        count: usize,
    },

    /// Bounding box has zero width or height
    #[error("Layout bounding box is degenerate ({width} x {height})")]
    DegenerateBoundingBox {
        /// Box width
        width: f64,
        /// Box height
        height: f64,
    },

    /// Mesh builder rejected a coordinate
    #[error("Electrode {index} could not be inserted into the mesh: {reason}")]
    Insertion {
        /// Index of the electrode in the layout
        index: usize,
        /// Reason
        reason: String,
    },

    /// Projection of 3D positions failed
    #[error("Projection failed: {0}")]
    Projection(#[from] ProjectionError),
}

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Feature matrix does not fit the montage
    #[error("Feature shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Electrode layout cannot be triangulated
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Too few samples to fit the requested PCA rank
    #[error("Insufficient samples for PCA augmentation: got {got}, need {need}")]
    InsufficientSamples {
        /// Number of samples available
        got: usize,
        /// Number of samples needed
        need: usize,
    },

    /// Too few time points for spectral feature extraction
    #[error("Insufficient data: got {got} time points, need {need}")]
    InsufficientData {
        /// Number of points received
        got: usize,
        /// Number of points needed
        need: usize,
    },

    /// Configuration value out of range
    #[error("Invalid configuration parameter {parameter}: {reason}")]
    InvalidConfig {
        /// Parameter name
        parameter: &'static str,
        /// Reason
        reason: String,
    },

    /// Linear algebra routine did not converge
    #[error("Decomposition failed in {operation}: {reason}")]
    Decomposition {
        /// Operation that failed
        operation: &'static str,
        /// Reason
        reason: String,
    },
}

impl From<ProjectionError> for PipelineError {
    fn from(err: ProjectionError) -> Self {
        Self::Layout(LayoutError::Projection(err))
    }
}

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
