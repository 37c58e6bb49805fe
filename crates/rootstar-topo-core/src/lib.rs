//! Rootstar Topo Core - `no_std` compatible types for EEG topographic imaging
//!
//! This crate provides the foundational types and geometry used to turn
//! per-electrode EEG features into image-like grids. It is designed to work
//! in `no_std` + `alloc` environments as well as `std` environments.
//!
//! # Modules
//!
//! - [`types`]: Electrode positions, planar layouts, bounding boxes, EEG bands
//! - [`projection`]: Azimuthal equidistant scalp projection
//! - [`math`]: Running statistics and grid sampling helpers
//! - [`error`]: Error types for projection and shape checks
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```rust
//! use rootstar_topo_core::projection::project_layout;
//! use rootstar_topo_core::types::SensorPosition;
//!
//! let montage = [
//!     SensorPosition::new(1.0, 0.0, 0.0),
//!     SensorPosition::new(0.0, 1.0, 0.0),
//!     SensorPosition::new(0.0, 0.0, 1.0),
//! ];
//! let layout = project_layout(&montage).unwrap();
//! assert_eq!(layout.len(), 3);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod math;
pub mod projection;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ProjectionError, ShapeError};
pub use math::{linspace, RunningStats};
pub use projection::{azimuthal_projection, cart_to_sph, pol_to_cart, project_layout, Spherical};
pub use types::{BoundingBox, EegBand, Point2, SensorLayout2D, SensorPosition};
