//! Rootstar Topo Native - Host-side EEG topographic image generation
//!
//! This crate turns per-electrode EEG features into dense image stacks:
//! - Channel splitting and optional feature augmentation
//! - Delaunay triangulation and Clough-Tocher interpolation onto a grid
//! - Edgeless corner padding, per-channel normalization, tensor assembly
//! - Band-power feature extraction from raw trials
//!
//! # Modules
//!
//! - [`pipeline`]: Configuration, pipeline context and runner
//! - [`processing`]: Individual imaging stages
//! - [`features`]: Band-power features from raw EEG trials
//! - [`error`]: Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod features;
pub mod pipeline;
pub mod processing;

// Re-export key types
pub use error::{LayoutError, PipelineError, PipelineResult};
pub use features::BandPowerExtractor;
pub use pipeline::{gen_images, ImageConfig, PipelineContext, PipelineOutput};
pub use processing::assemble::ImageTensor;
pub use processing::augment::AugmentMode;
pub use processing::interpolate::{Grid, InterpolationPlan, UNDEFINED};
pub use processing::normalize::ChannelStats;
pub use processing::split::FeatureMatrix;
