//! Imaging stages
//!
//! Each stage of the scattered-to-grid pipeline, leaves first:
//! - [`split`]: Feature matrix to per-channel blocks
//! - [`augment`]: Gaussian and PCA-space feature noise
//! - [`padding`]: Edgeless corner electrodes
//! - [`triangulation`]: Delaunay triangulation of the planar layout
//! - [`interpolate`]: Clough-Tocher interpolation onto the grid
//! - [`normalize`]: Per-channel standardization
//! - [`assemble`]: Sample-major image tensor
//! - [`fft`]: Spectral analysis for band-power features

pub mod assemble;
pub mod augment;
pub mod fft;
pub mod interpolate;
pub mod normalize;
pub mod padding;
pub mod split;
pub mod triangulation;
