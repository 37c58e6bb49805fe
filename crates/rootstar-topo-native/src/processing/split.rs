//! Channel splitting
//!
//! A flat feature row holds one contiguous block of electrode values per
//! channel (e.g. `[theta × n | alpha × n | beta × n]`). This module cuts the
//! matrix into one `(n_samples, n_sensors)` block per channel.

use nalgebra::DMatrix;
use rootstar_topo_core::ShapeError;

use crate::error::{PipelineError, PipelineResult};

/// Feature matrix, `(n_samples, n_channels × n_sensors)`, channel-major columns
pub type FeatureMatrix = DMatrix<f64>;

/// Per-channel features, `(n_samples, n_sensors)`
pub type ChannelFeatureSet = DMatrix<f64>;

/// Split a feature matrix into per-channel blocks.
///
/// Row order and the column order inside each block are preserved.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] when `n_sensors` is zero and
/// [`ShapeError::NotDivisible`] when the column count is not a multiple of
/// `n_sensors`.
pub fn split_channels(
    features: &FeatureMatrix,
    n_sensors: usize,
) -> PipelineResult<Vec<ChannelFeatureSet>> {
    if n_sensors == 0 {
        return Err(PipelineError::InvalidConfig {
            parameter: "n_sensors",
            reason: "must be at least 1".to_string(),
        });
    }

    let columns = features.ncols();
    if columns % n_sensors != 0 {
        return Err(ShapeError::NotDivisible { columns, sensors: n_sensors }.into());
    }

    Ok((0..columns / n_sensors)
        .map(|c| features.columns(c * n_sensors, n_sensors).into_owned())
        .collect())
}
