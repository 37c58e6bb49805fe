//! Per-channel standardization of interpolated grids
//!
//! Statistics are pooled over every sample's defined cells for one channel,
//! then applied to the same cells. Undefined cells pass through unchanged.

use rayon::prelude::*;
use rootstar_topo_core::math::RunningStats;
use serde::{Deserialize, Serialize};

/// Mean and standard deviation a channel was standardized with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Mean of defined cells before scaling
    pub mean: f64,
    /// Population standard deviation of defined cells before scaling
    pub std_dev: f64,
    /// Number of defined cells
    pub defined: u64,
}

/// Pooled statistics of the finite cells in one channel stack.
///
/// Accumulated sequentially so repeated runs agree bit for bit.
#[must_use]
pub fn channel_stats(stack: &[f64]) -> ChannelStats {
    let stats = RunningStats::from_slice(stack);

    ChannelStats {
        mean: stats.mean(),
        std_dev: stats.std_dev(),
        defined: stats.count(),
    }
}

/// Standardize one channel stack (all samples of one channel) in place.
///
/// A zero-variance channel is only mean-centred; a stack without defined
/// cells is left untouched.
pub fn normalize_channel(stack: &mut [f64]) -> ChannelStats {
    let stats = channel_stats(stack);
    if stats.defined == 0 {
        return stats;
    }

    let scale = if stats.std_dev > 0.0 { stats.std_dev } else { 1.0 };
    stack.par_iter_mut().filter(|v| v.is_finite()).for_each(|v| {
        *v = (*v - stats.mean) / scale;
    });
    stats
}

/// Standardize each channel of a channel-major buffer independently.
///
/// `buffer` holds `n_channels` contiguous stacks of `stack_len` cells.
pub fn normalize_channels(buffer: &mut [f64], stack_len: usize) -> Vec<ChannelStats> {
    if stack_len == 0 {
        return Vec::new();
    }
    buffer.chunks_mut(stack_len).map(normalize_channel).collect()
}

/// Replace every undefined cell with `value`
pub fn fill_undefined(values: &mut [f64], value: f64) {
    values.par_iter_mut().filter(|v| !v.is_finite()).for_each(|v| *v = value);
}
