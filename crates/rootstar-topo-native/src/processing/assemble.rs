//! Image tensor assembly
//!
//! Axis order contract: `(sample, channel, i, j)`, where `(i, j)` follows the
//! [`Grid`](crate::processing::interpolate::Grid) cell ordering unchanged.
//! The flat buffer is row-major over those four axes.

use serde::{Deserialize, Serialize};

/// Dense image stack, `(n_samples, n_channels, n_gridpoints, n_gridpoints)`.
///
/// Undefined cells hold NaN unless a fill value was applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageTensor {
    n_samples: usize,
    n_channels: usize,
    n_gridpoints: usize,
    data: Vec<f64>,
}

impl ImageTensor {
    /// Stack channel-major grids into a sample-major tensor.
    ///
    /// `channel_stacks` holds, for each channel in turn, `n_samples` grids of
    /// `n_gridpoints²` cells. Returns `None` if its length does not match.
    #[must_use]
    pub fn from_channel_stacks(
        channel_stacks: &[f64],
        n_samples: usize,
        n_channels: usize,
        n_gridpoints: usize,
    ) -> Option<Self> {
        let cells = n_gridpoints * n_gridpoints;
        if channel_stacks.len() != n_samples * n_channels * cells {
            return None;
        }

        let mut data = Vec::with_capacity(channel_stacks.len());
        for s in 0..n_samples {
            for c in 0..n_channels {
                let start = (c * n_samples + s) * cells;
                data.extend_from_slice(&channel_stacks[start..start + cells]);
            }
        }

        Some(Self {
            n_samples,
            n_channels,
            n_gridpoints,
            data,
        })
    }

    /// Shape as `[n_samples, n_channels, n_gridpoints, n_gridpoints]`
    #[inline]
    #[must_use]
    pub fn shape(&self) -> [usize; 4] {
        [self.n_samples, self.n_channels, self.n_gridpoints, self.n_gridpoints]
    }

    /// Number of samples
    #[inline]
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of channels
    #[inline]
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Grid resolution per axis
    #[inline]
    #[must_use]
    pub fn n_gridpoints(&self) -> usize {
        self.n_gridpoints
    }

    #[inline]
    fn offset(&self, sample: usize, channel: usize) -> usize {
        (sample * self.n_channels + channel) * self.n_gridpoints * self.n_gridpoints
    }

    /// Value at `(sample, channel, i, j)`
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn get(&self, sample: usize, channel: usize, i: usize, j: usize) -> f64 {
        assert!(sample < self.n_samples && channel < self.n_channels);
        assert!(i < self.n_gridpoints && j < self.n_gridpoints);
        self.data[self.offset(sample, channel) + i * self.n_gridpoints + j]
    }

    /// One grid, row-major
    #[must_use]
    pub fn channel_grid(&self, sample: usize, channel: usize) -> &[f64] {
        let start = self.offset(sample, channel);
        &self.data[start..start + self.n_gridpoints * self.n_gridpoints]
    }

    /// Number of undefined (NaN) cells
    #[must_use]
    pub fn undefined_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Flat row-major buffer
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_major_order() {
        // 2 samples, 3 channels, 2x2 grids; value = 10*channel + sample
        let n = 2;
        let mut stacks = Vec::new();
        for c in 0..3 {
            for s in 0..2 {
                stacks.extend(std::iter::repeat((10 * c + s) as f64).take(n * n));
            }
        }

        let tensor = ImageTensor::from_channel_stacks(&stacks, 2, 3, n).unwrap();
        assert_eq!(tensor.shape(), [2, 3, 2, 2]);
        for s in 0..2 {
            for c in 0..3 {
                assert!(tensor.channel_grid(s, c).iter().all(|&v| v == (10 * c + s) as f64));
            }
        }
        assert_eq!(tensor.as_slice()[4], 10.0);
    }

    #[test]
    fn test_cell_order_unchanged() {
        let stacks: Vec<f64> = (0..9).map(f64::from).collect();
        let tensor = ImageTensor::from_channel_stacks(&stacks, 1, 1, 3).unwrap();
        assert_eq!(tensor.get(0, 0, 1, 2), 5.0);
        assert_eq!(tensor.get(0, 0, 2, 0), 6.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ImageTensor::from_channel_stacks(&[0.0; 7], 1, 2, 2).is_none());
    }

    #[test]
    fn test_undefined_count() {
        let tensor =
            ImageTensor::from_channel_stacks(&[f64::NAN, 1.0, f64::NAN, 2.0], 1, 1, 2).unwrap();
        assert_eq!(tensor.undefined_count(), 2);
    }
}
