//! Math utilities for topographic imaging (`no_std` compatible)
//!
//! This module provides:
//! - Running mean/variance that skips undefined (non-finite) values
//! - Evenly spaced sample points for grid construction

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

// ============================================================================
// Running Statistics
// ============================================================================

/// Streaming mean and population variance (Welford).
///
/// Non-finite inputs are ignored, so NaN-marked grid cells can be fed in
/// directly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Create an empty accumulator
    #[must_use]
    pub const fn new() -> Self {
        Self { count: 0, mean: 0.0, m2: 0.0 }
    }

    /// Accumulate every finite value of a slice
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for &v in values {
            stats.push(v);
        }
        stats
    }

    /// Add one value; non-finite values are skipped
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of finite values seen
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean of finite values (0 when empty)
    #[inline]
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of finite values (0 when empty)
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        libm::sqrt(self.variance())
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The last value is pinned to `end` exactly so grid edges coincide with the
/// layout bounding box. Returns `[start]` for `n == 1` and nothing for 0.
#[must_use]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => alloc::vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = end;
            out
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_statistics() {
        let stats = RunningStats::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.count(), 5);
        assert_abs_diff_eq!(stats.mean(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.variance(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_is_skipped() {
        let stats = RunningStats::from_slice(&[f64::NAN, 2.0, f64::INFINITY, 4.0]);
        assert_eq!(stats.count(), 2);
        assert_abs_diff_eq!(stats.mean(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.std_dev(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(-1.5, 1.5, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], -1.5);
        assert_eq!(v[4], 1.5);
        assert_abs_diff_eq!(v[2], 0.0, epsilon = 1e-15);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), alloc::vec![2.0]);
    }
}
