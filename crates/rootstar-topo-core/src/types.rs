//! Core types for Rootstar topographic imaging
//!
//! This module provides the data model shared by every stage of the imaging
//! pipeline:
//! - 3D electrode positions and their 2D scalp projections
//! - Axis-aligned bounding boxes of projected layouts
//! - Standard EEG frequency bands used as feature channels

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

// ============================================================================
// Electrode Geometry
// ============================================================================

/// Cartesian electrode position on (or near) the scalp.
///
/// Units are irrelevant to the projection; only direction matters, so both
/// unit-sphere and millimetre montages work unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPosition {
    /// Left-right axis
    pub x: f64,
    /// Posterior-anterior axis
    pub y: f64,
    /// Inferior-superior axis (vertex is +z)
    pub z: f64,
}

impl SensorPosition {
    /// Create a new position
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length of the position vector
    #[inline]
    #[must_use]
    pub fn norm(&self) -> f64 {
        libm::sqrt(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// True when every coordinate is finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for SensorPosition {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Point in the projected scalp plane.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point2 {
    /// Create a new point
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point
    #[inline]
    #[must_use]
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned bounding box in the projected plane.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x
    pub min_x: f64,
    /// Maximum x
    pub max_x: f64,
    /// Minimum y
    pub min_y: f64,
    /// Maximum y
    pub max_y: f64,
}

impl BoundingBox {
    /// Width along x
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height along y
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// A box is degenerate when it has zero area
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Corners in the order (min,min), (min,max), (max,min), (max,max)
    #[must_use]
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.min_x, self.min_y),
            Point2::new(self.min_x, self.max_y),
            Point2::new(self.max_x, self.min_y),
            Point2::new(self.max_x, self.max_y),
        ]
    }
}

/// Projected 2D electrode layout, index-aligned with the source positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorLayout2D {
    points: Vec<Point2>,
}

impl SensorLayout2D {
    /// Wrap an existing list of planar points
    #[must_use]
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Number of sensors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the layout holds no sensors
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Planar points in sensor order
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Append a sensor
    pub fn push(&mut self, point: Point2) {
        self.points.push(point);
    }

    /// Bounding box of all points, `None` for an empty layout
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let init = BoundingBox {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };

        Some(self.points.iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            max_x: b.max_x.max(p.x),
            min_y: b.min_y.min(p.y),
            max_y: b.max_y.max(p.y),
        }))
    }
}

// ============================================================================
// EEG Frequency Bands
// ============================================================================

/// Standard EEG frequency band definitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    /// Delta: 0.5-4 Hz (deep sleep)
    Delta,
    /// Theta: 4-8 Hz (drowsiness, memory)
    Theta,
    /// Alpha: 8-13 Hz (relaxed, eyes closed)
    Alpha,
    /// Beta: 13-30 Hz (active thinking)
    Beta,
    /// Gamma: 30-100 Hz (cognitive processing)
    Gamma,
}

impl EegBand {
    /// Bands used as image color channels by default (theta, alpha, beta)
    pub const IMAGE_BANDS: [Self; 3] = [Self::Theta, Self::Alpha, Self::Beta];

    /// Get the frequency range for this band (low, high) in Hz
    #[inline]
    #[must_use]
    pub const fn range_hz(self) -> (f64, f64) {
        match self {
            Self::Delta => (0.5, 4.0),
            Self::Theta => (4.0, 8.0),
            Self::Alpha => (8.0, 13.0),
            Self::Beta => (13.0, 30.0),
            Self::Gamma => (30.0, 100.0),
        }
    }

    /// Get the band name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Delta => "Delta",
            Self::Theta => "Theta",
            Self::Alpha => "Alpha",
            Self::Beta => "Beta",
            Self::Gamma => "Gamma",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_bounding_box() {
        let layout = SensorLayout2D::new(vec![
            Point2::new(-1.0, 0.5),
            Point2::new(2.0, -0.5),
            Point2::new(0.0, 3.0),
        ]);

        let bbox = layout.bounding_box().unwrap();
        assert_eq!(bbox.min_x, -1.0);
        assert_eq!(bbox.max_x, 2.0);
        assert_eq!(bbox.min_y, -0.5);
        assert_eq!(bbox.max_y, 3.0);
        assert_eq!(bbox.width().max(bbox.height()), 3.5);
        assert!(!bbox.is_degenerate());
        assert_eq!(bbox.corners()[1], Point2::new(-1.0, 3.0));
    }

    #[test]
    fn test_empty_layout_has_no_bbox() {
        assert!(SensorLayout2D::default().bounding_box().is_none());
    }

    #[test]
    fn test_degenerate_bbox() {
        let layout = SensorLayout2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(layout.bounding_box().unwrap().is_degenerate());
    }

    #[test]
    fn test_band_ranges() {
        for band in EegBand::IMAGE_BANDS {
            let (lo, hi) = band.range_hz();
            assert!(lo < hi, "{} has inverted range", band.name());
        }
    }
}
