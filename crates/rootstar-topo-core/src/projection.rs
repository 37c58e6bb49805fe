//! Azimuthal equidistant scalp projection
//!
//! Electrodes are flattened onto a plane centred on the vertex (+z). The
//! planar radius of an electrode equals its angular distance from the vertex,
//! so angles around the pole are preserved and distances along meridians
//! stay proportional.

use alloc::vec::Vec;
use core::f64::consts::FRAC_PI_2;

use crate::error::ProjectionError;
use crate::types::{Point2, SensorLayout2D, SensorPosition};

/// Spherical coordinates of a Cartesian point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spherical {
    /// Distance from origin
    pub radius: f64,
    /// Angle above the xy-plane, in radians
    pub elevation: f64,
    /// Angle from +x towards +y, in radians
    pub azimuth: f64,
}

/// Convert Cartesian coordinates to spherical (radius, elevation, azimuth).
#[must_use]
pub fn cart_to_sph(pos: &SensorPosition) -> Spherical {
    let xy = libm::hypot(pos.x, pos.y);
    Spherical {
        radius: pos.norm(),
        elevation: libm::atan2(pos.z, xy),
        azimuth: libm::atan2(pos.y, pos.x),
    }
}

/// Convert polar coordinates (angle `theta`, radius `rho`) to a planar point.
#[inline]
#[must_use]
pub fn pol_to_cart(theta: f64, rho: f64) -> Point2 {
    Point2::new(rho * libm::cos(theta), rho * libm::sin(theta))
}

/// Project one electrode with the azimuthal equidistant projection.
///
/// A zero-length position has no defined azimuth; this function does not
/// guard against it. Use [`project_layout`] for validated input.
#[must_use]
pub fn azimuthal_projection(pos: &SensorPosition) -> Point2 {
    let sph = cart_to_sph(pos);
    pol_to_cart(sph.azimuth, FRAC_PI_2 - sph.elevation)
}

/// Project a full montage, preserving electrode order.
///
/// # Errors
///
/// Returns [`ProjectionError`] if the montage is empty or if any electrode
/// is non-finite or at the origin.
pub fn project_layout(positions: &[SensorPosition]) -> Result<SensorLayout2D, ProjectionError> {
    if positions.is_empty() {
        return Err(ProjectionError::EmptyMontage);
    }

    let mut points = Vec::with_capacity(positions.len());
    for (index, pos) in positions.iter().enumerate() {
        if !pos.is_finite() {
            return Err(ProjectionError::NonFinitePosition { index });
        }
        if pos.norm() == 0.0 {
            return Err(ProjectionError::DegeneratePosition { index });
        }
        points.push(azimuthal_projection(pos));
    }

    Ok(SensorLayout2D::new(points))
}
