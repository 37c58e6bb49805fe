//! Edgeless padding
//!
//! Appends four synthetic zero-valued electrodes at the corners of the
//! layout bounding box. They join the triangulation, so the hull grows to
//! the full box and image corners fade to zero instead of being undefined.

use rootstar_topo_core::types::SensorLayout2D;

use crate::error::{LayoutError, LayoutResult};
use crate::processing::split::ChannelFeatureSet;

/// Number of synthetic electrodes added by padding
pub const PADDING_SENSORS: usize = 4;

/// Layout with the four bounding-box corners appended.
///
/// # Errors
///
/// Returns [`LayoutError::TooFewSensors`] for an empty layout and
/// [`LayoutError::DegenerateBoundingBox`] for a zero-area bounding box.
pub fn pad_layout(layout: &SensorLayout2D) -> LayoutResult<SensorLayout2D> {
    let bbox = layout.bounding_box().ok_or(LayoutError::TooFewSensors { got: 0 })?;
    if bbox.is_degenerate() {
        return Err(LayoutError::DegenerateBoundingBox {
            width: bbox.width(),
            height: bbox.height(),
        });
    }

    let mut padded = layout.clone();
    for corner in bbox.corners() {
        padded.push(corner);
    }
    Ok(padded)
}

/// Channel block with a zero value appended for each corner electrode
#[must_use]
pub fn pad_channel(channel: ChannelFeatureSet) -> ChannelFeatureSet {
    let n = channel.ncols();
    channel.insert_columns(n, PADDING_SENSORS, 0.0)
}

/// Pad a layout and every channel block together.
///
/// # Errors
///
/// See [`pad_layout`].
pub fn pad_edgeless(
    layout: &SensorLayout2D,
    channels: Vec<ChannelFeatureSet>,
) -> LayoutResult<(SensorLayout2D, Vec<ChannelFeatureSet>)> {
    let padded = pad_layout(layout)?;
    Ok((padded, channels.into_iter().map(pad_channel).collect()))
}
