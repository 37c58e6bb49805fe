//! Image generation pipeline
//!
//! [`PipelineContext`] owns everything that depends only on the electrode
//! montage: the projected layout, the sampling grid, the triangulation and
//! the per-cell triangle lookup. It is built once and then turns any number
//! of feature matrices into image tensors:
//!
//! ```text
//! features ─► split ─► augment? ─► pad? ─► interpolate ─► normalize? ─► fill? ─► assemble
//! ```
//!
//! Interpolation fans out over `(sample, channel)` work items. Each item
//! writes only its own slot of a channel-major arena, so the result does not
//! depend on scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rootstar_topo_core::projection::project_layout;
use rootstar_topo_core::types::{SensorLayout2D, SensorPosition};
use rootstar_topo_core::ShapeError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LayoutError, PipelineError, PipelineResult};
use crate::processing::assemble::ImageTensor;
use crate::processing::augment::{augment, AugmentMode};
use crate::processing::interpolate::{Grid, InterpolationPlan, UNDEFINED};
use crate::processing::normalize::{channel_stats, fill_undefined, normalize_channels, ChannelStats};
use crate::processing::padding::{pad_channel, pad_layout};
use crate::processing::split::{split_channels, ChannelFeatureSet, FeatureMatrix};

// ============================================================================
// Configuration
// ============================================================================

/// Image generation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Grid samples per axis
    pub n_gridpoints: usize,
    /// Standardize each channel over all samples
    pub normalize: bool,
    /// Perturb features before interpolation
    pub augment: bool,
    /// Use PCA-space noise instead of per-feature noise
    pub pca: bool,
    /// Noise scale relative to the feature (or component) spread
    pub std_mult: f64,
    /// Principal components perturbed in PCA mode
    pub n_components: usize,
    /// Add zero-valued corner electrodes before interpolation
    pub edgeless: bool,
    /// Value written into undefined cells after normalization
    pub fill_undefined: Option<f64>,
    /// Augmentation seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Interpolate on the rayon pool
    pub parallel: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            n_gridpoints: 32,
            normalize: true,
            augment: false,
            pca: false,
            std_mult: 0.1,
            n_components: 2,
            edgeless: false,
            fill_undefined: None,
            seed: None,
            parallel: true,
        }
    }
}

impl ImageConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.n_gridpoints < 2 {
            return Err(PipelineError::InvalidConfig {
                parameter: "n_gridpoints",
                reason: format!("must be at least 2, got {}", self.n_gridpoints),
            });
        }
        if !self.std_mult.is_finite() || self.std_mult < 0.0 {
            return Err(PipelineError::InvalidConfig {
                parameter: "std_mult",
                reason: format!("must be finite and non-negative, got {}", self.std_mult),
            });
        }
        if self.pca && self.n_components == 0 {
            return Err(PipelineError::InvalidConfig {
                parameter: "n_components",
                reason: "must be at least 1 in PCA mode".to_string(),
            });
        }
        if let Some(value) = self.fill_undefined {
            if !value.is_finite() {
                return Err(PipelineError::InvalidConfig {
                    parameter: "fill_undefined",
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Augmentation mode, if augmentation is enabled
    #[must_use]
    pub fn augment_mode(&self) -> Option<AugmentMode> {
        match (self.augment, self.pca) {
            (false, _) => None,
            (true, false) => Some(AugmentMode::Noise),
            (true, true) => Some(AugmentMode::Pca {
                n_components: self.n_components,
            }),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Result of one pipeline run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Images, `(n_samples, n_channels, n_gridpoints, n_gridpoints)`
    pub images: ImageTensor,
    /// Projected electrode layout, without padding electrodes
    pub layout: SensorLayout2D,
    /// Per-channel statistics of the interpolated grids before normalization
    pub channel_stats: Vec<ChannelStats>,
}

// ============================================================================
// Pipeline Context
// ============================================================================

/// Montage-dependent state shared by every run
#[derive(Clone, Debug)]
pub struct PipelineContext {
    config: ImageConfig,
    layout: SensorLayout2D,
    plan: InterpolationPlan,
}

impl PipelineContext {
    /// Project a 3D montage and build the interpolation plan.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid config, a degenerate montage, or a
    /// layout that cannot be triangulated.
    pub fn new(positions: &[SensorPosition], config: ImageConfig) -> PipelineResult<Self> {
        config.validate()?;
        let layout = project_layout(positions)?;
        Self::with_layout(layout, config)
    }

    /// Build the interpolation plan for an already projected layout.
    ///
    /// # Errors
    ///
    /// See [`PipelineContext::new`].
    pub fn with_layout(layout: SensorLayout2D, config: ImageConfig) -> PipelineResult<Self> {
        config.validate()?;

        let mesh_layout = if config.edgeless {
            pad_layout(&layout)?
        } else {
            layout.clone()
        };
        let bounds = mesh_layout
            .bounding_box()
            .ok_or(LayoutError::TooFewSensors { got: 0 })?;
        let grid = Grid::new(bounds, config.n_gridpoints)?;
        let plan = InterpolationPlan::new(mesh_layout.points(), grid)?;

        debug!(
            "Pipeline context: {} electrodes, {} mesh points, {}x{} grid",
            layout.len(),
            plan.n_sensors(),
            config.n_gridpoints,
            config.n_gridpoints
        );

        Ok(Self {
            config,
            layout,
            plan,
        })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Projected layout, without padding electrodes
    #[must_use]
    pub fn layout(&self) -> &SensorLayout2D {
        &self.layout
    }

    /// Sampling grid
    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.plan.grid()
    }

    /// Interpolation plan over the (possibly padded) layout
    #[must_use]
    pub fn plan(&self) -> &InterpolationPlan {
        &self.plan
    }

    /// Number of real electrodes
    #[must_use]
    pub fn n_sensors(&self) -> usize {
        self.layout.len()
    }

    /// Turn a feature matrix into an image tensor.
    ///
    /// `features` is `(n_samples, n_channels × n_sensors)` with one contiguous
    /// column block per channel.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::NotDivisible`] when the column count does not
    /// fit the montage, or an augmentation error in PCA mode.
    pub fn generate(&self, features: &FeatureMatrix) -> PipelineResult<PipelineOutput> {
        let n_samples = features.nrows();
        let channels = split_channels(features, self.n_sensors())?;
        let n_channels = channels.len();
        let n = self.config.n_gridpoints;

        info!(
            "Generating images: {} samples x {} channels on {}x{} grid ({} electrodes{})",
            n_samples,
            n_channels,
            n,
            n,
            self.n_sensors(),
            if self.config.edgeless { ", edgeless" } else { "" }
        );

        let channels = self.prepare_channels(channels)?;

        // Sensor values per sample as contiguous columns
        let columns: Vec<ChannelFeatureSet> = channels.iter().map(|ch| ch.transpose()).collect();

        let cells = self.plan.grid().cell_count();
        let stack_len = n_samples * cells;
        let mut buffer = vec![UNDEFINED; n_channels * stack_len];

        let progress = Progress::new(n_samples * n_channels);
        let work = |(item, out): (usize, &mut [f64])| {
            let (channel, sample) = (item / n_samples, item % n_samples);
            let column = columns[channel].column(sample);
            self.plan.interpolate_into(column.as_slice(), out);
            progress.tick();
        };

        if cells > 0 && !buffer.is_empty() {
            if self.config.parallel {
                buffer.par_chunks_mut(cells).enumerate().for_each(&work);
            } else {
                buffer.chunks_mut(cells).enumerate().for_each(&work);
            }
        }

        let stats = if self.config.normalize {
            normalize_channels(&mut buffer, stack_len)
        } else if stack_len == 0 {
            Vec::new()
        } else {
            buffer.chunks(stack_len).map(channel_stats).collect()
        };
        for (c, s) in stats.iter().enumerate() {
            debug!(
                "Channel {c}: mean {:.4}, std {:.4}, {} defined cells",
                s.mean, s.std_dev, s.defined
            );
        }

        if let Some(value) = self.config.fill_undefined {
            fill_undefined(&mut buffer, value);
        }

        let images = ImageTensor::from_channel_stacks(&buffer, n_samples, n_channels, n)
            .ok_or(ShapeError::LengthMismatch {
                expected: n_samples * n_channels * cells,
                actual: buffer.len(),
            })?;

        info!(
            "Generated {:?} image tensor, {} undefined cells",
            images.shape(),
            images.undefined_count()
        );

        Ok(PipelineOutput {
            images,
            layout: self.layout.clone(),
            channel_stats: stats,
        })
    }

    /// Augment and pad channel blocks so they line up with the mesh
    fn prepare_channels(
        &self,
        channels: Vec<ChannelFeatureSet>,
    ) -> PipelineResult<Vec<ChannelFeatureSet>> {
        let mut prepared = Vec::with_capacity(channels.len());

        for (c, channel) in channels.into_iter().enumerate() {
            let channel = match self.config.augment_mode() {
                Some(mode) => {
                    let mut rng = match self.config.seed {
                        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(c as u64)),
                        None => StdRng::from_entropy(),
                    };
                    augment(&channel, mode, self.config.std_mult, &mut rng)?
                }
                None => channel,
            };

            let channel = if self.config.edgeless {
                pad_channel(channel)
            } else {
                channel
            };

            if channel.ncols() != self.plan.n_sensors() {
                return Err(ShapeError::LengthMismatch {
                    expected: self.plan.n_sensors(),
                    actual: channel.ncols(),
                }
                .into());
            }
            prepared.push(channel);
        }

        Ok(prepared)
    }
}

/// Project `positions` and generate images in one call.
///
/// # Errors
///
/// See [`PipelineContext::new`] and [`PipelineContext::generate`].
pub fn gen_images(
    positions: &[SensorPosition],
    features: &FeatureMatrix,
    config: ImageConfig,
) -> PipelineResult<PipelineOutput> {
    PipelineContext::new(positions, config)?.generate(features)
}

// ============================================================================
// Progress
// ============================================================================

/// Completed work-item counter, logged about every tenth of the job
struct Progress {
    done: AtomicUsize,
    total: usize,
    step: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            step: (total / 10).max(1),
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.total {
            info!("Interpolated {}/{} grids", done, self.total);
        }
    }
}
