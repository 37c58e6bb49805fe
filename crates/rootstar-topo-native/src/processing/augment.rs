//! Feature augmentation
//!
//! Synthesizes training variability by perturbing a channel's
//! `(n_samples, n_sensors)` feature block:
//! - [`AugmentMode::Noise`]: independent Gaussian noise per feature, scaled
//!   by that feature's spread across samples
//! - [`AugmentMode::Pca`]: Gaussian noise along the top principal axes of
//!   the block, scaled by each component's spread

use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::StandardNormal;
use rootstar_topo_core::math::RunningStats;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::split::ChannelFeatureSet;

/// Augmentation strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AugmentMode {
    /// Per-feature Gaussian noise
    Noise,
    /// Noise in the space of the leading principal components
    Pca {
        /// Number of components kept
        n_components: usize,
    },
}

/// Apply one augmentation mode with noise scaled by `std_mult`.
///
/// # Errors
///
/// See [`augment_pca`]; noise mode cannot fail.
pub fn augment<R: Rng + ?Sized>(
    data: &ChannelFeatureSet,
    mode: AugmentMode,
    std_mult: f64,
    rng: &mut R,
) -> PipelineResult<ChannelFeatureSet> {
    match mode {
        AugmentMode::Noise => Ok(augment_noise(data, std_mult, rng)),
        AugmentMode::Pca { n_components } => augment_pca(data, std_mult, n_components, rng),
    }
}

/// Add `N(0, std_mult · σ_f)` noise to every value of feature column `f`.
///
/// σ_f is the population standard deviation of the column. Columns with no
/// spread, or `std_mult == 0`, are returned unchanged.
pub fn augment_noise<R: Rng + ?Sized>(
    data: &ChannelFeatureSet,
    std_mult: f64,
    rng: &mut R,
) -> ChannelFeatureSet {
    let mut out = data.clone();
    if std_mult == 0.0 {
        return out;
    }

    for mut column in out.column_iter_mut() {
        let mut stats = RunningStats::new();
        column.iter().for_each(|&v| stats.push(v));
        let scale = std_mult * stats.std_dev();
        if scale == 0.0 {
            continue;
        }
        for v in column.iter_mut() {
            let z: f64 = rng.sample(StandardNormal);
            *v += scale * z;
        }
    }
    out
}

/// Add noise along the leading `n_components` principal axes.
///
/// The block is centred and decomposed by SVD. For every sample, component
/// coefficients are drawn from `N(0, std_mult · σ_k)`, where σ_k is the
/// sample standard deviation of the data along axis k, then mapped back
/// through the axis loadings and added to the sample.
///
/// # Errors
///
/// Returns [`PipelineError::InsufficientSamples`] when there are fewer
/// samples than components, [`PipelineError::InvalidConfig`] for a rank of
/// zero or above the feature count, and [`PipelineError::Decomposition`] if
/// the SVD does not converge.
pub fn augment_pca<R: Rng + ?Sized>(
    data: &ChannelFeatureSet,
    std_mult: f64,
    n_components: usize,
    rng: &mut R,
) -> PipelineResult<ChannelFeatureSet> {
    let (n_samples, n_features) = data.shape();

    if n_components == 0 || n_components > n_features {
        return Err(PipelineError::InvalidConfig {
            parameter: "n_components",
            reason: format!("must be in 1..={n_features}, got {n_components}"),
        });
    }
    if n_samples < n_components {
        return Err(PipelineError::InsufficientSamples {
            got: n_samples,
            need: n_components,
        });
    }
    if std_mult == 0.0 || n_samples < 2 {
        return Ok(data.clone());
    }

    let means = data.row_mean();
    let mut centred = data.clone();
    for mut row in centred.row_iter_mut() {
        row -= &means;
    }

    let svd = centred
        .try_svd(false, true, f64::EPSILON, 0)
        .ok_or_else(|| PipelineError::Decomposition {
            operation: "pca",
            reason: "SVD did not converge".to_string(),
        })?;
    let v_t = svd.v_t.ok_or_else(|| PipelineError::Decomposition {
        operation: "pca",
        reason: "SVD returned no right singular vectors".to_string(),
    })?;

    // Leading axes by singular value, independent of the solver's ordering
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
    order.truncate(n_components);

    let denom = ((n_samples - 1) as f64).sqrt();
    let component_std: Vec<f64> = order.iter().map(|&k| svd.singular_values[k] / denom).collect();
    debug!("PCA augmentation: component std {:?}", component_std);

    let mut out = data.clone();
    let mut coeffs = DMatrix::<f64>::zeros(1, n_components);
    let loadings = DMatrix::from_fn(n_components, n_features, |r, c| v_t[(order[r], c)]);

    for mut row in out.row_iter_mut() {
        for (k, sigma) in component_std.iter().enumerate() {
            let z: f64 = rng.sample(StandardNormal);
            coeffs[(0, k)] = std_mult * sigma * z;
        }
        row += &coeffs * &loadings;
    }

    Ok(out)
}
