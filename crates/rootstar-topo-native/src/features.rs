//! Band-power feature extraction
//!
//! Turns raw multichannel EEG trials into the channel-major feature matrix
//! the imaging pipeline consumes: one block of per-electrode powers for each
//! frequency band, `[theta × n | alpha × n | beta × n]` by default.

use nalgebra::DMatrix;
use rootstar_topo_core::types::EegBand;
use rootstar_topo_core::ShapeError;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::fft::SpectralAnalyzer;
use crate::processing::split::FeatureMatrix;

/// One EEG trial, `(n_sensors, n_times)`
pub type Trial = DMatrix<f64>;

/// Per-band spectral power extractor
pub struct BandPowerExtractor {
    analyzer: SpectralAnalyzer,
    bands: Vec<EegBand>,
    sensor_buffer: Vec<f64>,
}

impl BandPowerExtractor {
    /// Extractor for the theta, alpha and beta image bands
    ///
    /// # Arguments
    ///
    /// * `n_times` - Time points per trial used for the FFT
    /// * `sample_rate` - EEG sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a zero `n_times` or a
    /// non-positive sample rate.
    pub fn new(n_times: usize, sample_rate: f64) -> PipelineResult<Self> {
        Self::with_bands(n_times, sample_rate, &EegBand::IMAGE_BANDS)
    }

    /// Extractor for an explicit band list, in output block order
    ///
    /// # Errors
    ///
    /// See [`BandPowerExtractor::new`].
    pub fn with_bands(n_times: usize, sample_rate: f64, bands: &[EegBand]) -> PipelineResult<Self> {
        Ok(Self {
            analyzer: SpectralAnalyzer::new(n_times, sample_rate)?,
            bands: bands.to_vec(),
            sensor_buffer: Vec::with_capacity(n_times),
        })
    }

    /// Bands in output block order
    #[must_use]
    pub fn bands(&self) -> &[EegBand] {
        &self.bands
    }

    /// Band powers of one trial, band-major (`bands × n_sensors` values).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientData`] when the trial is shorter
    /// than the FFT size.
    pub fn extract_trial(&mut self, trial: &Trial) -> PipelineResult<Vec<f64>> {
        let n_sensors = trial.nrows();
        let mut row = vec![0.0; self.bands.len() * n_sensors];

        for sensor in 0..n_sensors {
            self.sensor_buffer.clear();
            self.sensor_buffer.extend(trial.row(sensor).iter().copied());

            let psd = self.analyzer.compute_psd(&self.sensor_buffer)?;
            for (b, &band) in self.bands.iter().enumerate() {
                row[b * n_sensors + sensor] = self.analyzer.eeg_band_power(&psd, band);
            }
        }
        Ok(row)
    }

    /// Feature matrix with one row per trial.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientSamples`] for an empty trial set,
    /// [`ShapeError::LengthMismatch`] when trials disagree on electrode count,
    /// and [`PipelineError::InsufficientData`] for trials that are too short.
    pub fn extract(&mut self, trials: &[Trial]) -> PipelineResult<FeatureMatrix> {
        let first = trials
            .first()
            .ok_or(PipelineError::InsufficientSamples { got: 0, need: 1 })?;
        let n_sensors = first.nrows();
        let n_columns = self.bands.len() * n_sensors;

        let mut features = FeatureMatrix::zeros(trials.len(), n_columns);
        for (t, trial) in trials.iter().enumerate() {
            if trial.nrows() != n_sensors {
                return Err(ShapeError::LengthMismatch {
                    expected: n_sensors,
                    actual: trial.nrows(),
                }
                .into());
            }
            let row = self.extract_trial(trial)?;
            for (c, value) in row.into_iter().enumerate() {
                features[(t, c)] = value;
            }
        }

        debug!(
            "Extracted {} band powers for {} trials x {} electrodes",
            self.bands.len(),
            trials.len(),
            n_sensors
        );
        Ok(features)
    }
}
