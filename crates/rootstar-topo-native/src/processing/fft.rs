//! FFT-based spectral analysis
//!
//! Provides power spectra and band power extraction for raw EEG epochs.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use rootstar_topo_core::types::EegBand;

use crate::error::{PipelineError, PipelineResult};

/// FFT-based spectral analyzer
pub struct SpectralAnalyzer {
    fft_size: usize,
    sample_rate: f64,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    ///
    /// # Arguments
    ///
    /// * `fft_size` - FFT size (epoch length in samples)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a zero `fft_size` or a
    /// non-positive sample rate.
    pub fn new(fft_size: usize, sample_rate: f64) -> PipelineResult<Self> {
        if fft_size == 0 {
            return Err(PipelineError::InvalidConfig {
                parameter: "fft_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(PipelineError::InvalidConfig {
                parameter: "sample_rate",
                reason: format!("must be finite and positive, got {sample_rate}"),
            });
        }

        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            fft_size,
            sample_rate,
            fft,
            window: hann_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        })
    }

    /// FFT size in samples
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency resolution (Hz per bin)
    #[must_use]
    pub fn frequency_resolution(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    /// Compute power spectrum from time-domain samples
    ///
    /// Returns power spectral density (magnitude squared) for the
    /// non-negative frequencies. Only the first `fft_size` samples are used.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientData`] for a short input.
    pub fn compute_psd(&mut self, samples: &[f64]) -> PipelineResult<Vec<f64>> {
        if samples.len() < self.fft_size {
            return Err(PipelineError::InsufficientData {
                got: samples.len(),
                need: self.fft_size,
            });
        }

        for (slot, (&s, &w)) in self.buffer.iter_mut().zip(samples.iter().zip(&self.window)) {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n_freqs = self.fft_size / 2 + 1;
        let norm = 1.0 / (self.fft_size as f64).powi(2);

        Ok(self.buffer[..n_freqs]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im) * norm)
            .collect())
    }

    /// Summed power over a frequency range (bins overlapping `[low, high]`)
    ///
    /// An empty spectrum or a reversed range has zero power.
    #[must_use]
    pub fn band_power(&self, psd: &[f64], low_hz: f64, high_hz: f64) -> f64 {
        if psd.is_empty() || !(low_hz <= high_hz) {
            return 0.0;
        }
        let freq_res = self.frequency_resolution();
        let last = psd.len() - 1;
        let start_bin = ((low_hz / freq_res).floor() as usize).min(last);
        let end_bin = ((high_hz / freq_res).ceil() as usize).min(last);

        psd[start_bin..=end_bin].iter().sum()
    }

    /// Extract power for a standard EEG band
    #[must_use]
    pub fn eeg_band_power(&self, psd: &[f64], band: EegBand) -> f64 {
        let (low, high) = band.range_hz();
        self.band_power(psd, low, high)
    }
}

/// Generate Hann window coefficients
fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectral_analyzer() {
        let mut analyzer = SpectralAnalyzer::new(256, 250.0).unwrap();

        // Generate 10 Hz sine wave
        let samples: Vec<f64> = (0..256)
            .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / 250.0).sin())
            .collect();

        let psd = analyzer.compute_psd(&samples).unwrap();

        // Alpha should contain most of the power for a 10 Hz signal
        let alpha_power = analyzer.eeg_band_power(&psd, EegBand::Alpha);
        let total_power: f64 = psd.iter().sum();
        assert!(alpha_power > total_power * 0.5);
    }

    #[test]
    fn test_short_input_rejected() {
        let mut analyzer = SpectralAnalyzer::new(128, 250.0).unwrap();
        assert!(matches!(
            analyzer.compute_psd(&[0.0; 64]),
            Err(PipelineError::InsufficientData { got: 64, need: 128 })
        ));
    }

    #[test]
    fn test_band_power_clamps_to_nyquist() {
        let analyzer = SpectralAnalyzer::new(64, 100.0).unwrap();
        let psd = vec![1.0; 33];
        // Gamma extends to 100 Hz, beyond the 50 Hz Nyquist limit
        let gamma = analyzer.eeg_band_power(&psd, EegBand::Gamma);
        assert!(gamma > 0.0 && gamma <= 33.0);
    }

    #[test]
    fn test_reversed_band_is_empty() {
        let analyzer = SpectralAnalyzer::new(64, 100.0).unwrap();
        let psd = vec![1.0; 33];
        assert_eq!(analyzer.band_power(&psd, 30.0, 10.0), 0.0);
        assert_eq!(analyzer.band_power(&psd, f64::NAN, 10.0), 0.0);
        assert_eq!(analyzer.band_power(&[], 1.0, 10.0), 0.0);
        // A single-point band still covers its bin
        assert!(analyzer.band_power(&psd, 10.0, 10.0) > 0.0);
    }

    #[test]
    fn test_zero_fft_size_rejected() {
        assert!(matches!(
            SpectralAnalyzer::new(0, 250.0),
            Err(PipelineError::InvalidConfig { parameter: "fft_size", .. })
        ));
        assert!(matches!(
            SpectralAnalyzer::new(64, 0.0),
            Err(PipelineError::InvalidConfig { parameter: "sample_rate", .. })
        ));
    }

    #[test]
    fn test_single_sample_fft() {
        let mut analyzer = SpectralAnalyzer::new(1, 250.0).unwrap();
        let psd = analyzer.compute_psd(&[2.0]).unwrap();
        assert_eq!(psd.len(), 1);
        assert!((psd[0] - 4.0).abs() < 1e-12);
    }
}
