use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{AnalyzerConfig, Result};

/// Frequency-domain magnitudes for one animation frame.
///
/// One byte per bin, 0 = silence, 255 = the analyzer's `max_decibels`
/// ceiling. The length is fixed for the lifetime of the analyzer that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencySnapshot {
    bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn zeroed(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Arithmetic mean of all bins, 0.0 for an empty snapshot.
    pub fn mean_magnitude(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.bins.iter().map(|&b| u32::from(b)).sum();
        sum as f32 / self.bins.len() as f32
    }
}

/// Periodic frequency analysis over fixed-size sample windows.
///
/// The bin count (`fft_size / 2`) is locked in at construction. Sampling is
/// non-blocking and read-only with respect to the audio graph: whatever block
/// the source currently holds is windowed, transformed and mapped onto byte
/// magnitudes. Silent or missing input simply decays the smoothed spectrum
/// towards zero.
pub struct FrequencyAnalyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    smoothed: Vec<f32>,
}

impl FrequencyAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let mut planner = RealFftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        let smoothed = vec![0.0; config.bin_count()];
        Ok(Self {
            config,
            fft,
            input,
            spectrum,
            scratch,
            smoothed,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Number of bins in every snapshot this analyzer emits.
    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Transforms the most recent sample block into a frequency snapshot.
    ///
    /// A block shorter than the transform window is treated as silence-padded
    /// at the front; samples beyond the window are ignored. This never fails:
    /// if the transform itself reports an error the previous (stale) spectrum
    /// is re-emitted.
    pub fn sample(&mut self, block: &[f32]) -> FrequencySnapshot {
        let n = self.config.fft_size;
        for (i, slot) in self.input.iter_mut().enumerate() {
            let value = block.get(i).copied().unwrap_or(0.0);
            *slot = value * hann_value(i, n);
        }

        if let Err(err) =
            self.fft
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
        {
            tracing::warn!(%err, "fft pass failed, re-emitting stale snapshot");
            return self.snapshot();
        }

        let tau = self.config.smoothing;
        for (k, slot) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.spectrum[k].norm() / n as f32;
            *slot = tau * *slot + (1.0 - tau) * magnitude;
        }

        self.snapshot()
    }

    /// Maps the smoothed spectrum onto bytes: dB relative to full scale,
    /// scaled linearly from `min_decibels`..`max_decibels` onto 0..255.
    fn snapshot(&self) -> FrequencySnapshot {
        let min = self.config.min_decibels;
        let span = self.config.max_decibels - min;
        let bins = self
            .smoothed
            .iter()
            .map(|&magnitude| {
                if magnitude <= 0.0 {
                    return 0;
                }
                let db = 20.0 * magnitude.log10();
                let scaled = (db - min) / span * 255.0;
                scaled.clamp(0.0, 255.0).round() as u8
            })
            .collect();
        FrequencySnapshot { bins }
    }
}

impl fmt::Debug for FrequencyAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyAnalyzer")
            .field("config", &self.config)
            .field("bin_count", &self.smoothed.len())
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
