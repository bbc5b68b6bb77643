use serde::{Deserialize, Serialize};

use crate::{render::Color, Result, SoundDeckError};

/// Top-level configuration structure for the visualizer engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Parses a configuration document provided by the embedding dashboard.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(input)
            .map_err(|err| SoundDeckError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section against the ranges the engine supports.
    pub fn validate(&self) -> Result<()> {
        self.analyzer.validate()?;
        self.render.validate()
    }
}

/// Configuration for the frequency analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Transform window size in samples. The snapshot exposes
    /// `fft_size / 2` frequency bins.
    pub fft_size: usize,
    /// Exponential time-smoothing constant applied to bin magnitudes
    /// between frames.
    pub smoothing: f32,
    /// Magnitude mapped to byte value 0.
    pub min_decibels: f32,
    /// Magnitude mapped to byte value 255.
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins a snapshot produced under this
    /// configuration will carry.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32_768).contains(&self.fft_size) {
            return Err(SoundDeckError::InvalidConfig(format!(
                "fft_size must be a power of two in [32, 32768], got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(SoundDeckError::InvalidConfig(format!(
                "smoothing must lie in [0, 1), got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(SoundDeckError::InvalidConfig(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Configuration for the per-frame rendering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Resting radius of the circular visualizer ring.
    pub base_radius: f32,
    /// Color the surface is cleared to at the start of every frame.
    pub background: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_radius: 80.0,
            background: Color::rgb(0x1a, 0x1a, 0x1a),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.base_radius.is_finite() || self.base_radius <= 0.0 {
            return Err(SoundDeckError::InvalidConfig(format!(
                "base_radius must be positive, got {}",
                self.base_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        AppConfig::default().validate().unwrap();
        assert_eq!(AnalyzerConfig::default().bin_count(), 128);
    }

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        let parsed = AppConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.analyzer.fft_size, 256);
        assert_eq!(parsed.render.base_radius, 80.0);
    }

    #[test]
    fn rejects_non_power_of_two_fft_size() {
        let mut config = AppConfig::default();
        config.analyzer.fft_size = 300;
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("fft_size"));
    }

    #[test]
    fn rejects_out_of_range_smoothing() {
        let config = AnalyzerConfig {
            smoothing: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
