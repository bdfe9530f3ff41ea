//! Pipeline configuration
//!
//! All constants the feature pipeline depends on travel in one explicit value so
//! the same core can run against several sensor setups.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Default sampling rate (Hz)
pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 50.0;

/// Default SMA window length (seconds)
pub const DEFAULT_WINDOW_LENGTH_S: f64 = 5.0;

/// Default SMA threshold separating active from inactive windows
pub const DEFAULT_ACTIVITY_THRESHOLD: f64 = 0.135;

/// Default Butterworth order
pub const DEFAULT_FILTER_ORDER: usize = 4;

/// Default high-pass cutoff (Hz)
pub const DEFAULT_CUTOFF_HZ: f64 = 0.2;

/// High-pass filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighPassConfig {
    /// Butterworth order
    pub order: usize,
    /// Cutoff frequency (Hz)
    pub cutoff_hz: f64,
}

impl Default for HighPassConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_FILTER_ORDER,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
        }
    }
}

/// Configuration for one feature extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Expected sampling rate of every input series (Hz)
    pub sampling_rate_hz: f64,
    /// SMA window length (seconds)
    pub window_length_s: f64,
    /// Windows with SMA strictly above this are active
    pub activity_threshold: f64,
    /// Gravity/drift removal; `None` for input that is already filtered
    pub high_pass: Option<HighPassConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            window_length_s: DEFAULT_WINDOW_LENGTH_S,
            activity_threshold: DEFAULT_ACTIVITY_THRESHOLD,
            high_pass: Some(HighPassConfig::default()),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Samples per SMA window, rounded half to even
    pub fn samples_per_window(&self) -> usize {
        (self.window_length_s * self.sampling_rate_hz).round_ties_even() as usize
    }

    /// Check that the configuration describes a usable pipeline
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "sampling_rate_hz must be positive, got {}",
                self.sampling_rate_hz
            )));
        }

        if !self.window_length_s.is_finite() || self.window_length_s <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "window_length_s must be positive, got {}",
                self.window_length_s
            )));
        }

        // Windows of a single sample have a zero-length integration axis.
        if self.samples_per_window() < 2 {
            return Err(ComputeError::InvalidConfig(format!(
                "a {} s window at {} Hz holds fewer than 2 samples",
                self.window_length_s, self.sampling_rate_hz
            )));
        }

        if !self.activity_threshold.is_finite() || self.activity_threshold < 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "activity_threshold must be non-negative, got {}",
                self.activity_threshold
            )));
        }

        if let Some(high_pass) = &self.high_pass {
            let nyquist = self.sampling_rate_hz / 2.0;
            if high_pass.order == 0 {
                return Err(ComputeError::InvalidConfig(
                    "high_pass.order must be at least 1".to_string(),
                ));
            }
            if !(high_pass.cutoff_hz > 0.0 && high_pass.cutoff_hz < nyquist) {
                return Err(ComputeError::InvalidConfig(format!(
                    "high_pass.cutoff_hz must lie in (0, {}), got {}",
                    nyquist, high_pass.cutoff_hz
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_window(), 250);
    }

    #[test]
    fn test_samples_per_window_rounds_half_to_even() {
        let config = PipelineConfig {
            sampling_rate_hz: 5.0,
            window_length_s: 2.5,
            ..Default::default()
        };
        // 12.5 rounds to 12
        assert_eq!(config.samples_per_window(), 12);
    }

    #[test]
    fn test_from_json_partial() {
        let config = PipelineConfig::from_json(r#"{"sampling_rate_hz": 10.0}"#).unwrap();
        assert_eq!(config.sampling_rate_hz, 10.0);
        assert_eq!(config.window_length_s, DEFAULT_WINDOW_LENGTH_S);
        assert_eq!(config.high_pass, Some(HighPassConfig::default()));
    }

    #[test]
    fn test_from_json_disable_filter() {
        let config = PipelineConfig::from_json(r#"{"high_pass": null}"#).unwrap();
        assert!(config.high_pass.is_none());
    }

    #[test]
    fn test_rejects_cutoff_above_nyquist() {
        let config = PipelineConfig {
            sampling_rate_hz: 10.0,
            high_pass: Some(HighPassConfig {
                order: 4,
                cutoff_hz: 5.0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ComputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_tiny_window() {
        let config = PipelineConfig {
            sampling_rate_hz: 1.0,
            window_length_s: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = PipelineConfig {
            activity_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let config = PipelineConfig {
            sampling_rate_hz: 20.0,
            window_length_s: 2.0,
            activity_threshold: 0.2,
            high_pass: None,
        };
        let parsed = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
