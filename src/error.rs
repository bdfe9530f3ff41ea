//! Error types for thighmotion

use thiserror::Error;

/// Errors that can occur during feature computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse recording: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed event list: {0}")]
    MalformedEvents(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sampling rate mismatch: series is {series_hz} Hz, pipeline expects {config_hz} Hz")]
    SamplingRateMismatch { series_hz: f64, config_hz: f64 },

    #[error("Irregular sampling: {0}")]
    IrregularSampling(String),

    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    #[error("Log-normal fit requires positive values, got {0}")]
    NonPositiveValue(f64),
}
