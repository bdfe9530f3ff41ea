//! thighmotion - Activity features from thigh-worn accelerometer recordings
//!
//! thighmotion turns one regularly sampled triaxial recording into nine summary
//! features through a deterministic pipeline: high-pass filtering → event
//! masking → windowed SMA → activity labels → bouts → log-normal fits.
//!
//! ## Modules
//!
//! - **Pipeline**: Per-recording outcomes and a batch driver that keeps going past failures
//! - **Stages**: `filter`, `masking`, `windowing`, `activity`, `distribution`, `features`

pub mod activity;
pub mod config;
pub mod distribution;
pub mod error;
pub mod features;
pub mod filter;
pub mod masking;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod windowing;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{HighPassConfig, PipelineConfig};
pub use error::ComputeError;
pub use features::{ActivityProfile, FeatureComputer};
pub use pipeline::{
    extract_features, process_batch, process_recording, recording_to_features_json, FeatureRow,
    RecordingFailure, RecordingOutcome,
};

// Schema exports
pub use schema::{RecordingAdapter, RecordingInput, SCHEMA_VERSION};

pub use types::{Event, EventList, FeatureVector, Series, Side, FEATURE_NAMES};

/// thighmotion version
pub const THIGHMOTION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "thighmotion";
