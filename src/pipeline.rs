//! Pipeline orchestration
//!
//! This module provides the public API for thighmotion. It runs recordings
//! through the feature pipeline and reports each one as an explicit outcome, so
//! a batch driver can carry on past recordings that fail.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::ComputeError;
use crate::features::FeatureComputer;
use crate::schema::RecordingInput;
use crate::types::{EventList, FeatureVector, Series, Side};

/// Compute the features of one series (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let features = extract_features(&series, None, &PipelineConfig::default())?;
/// ```
pub fn extract_features(
    series: &Series,
    events: Option<&EventList>,
    config: &PipelineConfig,
) -> Result<FeatureVector, ComputeError> {
    FeatureComputer::new(config.clone())?.compute(series, events)
}

/// Convert a recording JSON document to a feature row JSON document.
///
/// # Arguments
/// * `recording_json` - A thigh.recording.v1 document
/// * `config` - Pipeline configuration
///
/// # Returns
/// Feature row JSON
pub fn recording_to_features_json(
    recording_json: &str,
    config: &PipelineConfig,
) -> Result<String, ComputeError> {
    let recording: RecordingInput = serde_json::from_str(recording_json)?;
    let computer = FeatureComputer::new(config.clone())?;
    let row = compute_row(&computer, &recording)?;
    Ok(serde_json::to_string(&row)?)
}

/// Features of one recording, tagged with its identifier and side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub recording_id: String,
    pub side: Side,
    #[serde(flatten)]
    pub features: FeatureVector,
}

/// Why a recording produced no features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingFailure {
    pub recording_id: String,
    pub side: Side,
    pub reason: String,
}

/// Result of running one recording through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordingOutcome {
    Success(FeatureRow),
    Failure(RecordingFailure),
}

impl RecordingOutcome {
    pub fn recording_id(&self) -> &str {
        match self {
            RecordingOutcome::Success(row) => &row.recording_id,
            RecordingOutcome::Failure(failure) => &failure.recording_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecordingOutcome::Success(_))
    }

    pub fn features(&self) -> Option<&FeatureVector> {
        match self {
            RecordingOutcome::Success(row) => Some(&row.features),
            RecordingOutcome::Failure(_) => None,
        }
    }
}

fn compute_row(
    computer: &FeatureComputer,
    recording: &RecordingInput,
) -> Result<FeatureRow, ComputeError> {
    let events = recording.event_list()?;
    let features = computer.compute(&recording.series, events.as_ref())?;

    Ok(FeatureRow {
        recording_id: recording.recording_id.clone(),
        side: recording.side,
        features,
    })
}

/// Run one recording, folding any error into a failure outcome
pub fn process_recording(computer: &FeatureComputer, recording: &RecordingInput) -> RecordingOutcome {
    match compute_row(computer, recording) {
        Ok(row) => {
            debug!(recording_id = %row.recording_id, "computed features");
            RecordingOutcome::Success(row)
        }
        Err(e) => {
            warn!(
                recording_id = %recording.recording_id,
                side = recording.side.as_str(),
                error = %e,
                "skipping recording"
            );
            RecordingOutcome::Failure(RecordingFailure {
                recording_id: recording.recording_id.clone(),
                side: recording.side,
                reason: e.to_string(),
            })
        }
    }
}

/// Run every recording, continuing past failures.
///
/// Only an invalid configuration aborts the batch.
pub fn process_batch<'a>(
    recordings: impl IntoIterator<Item = &'a RecordingInput>,
    config: &PipelineConfig,
) -> Result<Vec<RecordingOutcome>, ComputeError> {
    let computer = FeatureComputer::new(config.clone())?;
    let outcomes: Vec<RecordingOutcome> = recordings
        .into_iter()
        .map(|recording| process_recording(&computer, recording))
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(
        recordings = outcomes.len(),
        failed,
        "batch finished"
    );

    Ok(outcomes)
}
