//! thigh.recording.v1 document

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::types::{Event, EventList, Series, Side};

/// Schema version identifier
pub const SCHEMA_VERSION: &str = "thigh.recording.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// One recording ready for feature extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingInput {
    /// Schema version identifier
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Identifier the features are reported under
    pub recording_id: String,
    /// Thigh the sensor was worn on
    #[serde(default)]
    pub side: Side,
    /// Regularly sampled acceleration
    pub series: Series,
    /// Exclusion events; first and last delimit the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
}

impl RecordingInput {
    /// Create a recording without exclusion events
    pub fn new(recording_id: impl Into<String>, side: Side, series: Series) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            recording_id: recording_id.into(),
            side,
            series,
            events: None,
        }
    }

    /// Attach exclusion events
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the checked event list, if the recording has events
    pub fn event_list(&self) -> Result<Option<EventList>, ComputeError> {
        self.events.clone().map(EventList::new).transpose()
    }

    /// Validate the document without computing features
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.recording_id.trim().is_empty() {
            return Err(ValidationError::MissingRecordingId);
        }

        self.series
            .validate()
            .map_err(|e| ValidationError::InvalidSeries(e.to_string()))?;

        self.event_list()
            .map_err(|e| ValidationError::InvalidEvents(e.to_string()))?;

        Ok(())
    }
}

/// Validation errors for recording documents
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Recording identifier is empty")]
    MissingRecordingId,

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Invalid events: {0}")]
    InvalidEvents(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series() -> Series {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        Series::new(start, 10.0, vec![[0.0, 0.0, 1.0]; 100]).unwrap()
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{
            "recording_id": "P01_day2",
            "series": {
                "start": "2024-01-15T08:00:00Z",
                "sampling_rate_hz": 10.0,
                "samples": [[0.0, 0.1, 0.98], [0.01, 0.1, 0.97]]
            }
        }"#;

        let recording: RecordingInput = serde_json::from_str(json).unwrap();
        assert_eq!(recording.schema_version, SCHEMA_VERSION);
        assert_eq!(recording.side, Side::Unknown);
        assert_eq!(recording.series.len(), 2);
        assert!(recording.events.is_none());
        assert!(recording.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_events() {
        let json = r#"{
            "schema_version": "thigh.recording.v1",
            "recording_id": "P02",
            "side": "left",
            "series": {
                "start": "2024-01-15T08:00:00Z",
                "sampling_rate_hz": 10.0,
                "samples": []
            },
            "events": [
                {"start": "2024-01-15T08:00:00Z", "end": "2024-01-15T08:00:01Z"},
                {"start": "2024-01-15T09:00:00Z", "end": "2024-01-15T09:00:01Z"}
            ]
        }"#;

        let recording: RecordingInput = serde_json::from_str(json).unwrap();
        assert_eq!(recording.side, Side::Left);
        assert_eq!(recording.event_list().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_reports_malformed_events() {
        let t = series().start;
        let recording = RecordingInput::new("P03", Side::Right, series())
            .with_events(vec![Event::new(t, t + Duration::seconds(1))]);

        assert!(matches!(
            recording.validate(),
            Err(ValidationError::InvalidEvents(_))
        ));
        assert!(matches!(
            recording.event_list(),
            Err(ComputeError::MalformedEvents(_))
        ));
    }

    #[test]
    fn test_validate_schema_version() {
        let mut recording = RecordingInput::new("P04", Side::Left, series());
        recording.schema_version = "thigh.recording.v0".to_string();
        assert!(matches!(
            recording.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validate_empty_id() {
        let recording = RecordingInput::new("  ", Side::Left, series());
        assert!(matches!(
            recording.validate(),
            Err(ValidationError::MissingRecordingId)
        ));
    }

    #[test]
    fn test_validate_non_finite_sample() {
        let mut recording = RecordingInput::new("P05", Side::Left, series());
        recording.series.samples[4][0] = f64::INFINITY;
        assert!(matches!(
            recording.validate(),
            Err(ValidationError::InvalidSeries(_))
        ));
    }
}
