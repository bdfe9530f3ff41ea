//! Parsing and batch validation of recording documents

use crate::error::ComputeError;
use crate::schema::recording::*;

/// Adapter for reading recording documents
pub struct RecordingAdapter;

impl RecordingAdapter {
    /// Parse a JSON string holding a single recording or an array of them
    pub fn parse_json(json: &str) -> Result<Vec<RecordingInput>, ComputeError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(vec![serde_json::from_value(value)?])
        }
    }

    /// Parse NDJSON (newline-delimited JSON), one recording per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RecordingInput>, ComputeError> {
        let mut recordings = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RecordingInput>(trimmed) {
                Ok(recording) => recordings.push(recording),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(recordings)
    }

    /// Validate a batch of recordings, returning only the failures
    pub fn validate_recordings(recordings: &[RecordingInput]) -> Vec<ValidationResult> {
        recordings
            .iter()
            .enumerate()
            .filter_map(|(idx, recording)| {
                recording.validate().err().map(|error| ValidationResult {
                    index: idx,
                    recording_id: recording.recording_id.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A recording that failed validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub recording_id: String,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_OK: &str = r#"{"recording_id": "a", "series": {"start": "2024-01-15T08:00:00Z", "sampling_rate_hz": 10.0, "samples": [[0.0, 0.0, 1.0]]}}"#;
    const LINE_BAD_EVENTS: &str = r#"{"recording_id": "b", "series": {"start": "2024-01-15T08:00:00Z", "sampling_rate_hz": 10.0, "samples": []}, "events": [{"start": "2024-01-15T08:00:00Z", "end": "2024-01-15T08:00:01Z"}]}"#;

    #[test]
    fn test_parse_json_single_and_array() {
        assert_eq!(RecordingAdapter::parse_json(LINE_OK).unwrap().len(), 1);

        let array = format!("[{LINE_OK}, {LINE_BAD_EVENTS}]");
        let recordings = RecordingAdapter::parse_json(&array).unwrap();
        assert_eq!(recordings.len(), 2);
        assert_eq!(recordings[1].recording_id, "b");
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = format!("{LINE_OK}\n\n{LINE_BAD_EVENTS}\n");
        assert_eq!(RecordingAdapter::parse_ndjson(&ndjson).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = format!("{LINE_OK}\nnot json\n");
        let err = RecordingAdapter::parse_ndjson(&ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_validate_recordings_lists_failures() {
        let ndjson = format!("{LINE_OK}\n{LINE_BAD_EVENTS}");
        let recordings = RecordingAdapter::parse_ndjson(&ndjson).unwrap();

        let failures = RecordingAdapter::validate_recordings(&recordings);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].recording_id, "b");
        assert!(matches!(failures[0].error, ValidationError::InvalidEvents(_)));
    }
}
