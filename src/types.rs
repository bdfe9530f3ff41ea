//! Core types for the thighmotion pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the raw series, the exclusion events, the masked series, the
//! windowed SMA sequence, bouts, and the final feature vector.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Tolerance when checking explicit timestamps against the nominal grid (ns)
const TIMESTAMP_TOLERANCE_NS: i64 = 1_000;

/// Which thigh the sensor was worn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Unknown => "unknown",
        }
    }
}

/// Regularly sampled triaxial acceleration.
///
/// Sample `i` is taken at `start + i / sampling_rate_hz`. The timestamp axis is
/// implicit, so spacing is constant by construction and gaps can only be
/// expressed through masking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Timestamp of the first sample (UTC)
    pub start: DateTime<Utc>,
    /// Sampling rate (Hz)
    pub sampling_rate_hz: f64,
    /// Acceleration samples [x, y, z]
    pub samples: Vec<[f64; 3]>,
}

impl Series {
    /// Create a series, checking the sampling rate and sample values
    pub fn new(
        start: DateTime<Utc>,
        sampling_rate_hz: f64,
        samples: Vec<[f64; 3]>,
    ) -> Result<Self, ComputeError> {
        let series = Self {
            start,
            sampling_rate_hz,
            samples,
        };
        series.validate()?;
        Ok(series)
    }

    /// Build a series from explicitly timestamped rows.
    ///
    /// Rows must already sit on a regular `1 / sampling_rate_hz` grid; resampling
    /// is the importer's job.
    pub fn from_timestamped(
        rows: &[(DateTime<Utc>, [f64; 3])],
        sampling_rate_hz: f64,
    ) -> Result<Self, ComputeError> {
        let start = match rows.first() {
            Some((t, _)) => *t,
            None => {
                return Err(ComputeError::IrregularSampling(
                    "no samples to build a series from".to_string(),
                ))
            }
        };

        let series = Self::new(
            start,
            sampling_rate_hz,
            rows.iter().map(|(_, sample)| *sample).collect(),
        )?;

        for (index, (timestamp, _)) in rows.iter().enumerate() {
            let expected = series.timestamp(index);
            let drift = (*timestamp - expected).num_nanoseconds().unwrap_or(i64::MAX);
            if drift.abs() > TIMESTAMP_TOLERANCE_NS {
                return Err(ComputeError::IrregularSampling(format!(
                    "sample {} at {} is off the {} Hz grid (expected {})",
                    index, timestamp, sampling_rate_hz, expected
                )));
            }
        }

        Ok(series)
    }

    /// Check the invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate_hz
            )));
        }

        if let Some(index) = self
            .samples
            .iter()
            .position(|s| s.iter().any(|v| !v.is_finite()))
        {
            return Err(ComputeError::NonFiniteSample { index });
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample spacing in seconds
    pub fn sample_interval_s(&self) -> f64 {
        1.0 / self.sampling_rate_hz
    }

    /// Timestamp of sample `index`
    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        sample_timestamp(self.start, self.sampling_rate_hz, index)
    }

    /// Nominal duration covered by the samples, in hours
    pub fn duration_hours(&self) -> f64 {
        self.len() as f64 / self.sampling_rate_hz / 3600.0
    }
}

pub(crate) fn sample_timestamp(start: DateTime<Utc>, sampling_rate_hz: f64, index: usize) -> DateTime<Utc> {
    let offset_ns = (index as f64 * 1e9 / sampling_rate_hz).round() as i64;
    start + Duration::nanoseconds(offset_ns)
}

/// A closed time interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Event {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Ordered exclusion events for one recording.
///
/// The first event's start and the last event's end delimit the retained span.
/// Every event in between marks an interval to mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Event>", into = "Vec<Event>")]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    /// Create an event list, rejecting inconsistent input
    pub fn new(events: Vec<Event>) -> Result<Self, ComputeError> {
        if events.len() < 2 {
            return Err(ComputeError::MalformedEvents(format!(
                "need at least 2 events to delimit a recording, got {}",
                events.len()
            )));
        }

        for (index, event) in events.iter().enumerate() {
            if event.start > event.end {
                return Err(ComputeError::MalformedEvents(format!(
                    "event {} starts at {} after it ends at {}",
                    index, event.start, event.end
                )));
            }
        }

        if let Some(index) = events.windows(2).position(|pair| pair[1].start < pair[0].start) {
            return Err(ComputeError::MalformedEvents(format!(
                "events are not sorted by start time at index {}",
                index + 1
            )));
        }

        Ok(Self { events })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Retained span: first event's start to last event's end
    pub fn span(&self) -> Event {
        // At least two events are guaranteed by construction.
        let first = self.events[0];
        let last = self.events[self.events.len() - 1];
        Event::new(first.start, last.end)
    }

    /// Events strictly between the first and the last
    pub fn interior(&self) -> &[Event] {
        &self.events[1..self.events.len() - 1]
    }
}

impl TryFrom<Vec<Event>> for EventList {
    type Error = ComputeError;

    fn try_from(events: Vec<Event>) -> Result<Self, Self::Error> {
        Self::new(events)
    }
}

impl From<EventList> for Vec<Event> {
    fn from(list: EventList) -> Self {
        list.events
    }
}

/// Series after clipping and masking, with a validity flag per sample
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedSeries {
    /// Timestamp of the first retained sample
    pub start: DateTime<Utc>,
    /// Sampling rate (Hz)
    pub sampling_rate_hz: f64,
    /// Filtered acceleration samples; values under `valid == false` are meaningless
    pub samples: Vec<[f64; 3]>,
    /// Validity of each sample
    pub valid: Vec<bool>,
    /// Sample count of the series before clipping
    pub unclipped_len: usize,
    /// 1 - invalid / unclipped sample count
    pub availability: f64,
}

impl MaskedSeries {
    /// Wrap a series with every sample valid and nothing clipped
    pub fn unmasked(series: Series) -> Self {
        let len = series.len();
        Self {
            start: series.start,
            sampling_rate_hz: series.sampling_rate_hz,
            samples: series.samples,
            valid: vec![true; len],
            unclipped_len: len,
            availability: 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples flagged invalid
    pub fn invalid_count(&self) -> usize {
        self.valid.iter().filter(|v| !**v).count()
    }

    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        sample_timestamp(self.start, self.sampling_rate_hz, index)
    }
}

/// One SMA value per disjoint window; `None` marks a window touching masked data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSma {
    /// Window length (seconds)
    pub window_length_s: f64,
    /// Samples per window
    pub samples_per_window: usize,
    pub values: Vec<Option<f64>>,
}

impl WindowedSma {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterator over the valid SMA values
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

/// A maximal run of consecutive active windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bout {
    /// Index of the first member window
    pub first_window: usize,
    /// SMA of each member window, in order
    pub intensities: Vec<f64>,
}

impl Bout {
    /// Number of member windows
    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// Mean SMA over the member windows
    pub fn mean_intensity(&self) -> f64 {
        self.intensities.iter().sum::<f64>() / self.len() as f64
    }

    /// Bout duration in seconds
    pub fn duration_s(&self, window_length_s: f64) -> f64 {
        self.len() as f64 * window_length_s
    }
}

/// Log-normal parameters expressed in log space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalFit {
    /// Mean of ln(x)
    pub log_mean: f64,
    /// Maximum-likelihood standard deviation of ln(x)
    pub log_std: f64,
}

/// Feature names in export order
pub const FEATURE_NAMES: [&str; 9] = [
    "recording_duration",
    "cut_duration",
    "intensity_general",
    "activity_percentage",
    "active_bouts_per_hour",
    "intensity_active_log_mean",
    "intensity_active_variability",
    "duration_active_log_mean",
    "duration_active_variability",
];

/// Summary features for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Recording length before clipping (hours)
    pub recording_duration: f64,
    /// Masked time (hours)
    pub cut_duration: f64,
    /// Mean SMA over all valid windows
    pub intensity_general: Option<f64>,
    /// Share of available windows that are active (0-100)
    pub activity_percentage: Option<f64>,
    /// Bouts per available hour
    pub active_bouts_per_hour: Option<f64>,
    /// Log-mean of per-bout mean intensity
    pub intensity_active_log_mean: Option<f64>,
    /// Log-std of per-bout mean intensity
    pub intensity_active_variability: Option<f64>,
    /// Log-mean of bout duration (seconds)
    pub duration_active_log_mean: Option<f64>,
    /// Log-std of bout duration (seconds)
    pub duration_active_variability: Option<f64>,
}

impl FeatureVector {
    /// Flatten to the fixed export order, with NaN for undefined values
    pub fn to_array(&self) -> [f64; 9] {
        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
        [
            self.recording_duration,
            self.cut_duration,
            nan(self.intensity_general),
            nan(self.activity_percentage),
            nan(self.active_bouts_per_hour),
            nan(self.intensity_active_log_mean),
            nan(self.intensity_active_variability),
            nan(self.duration_active_log_mean),
            nan(self.duration_active_variability),
        ]
    }
}
