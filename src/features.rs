//! Feature computation
//!
//! This module runs one recording through the processing stages and derives the
//! summary features:
//! - High-pass filtering and event masking
//! - Windowed SMA, activity labels and bouts
//! - Availability-corrected activity rates
//! - Log-normal fits of bout intensity and duration

use tracing::debug;

use crate::activity::{classify, segment_bouts};
use crate::config::PipelineConfig;
use crate::distribution::fit_log_normal;
use crate::error::ComputeError;
use crate::filter::HighPassFilter;
use crate::masking::apply_events;
use crate::types::{Bout, EventList, FeatureVector, Series, WindowedSma};
use crate::windowing::windowed_sma;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Intermediate per-window view of one recording
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityProfile {
    /// Sample count before clipping
    pub unclipped_len: usize,
    /// Samples flagged invalid after masking
    pub invalid_count: usize,
    /// 1 - invalid / unclipped sample count
    pub availability: f64,
    pub sma: WindowedSma,
    pub labels: Vec<bool>,
    pub bouts: Vec<Bout>,
}

impl ActivityProfile {
    pub fn active_windows(&self) -> usize {
        self.labels.iter().filter(|l| **l).count()
    }
}

/// Computes the feature vector for one recording.
///
/// Holds only the configuration and the designed filter, so repeated calls on
/// the same input give identical results.
#[derive(Debug, Clone)]
pub struct FeatureComputer {
    config: PipelineConfig,
    filter: Option<HighPassFilter>,
}

impl FeatureComputer {
    /// Validate the configuration and design the high-pass filter
    pub fn new(config: PipelineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let filter = config
            .high_pass
            .as_ref()
            .map(|hp| HighPassFilter::design(hp, config.sampling_rate_hz))
            .transpose()?;

        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compute the feature vector for a series and its optional events
    pub fn compute(
        &self,
        series: &Series,
        events: Option<&EventList>,
    ) -> Result<FeatureVector, ComputeError> {
        let profile = self.profile(series, events)?;
        self.summarize(&profile)
    }

    /// Run the per-window stages without summarizing
    pub fn profile(
        &self,
        series: &Series,
        events: Option<&EventList>,
    ) -> Result<ActivityProfile, ComputeError> {
        series.validate()?;
        if series.sampling_rate_hz != self.config.sampling_rate_hz {
            return Err(ComputeError::SamplingRateMismatch {
                series_hz: series.sampling_rate_hz,
                config_hz: self.config.sampling_rate_hz,
            });
        }

        // Filter the whole series once, before masking
        let filtered = match &self.filter {
            Some(filter) => filter.filter_series(series)?,
            None => series.clone(),
        };

        let masked = apply_events(filtered, events);
        let sma = windowed_sma(
            &masked,
            self.config.window_length_s,
            self.config.samples_per_window(),
        );
        let labels = classify(&sma, self.config.activity_threshold);
        let bouts = segment_bouts(&labels, &sma);

        debug!(
            samples = masked.unclipped_len,
            windows = sma.len(),
            active = labels.iter().filter(|l| **l).count(),
            bouts = bouts.len(),
            "built activity profile"
        );

        Ok(ActivityProfile {
            unclipped_len: masked.unclipped_len,
            invalid_count: masked.invalid_count(),
            availability: masked.availability,
            sma,
            labels,
            bouts,
        })
    }

    /// Derive the feature vector from a profile
    pub fn summarize(&self, profile: &ActivityProfile) -> Result<FeatureVector, ComputeError> {
        let fs = self.config.sampling_rate_hz;
        let window_length_s = self.config.window_length_s;

        let recording_duration = profile.unclipped_len as f64 / fs / SECONDS_PER_HOUR;
        let cut_duration = profile.invalid_count as f64 / fs / SECONDS_PER_HOUR;

        let intensity_general = mean(profile.sma.valid_values());

        // Window-count correction: rounded available windows
        let available_windows = (profile.availability * profile.sma.len() as f64).round_ties_even();
        let activity_percentage = ratio(
            100.0 * profile.active_windows() as f64,
            available_windows,
        );

        // Wall-clock correction: available hours
        let active_bouts_per_hour = ratio(
            profile.bouts.len() as f64,
            profile.availability * recording_duration,
        );

        let intensities: Vec<f64> = profile.bouts.iter().map(Bout::mean_intensity).collect();
        let durations: Vec<f64> = profile
            .bouts
            .iter()
            .map(|b| b.duration_s(window_length_s))
            .collect();

        let intensity_fit = fit_log_normal(&intensities)?;
        let duration_fit = fit_log_normal(&durations)?;

        Ok(FeatureVector {
            recording_duration,
            cut_duration,
            intensity_general,
            activity_percentage,
            active_bouts_per_hour,
            intensity_active_log_mean: intensity_fit.map(|f| f.log_mean),
            intensity_active_variability: intensity_fit.map(|f| f.log_std),
            duration_active_log_mean: duration_fit.map(|f| f.log_mean),
            duration_active_variability: duration_fit.map(|f| f.log_std),
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}
