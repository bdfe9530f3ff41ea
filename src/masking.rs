//! Event-driven gap masking
//!
//! Clips a filtered series to the span delimited by its event list and flags
//! samples inside interior events as invalid.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{EventList, MaskedSeries, Series};

/// Apply optional exclusion events to a filtered series.
///
/// Without events the series passes through untouched with availability 1.
/// Interval bounds are inclusive on both ends.
pub fn apply_events(series: Series, events: Option<&EventList>) -> MaskedSeries {
    let events = match events {
        Some(events) => events,
        None => return MaskedSeries::unmasked(series),
    };

    let unclipped_len = series.len();
    let span = events.span();
    let first = first_at_or_after(&series, span.start);
    let end = first_after(&series, span.end).max(first);

    let clip_start = series.timestamp(first);
    let samples = series.samples[first..end].to_vec();
    let mut valid = vec![true; samples.len()];

    for event in events.interior() {
        let from = first_at_or_after(&series, event.start).clamp(first, end);
        let to = first_after(&series, event.end).clamp(from, end);
        valid[from - first..to - first].fill(false);
    }

    let invalid = valid.iter().filter(|v| !**v).count();
    let availability = if unclipped_len == 0 {
        1.0
    } else {
        1.0 - invalid as f64 / unclipped_len as f64
    };

    debug!(
        unclipped = unclipped_len,
        retained = samples.len(),
        invalid,
        availability,
        "applied exclusion events"
    );

    MaskedSeries {
        start: clip_start,
        sampling_rate_hz: series.sampling_rate_hz,
        samples,
        valid,
        unclipped_len,
        availability,
    }
}

/// Index of the first sample with timestamp >= `t`, or `len` if none
fn first_at_or_after(series: &Series, t: DateTime<Utc>) -> usize {
    partition_point(series.len(), |i| series.timestamp(i) < t)
}

/// Index of the first sample with timestamp > `t`, or `len` if none
fn first_after(series: &Series, t: DateTime<Utc>) -> usize {
    partition_point(series.len(), |i| series.timestamp(i) <= t)
}

/// Binary search over `0..len` for the first index where `pred` turns false
fn partition_point(len: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
