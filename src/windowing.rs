//! Disjoint-window signal magnitude area
//!
//! SMA per window = trapezoidal integral of |x| + |y| + |z| over the window's
//! sample-time axis, divided by the window length. Windows never overlap and a
//! trailing partial window is dropped.

use crate::types::{MaskedSeries, WindowedSma};

/// Compute one SMA value per full window of `samples_per_window` samples.
///
/// A window containing any invalid sample yields `None`.
pub fn windowed_sma(
    series: &MaskedSeries,
    window_length_s: f64,
    samples_per_window: usize,
) -> WindowedSma {
    let dt = 1.0 / series.sampling_rate_hz;

    let values = series
        .samples
        .chunks_exact(samples_per_window)
        .zip(series.valid.chunks_exact(samples_per_window))
        .map(|(window, valid)| {
            if valid.iter().all(|v| *v) {
                Some(trapezoid(window, dt) / window_length_s)
            } else {
                None
            }
        })
        .collect();

    WindowedSma {
        window_length_s,
        samples_per_window,
        values,
    }
}

fn magnitude_sum(sample: &[f64; 3]) -> f64 {
    sample[0].abs() + sample[1].abs() + sample[2].abs()
}

fn trapezoid(window: &[[f64; 3]], dt: f64) -> f64 {
    window
        .windows(2)
        .map(|pair| (magnitude_sum(&pair[0]) + magnitude_sum(&pair[1])) * dt / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Series;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn masked(samples: Vec<[f64; 3]>, fs: f64) -> MaskedSeries {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        MaskedSeries::unmasked(Series::new(start, fs, samples).unwrap())
    }

    #[test]
    fn test_length_is_floor_of_samples_over_window() {
        for len in [0, 9, 10, 11, 49, 50, 51, 99] {
            let sma = windowed_sma(&masked(vec![[0.0; 3]; len], 10.0), 1.0, 10);
            assert_eq!(sma.len(), len / 10, "len {len}");
        }
    }

    #[test]
    fn test_constant_axes() {
        // N samples span (N - 1) sample intervals of the window's time axis
        let sma = windowed_sma(&masked(vec![[0.5, -0.25, 1.0]; 100], 10.0), 5.0, 50);
        assert_eq!(sma.len(), 2);
        for value in &sma.values {
            let expected = 1.75 * 49.0 / 50.0;
            assert!((value.unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trapezoid_of_ramp() {
        // |x| ramps 0..=4 over 5 samples at 1 Hz: integral = 8, window = 4 s
        let samples = (0..5).map(|i| [i as f64, 0.0, 0.0]).collect();
        let sma = windowed_sma(&masked(samples, 1.0), 4.0, 5);
        assert_eq!(sma.values, vec![Some(2.0)]);
    }

    #[test]
    fn test_negative_values_use_magnitude() {
        let pos = windowed_sma(&masked(vec![[1.0, 2.0, 3.0]; 20], 10.0), 2.0, 20);
        let neg = windowed_sma(&masked(vec![[-1.0, -2.0, -3.0]; 20], 10.0), 2.0, 20);
        assert_eq!(pos.values, neg.values);
    }

    #[test]
    fn test_single_invalid_sample_invalidates_window() {
        let mut series = masked(vec![[100.0; 3]; 30], 10.0);
        series.valid[14] = false;

        let sma = windowed_sma(&series, 1.0, 10);
        assert!(sma.values[0].is_some());
        assert_eq!(sma.values[1], None);
        assert!(sma.values[2].is_some());
        assert_eq!(sma.valid_values().count(), 2);
    }

    #[test]
    fn test_invalid_in_discarded_tail_is_ignored() {
        let mut series = masked(vec![[1.0; 3]; 25], 10.0);
        series.valid[22] = false;

        let sma = windowed_sma(&series, 1.0, 10);
        assert_eq!(sma.len(), 2);
        assert!(sma.values.iter().all(|v| v.is_some()));
    }
}
