//! Compute features for a synthetic one-hour recording
//!
//! Gravity sits on the z axis throughout; three walking-like bursts (2 Hz
//! oscillation on x) of 30, 60 and 90 seconds are spread over the hour.

use chrono::{TimeZone, Utc};
use std::f64::consts::PI;
use thighmotion::{extract_features, FeatureVector, PipelineConfig, Series, FEATURE_NAMES};

fn main() {
    let fs = 50.0;
    let bursts = [(600.0, 30.0), (1800.0, 60.0), (3000.0, 90.0)];

    let samples: Vec<[f64; 3]> = (0..(3600.0 * fs) as usize)
        .map(|i| {
            let t = i as f64 / fs;
            let moving = bursts
                .iter()
                .any(|&(start, length)| t >= start && t < start + length);
            let x = if moving { 0.5 * (2.0 * PI * 2.0 * t).sin() } else { 0.0 };
            [x, 0.0, 9.81]
        })
        .collect();

    let Some(start) = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).single() else {
        eprintln!("Error: invalid start time");
        return;
    };
    let series = match Series::new(start, fs, samples) {
        Ok(series) => series,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return;
        }
    };

    match extract_features(&series, None, &PipelineConfig::default()) {
        Ok(features) => print_features(&features),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}

fn print_features(features: &FeatureVector) {
    for (name, value) in FEATURE_NAMES.iter().zip(features.to_array()) {
        println!("{name:>28}: {value:.4}");
    }
}
