//! Butterworth high-pass filtering
//!
//! Removes the gravity and drift component from each acceleration axis. The
//! filter is designed with the bilinear transform (with frequency prewarping)
//! and realised as a cascade of second-order sections, run causally from rest.

use num_complex::Complex64;

use crate::config::HighPassConfig;
use crate::error::ComputeError;
use crate::types::Series;

/// One second-order section: `b0 + b1 z^-1 + b2 z^-2` over `1 + a1 z^-1 + a2 z^-2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Magnitude of the section's response at normalised frequency `w` (rad/sample)
    fn magnitude_at(&self, w: f64) -> f64 {
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let num = z1 * self.b[1] + z2 * self.b[2] + self.b[0];
        let den = z1 * self.a[1] + z2 * self.a[2] + self.a[0];
        (num.norm_sqr() / den.norm_sqr()).sqrt()
    }
}

/// Causal Butterworth high-pass filter
#[derive(Debug, Clone, PartialEq)]
pub struct HighPassFilter {
    sections: Vec<Biquad>,
}

impl HighPassFilter {
    /// Design a filter for the given sampling rate
    pub fn design(config: &HighPassConfig, sampling_rate_hz: f64) -> Result<Self, ComputeError> {
        let nyquist = sampling_rate_hz / 2.0;
        let wn = config.cutoff_hz / nyquist;
        if config.order == 0 || !(wn > 0.0 && wn < 1.0) {
            return Err(ComputeError::InvalidConfig(format!(
                "cannot design order {} high-pass at {} Hz for {} Hz sampling",
                config.order, config.cutoff_hz, sampling_rate_hz
            )));
        }

        Ok(Self {
            sections: butterworth_highpass_sections(config.order, wn),
        })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sampling_rate_hz: f64) -> f64 {
        let w = 2.0 * std::f64::consts::PI * freq_hz / sampling_rate_hz;
        self.sections.iter().map(|s| s.magnitude_at(w)).product()
    }

    /// Filter one channel from rest
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut signal = input.to_vec();
        for section in &self.sections {
            // Transposed direct form II
            let (mut s1, mut s2) = (0.0, 0.0);
            for x in signal.iter_mut() {
                let y = section.b[0] * *x + s1;
                s1 = section.b[1] * *x - section.a[1] * y + s2;
                s2 = section.b[2] * *x - section.a[2] * y;
                *x = y;
            }
        }
        signal
    }

    /// Filter each axis of a series independently
    pub fn filter_series(&self, series: &Series) -> Result<Series, ComputeError> {
        let mut samples = series.samples.clone();

        for axis in 0..3 {
            let channel: Vec<f64> = series.samples.iter().map(|s| s[axis]).collect();
            let filtered = self.apply(&channel);

            if let Some(index) = filtered.iter().position(|v| !v.is_finite()) {
                return Err(ComputeError::NumericInstability(format!(
                    "high-pass output diverged on axis {} at sample {}",
                    axis, index
                )));
            }

            for (sample, value) in samples.iter_mut().zip(filtered) {
                sample[axis] = value;
            }
        }

        Ok(Series {
            start: series.start,
            sampling_rate_hz: series.sampling_rate_hz,
            samples,
        })
    }
}

/// Second-order sections for a digital Butterworth high-pass.
///
/// `wn` is the cutoff normalised to Nyquist. Analog prototype poles sit on the
/// left half of the unit circle; the high-pass transform maps `s -> wc / s`,
/// putting every zero at the origin, and the bilinear transform (`fs = 2`) maps
/// those zeros to `z = 1`.
fn butterworth_highpass_sections(order: usize, wn: f64) -> Vec<Biquad> {
    let fs2 = 4.0;
    let warped = fs2 * (std::f64::consts::PI * wn / 2.0).tan();
    let n = order as f64;

    let mut sections = Vec::with_capacity(order.div_ceil(2));

    // One pole from each conjugate pair (upper half of the prototype circle)
    for k in 0..order / 2 {
        let m = (order - 1 - 2 * k) as f64;
        let theta = std::f64::consts::PI * m / (2.0 * n);
        let prototype = Complex64::new(-theta.cos(), -theta.sin());
        let analog = Complex64::new(warped, 0.0) / prototype;
        let digital = (analog + fs2) / (Complex64::new(fs2, 0.0) - analog);
        let gain = fs2 * fs2 / (Complex64::new(fs2, 0.0) - analog).norm_sqr();

        sections.push(Biquad {
            b: [gain, -2.0 * gain, gain],
            a: [1.0, -2.0 * digital.re, digital.norm_sqr()],
        });
    }

    // Odd orders keep a single real pole at -1 in the prototype
    if order % 2 == 1 {
        let analog = -warped;
        let digital = (fs2 + analog) / (fs2 - analog);
        let gain = fs2 / (fs2 - analog);

        sections.push(Biquad {
            b: [gain, -gain, 0.0],
            a: [1.0, -digital, 0.0],
        });
    }

    sections
}
