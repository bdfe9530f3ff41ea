//! Log-normal distribution fitting
//!
//! Maximum-likelihood fit of a log-normal with its location fixed at zero: the
//! parameters are the mean and the population standard deviation of ln(x).

use crate::error::ComputeError;
use crate::types::LogNormalFit;

/// Fewest values a fit is attempted on
pub const MIN_FIT_SAMPLES: usize = 3;

/// Fit a log-normal to `values`.
///
/// Returns `Ok(None)` when fewer than [`MIN_FIT_SAMPLES`] values are given.
/// Zero, negative or non-finite values are rejected.
pub fn fit_log_normal(values: &[f64]) -> Result<Option<LogNormalFit>, ComputeError> {
    if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(ComputeError::NonPositiveValue(*bad));
    }

    if values.len() < MIN_FIT_SAMPLES {
        return Ok(None);
    }

    let n = values.len() as f64;
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let log_mean = logs.iter().sum::<f64>() / n;
    let variance = logs.iter().map(|l| (l - log_mean).powi(2)).sum::<f64>() / n;

    Ok(Some(LogNormalFit {
        log_mean,
        log_std: variance.sqrt(),
    }))
}
