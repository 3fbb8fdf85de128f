//! Linear confidence calibration.
//!
//! A calibration curve maps raw predicted confidence onto observed
//! outcomes so that "0.9" means roughly what it should. The curve is an
//! explicit, swappable value passed into scoring, never hidden scorer
//! state, so A/B testing and rollback stay trivial.

use serde::{Deserialize, Serialize};

use crate::error::{ExpungeError, ExpungeResult};

/// Minimum number of validated samples required to fit a curve.
pub const MIN_CALIBRATION_SAMPLES: usize = 10;

/// A fitted linear calibration curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub slope: f64,
    pub intercept: f64,
    /// Mean absolute error over the fitting samples; reported as the
    /// calibration accuracy.
    pub mean_absolute_error: f64,
    pub sample_count: usize,
}

impl CalibrationCurve {
    /// Fits a least-squares line through `(predicted, expected)` pairs.
    pub fn fit(samples: &[(f64, f64)]) -> ExpungeResult<Self> {
        if samples.len() < MIN_CALIBRATION_SAMPLES {
            return Err(ExpungeError::validation(
                "calibration_samples",
                format!(
                    "{} samples provided, at least {} required",
                    samples.len(),
                    MIN_CALIBRATION_SAMPLES
                ),
            ));
        }

        let n = samples.len() as f64;
        let mean_x = samples.iter().map(|(p, _)| p).sum::<f64>() / n;
        let mean_y = samples.iter().map(|(_, e)| e).sum::<f64>() / n;

        let mut num = 0.0;
        let mut den = 0.0;
        for (p, e) in samples {
            num += (p - mean_x) * (e - mean_y);
            den += (p - mean_x) * (p - mean_x);
        }

        // Degenerate input (all predictions identical) calibrates to a
        // constant at the observed mean.
        let slope = if den.abs() < f64::EPSILON { 0.0 } else { num / den };
        let intercept = mean_y - slope * mean_x;

        let mae = samples
            .iter()
            .map(|(p, e)| (slope * p + intercept - e).abs())
            .sum::<f64>()
            / n;

        Ok(Self {
            slope,
            intercept,
            mean_absolute_error: mae,
            sample_count: samples.len(),
        })
    }

    /// Applies the curve to a raw score.
    pub fn apply(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }
}
