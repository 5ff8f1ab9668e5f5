// src/exercise/smoother.rs

use super::angle::STRAIGHT_ANGLE;
use crate::error::{CounterError, CounterResult};

/// Exponential moving average over a scalar stream.
///
/// `value = alpha * x + (1 - alpha) * value`. The first real sample seeds
/// the value without blending.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    alpha: f64,
    value: Option<f64>,
}

impl AngleSmoother {
    /// Rejects `alpha` outside (0, 1].
    pub fn new(alpha: f64) -> CounterResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(CounterError::InvalidSmoothingFactor(alpha));
        }
        Ok(Self { alpha, value: None })
    }

    /// Feed one sample. `None` (or a non-finite sample) leaves the state
    /// untouched and returns the last value, or [`STRAIGHT_ANGLE`] if
    /// nothing has been seen yet.
    pub fn update(&mut self, sample: Option<f64>) -> f64 {
        let Some(x) = sample.filter(|x| x.is_finite()) else {
            return self.value.unwrap_or(STRAIGHT_ANGLE);
        };

        let next = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Forget the stored value; alpha is kept.
    pub fn reset(&mut self) {
        self.value = None;
    }
}
