// src/error.rs

use thiserror::Error;

/// Construction-time errors. Per-frame processing never fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CounterError {
    /// Smoothing coefficient outside (0, 1].
    #[error("Invalid smoothing factor: {0} (must be in (0, 1])")]
    InvalidSmoothingFactor(f64),

    /// Angle thresholds out of range or not ordered down < up.
    #[error("Invalid thresholds: down={down}, up={up} (need 0 <= down < up <= 180)")]
    InvalidThresholds { down: f64, up: f64 },

    /// Minimum confidence outside [0, 1].
    #[error("Invalid minimum confidence: {0} (must be in [0, 1])")]
    InvalidConfidence(f64),
}

pub type CounterResult<T> = Result<T, CounterError>;
