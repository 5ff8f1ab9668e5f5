// src/exercise/report.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the current repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepState {
    #[default]
    Up,
    Down,
}

impl RepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for RepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form feedback token attached to a frame report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFlag {
    /// No trustworthy angle this frame
    LowConfidence,
    /// Not deep enough
    GoLower,
    /// Depth reached / rep counted
    DepthOk,
    /// Rep completed inside the debounce window, not counted
    TooFast,
}

impl FormFlag {
    pub const ALL: [FormFlag; 4] = [
        FormFlag::LowConfidence,
        FormFlag::GoLower,
        FormFlag::DepthOk,
        FormFlag::TooFast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::GoLower => "go_lower",
            Self::DepthOk => "depth_ok",
            Self::TooFast => "too_fast",
        }
    }
}

impl fmt::Display for FormFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame output of the rep counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub reps: u32,
    pub state: RepState,
    /// Smoothed angle rounded to 2 decimals; `None` until the first valid frame
    pub knee_angle: Option<f64>,
    /// In detection order
    pub form_flags: Vec<FormFlag>,
}

impl FrameReport {
    pub fn has_flag(&self, flag: FormFlag) -> bool {
        self.form_flags.contains(&flag)
    }
}

/// Round half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
