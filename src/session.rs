// src/session.rs
//
// Explicit per-session object handed around by the orchestrator. Owns one
// RepCounter plus frame/flag tallies; nothing here is global.

use crate::error::CounterResult;
use crate::exercise::{FormFlag, FrameReport, RepCounter};
use crate::types::{Config, KeypointFrame};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Session aggregate consumed by analytics and badge logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub squat_reps: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub totals: SessionTotals,
    pub frames: u64,
    pub low_confidence_frames: u64,
    pub depth_ok: u64,
    pub go_lower: u64,
    pub too_fast: u64,
    pub last_knee_angle: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SessionTracker {
    counter: RepCounter,
    frames: u64,
    low_confidence_frames: u64,
    depth_ok: u64,
    go_lower: u64,
    too_fast: u64,
    last_knee_angle: Option<f64>,
}

impl SessionTracker {
    pub fn new(counter: RepCounter) -> Self {
        Self {
            counter,
            frames: 0,
            low_confidence_frames: 0,
            depth_ok: 0,
            go_lower: 0,
            too_fast: 0,
            last_knee_angle: None,
        }
    }

    pub fn from_config(config: &Config) -> CounterResult<Self> {
        let counter = RepCounter::with_joints(config.counter, config.joints.clone())?;
        Ok(Self::new(counter))
    }

    pub fn update(&mut self, keypoints: &KeypointFrame) -> FrameReport {
        let report = self.counter.update(keypoints);
        self.record(&report);
        report
    }

    pub fn update_with_angle(&mut self, angle: Option<f64>, confidence: Option<f64>) -> FrameReport {
        let report = self.counter.update_with_angle(angle, confidence);
        self.record(&report);
        report
    }

    /// Tally one report.
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        for flag in &report.form_flags {
            match flag {
                FormFlag::LowConfidence => self.low_confidence_frames += 1,
                FormFlag::DepthOk => self.depth_ok += 1,
                FormFlag::GoLower => self.go_lower += 1,
                FormFlag::TooFast => self.too_fast += 1,
            }
        }
        if report.knee_angle.is_some() {
            self.last_knee_angle = report.knee_angle;
        }
    }

    pub fn totals(&self) -> SessionTotals {
        SessionTotals {
            squat_reps: self.counter.reps(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            totals: self.totals(),
            frames: self.frames,
            low_confidence_frames: self.low_confidence_frames,
            depth_ok: self.depth_ok,
            go_lower: self.go_lower,
            too_fast: self.too_fast,
            last_knee_angle: self.last_knee_angle,
        }
    }

    /// Start a new session with the same configuration.
    pub fn reset(&mut self) {
        if self.frames > 0 {
            info!(
                "Session reset after {} frames, {} reps",
                self.frames,
                self.counter.reps()
            );
        }
        self.counter.reset();
        self.frames = 0;
        self.low_confidence_frames = 0;
        self.depth_ok = 0;
        self.go_lower = 0;
        self.too_fast = 0;
        self.last_knee_angle = None;
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }
}
