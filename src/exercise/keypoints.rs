// src/exercise/keypoints.rs
//
// Picks the leg to measure from a frame of pose keypoints.
//
// Each side qualifies only if all three joints are present and the weakest
// joint confidence clears `min_conf`. Of the qualifying sides, the one with
// the smallest (most bent) angle wins: in a two-legged squat the more flexed
// leg tracks depth best, and keypoint noise tends to overstate extension.

use super::angle::joint_angle;
use crate::types::{KeypointFrame, LimbJoints, Side};
use std::cmp::Ordering;
use tracing::debug;

/// Angle measured on one leg for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegMeasurement {
    pub side: Side,
    /// Interior angle at the middle joint, degrees
    pub angle: f64,
    /// Minimum confidence of the three joints
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct KeypointSelector {
    joints: LimbJoints,
    min_conf: f64,
}

impl KeypointSelector {
    pub fn new(joints: LimbJoints, min_conf: f64) -> Self {
        Self { joints, min_conf }
    }

    /// Hip/knee/ankle selector.
    pub fn for_knee(min_conf: f64) -> Self {
        Self::new(LimbJoints::default(), min_conf)
    }

    pub fn min_conf(&self) -> f64 {
        self.min_conf
    }

    /// Most reliable leg of the frame, or `None` if no side qualifies.
    pub fn select(&self, frame: &KeypointFrame) -> Option<LegMeasurement> {
        Side::BOTH
            .iter()
            .filter_map(|&side| self.measure_side(frame, side))
            .min_by(|a, b| a.angle.partial_cmp(&b.angle).unwrap_or(Ordering::Equal))
    }

    /// Measure a single side, applying the confidence gate.
    pub fn measure_side(&self, frame: &KeypointFrame, side: Side) -> Option<LegMeasurement> {
        let proximal = frame.get(&LimbJoints::key(side, &self.joints.proximal))?;
        let joint = frame.get(&LimbJoints::key(side, &self.joints.joint))?;
        let distal = frame.get(&LimbJoints::key(side, &self.joints.distal))?;

        let confidences = [proximal.confidence, joint.confidence, distal.confidence];
        // f64::min skips NaN, so reject it up front
        if confidences.iter().any(|c| c.is_nan()) {
            debug!("{} side rejected: NaN confidence", side.as_str());
            return None;
        }
        let confidence = confidences.into_iter().fold(f64::INFINITY, f64::min);

        if confidence < self.min_conf {
            debug!(
                "{} side rejected: confidence {:.2} < {:.2}",
                side.as_str(),
                confidence,
                self.min_conf
            );
            return None;
        }

        Some(LegMeasurement {
            side,
            angle: joint_angle(proximal, joint, distal),
            confidence,
        })
    }
}
