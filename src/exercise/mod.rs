// src/exercise/mod.rs
//
// Rep counting core.
//
// Signal flow:
//   KeypointFrame → keypoints (leg selection) → angle ─┐
//                                                      ├→ rep_counter → FrameReport
//   (angle, confidence) from a caller ─────────────────┘
//
// rep_counter owns the smoother and drives it.

pub mod angle;
pub mod keypoints;
pub mod rep_counter;
pub mod report;
pub mod smoother;

pub use angle::{joint_angle, joint_angle_checked, STRAIGHT_ANGLE};
pub use keypoints::{KeypointSelector, LegMeasurement};
pub use rep_counter::RepCounter;
pub use report::{FormFlag, FrameReport, RepState};
pub use smoother::AngleSmoother;
