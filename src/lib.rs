//! Squat repetition counter.
//!
//! Turns per-frame pose keypoints (or raw knee angles) into a debounced rep
//! count with live form feedback. Pose estimation, rendering and badge
//! logic live outside this crate.

pub mod config;
pub mod error;
pub mod exercise;
pub mod replay;
pub mod session;
pub mod types;

pub use error::{CounterError, CounterResult};
pub use exercise::{FormFlag, FrameReport, KeypointSelector, RepCounter, RepState};
pub use session::{SessionSummary, SessionTotals, SessionTracker};
pub use types::{Config, CounterConfig, KeypointFrame, LimbJoints, Point, Side};
