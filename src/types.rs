use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub counter: CounterConfig,
    pub joints: LimbJoints,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

/// Rep counter policy constants. Fixed once a counter is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Smoothed angle at or below this marks "deep enough" (degrees)
    pub th_down: f64,
    /// Smoothed angle at or above this marks "standing" (degrees)
    pub th_up: f64,
    /// Minimum frame gap between two counted reps
    pub min_frames_between: u64,
    /// Minimum per-frame confidence to trust the angle
    pub min_conf: f64,
    /// EMA weight of the newest sample, in (0, 1]
    pub alpha: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            th_down: 90.0,
            th_up: 160.0,
            min_frames_between: 18, // ~0.6s at 30fps
            min_conf: 0.3,
            alpha: 0.3,
        }
    }
}

/// Joint-name suffixes of the hinge being measured. Keys are read as
/// `{side}_{name}`, e.g. `left_knee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimbJoints {
    pub proximal: String,
    pub joint: String,
    pub distal: String,
}

impl Default for LimbJoints {
    fn default() -> Self {
        Self {
            proximal: "hip".to_string(),
            joint: "knee".to_string(),
            distal: "ankle".to_string(),
        }
    }
}

impl LimbJoints {
    pub fn key(side: Side, name: &str) -> String {
        format!("{}_{}", side.as_str(), name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub extension: String,
    pub use_demo_when_empty: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input_dir: "sessions".to_string(),
            extension: "jsonl".to_string(),
            use_demo_when_empty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "squat_counter=info".to_string(),
        }
    }
}

// ============================================================================
// KEYPOINTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Image-space keypoint. Serialized as `[x, y, confidence]`; `[x, y]` is
/// accepted on input with confidence 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 3]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl TryFrom<Vec<f64>> for Point {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y] => Ok(Point::new(*x, *y)),
            [x, y, c] => Ok(Point::with_confidence(*x, *y, *c)),
            other => Err(format!("expected [x, y] or [x, y, conf], got {} values", other.len())),
        }
    }
}

impl From<Point> for [f64; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.confidence]
    }
}

/// Joint name -> keypoint for one video frame. Malformed entries are dropped
/// on deserialization instead of failing the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, RawJoint>", into = "HashMap<String, Point>")]
pub struct KeypointFrame {
    joints: HashMap<String, Point>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawJoint {
    Point(Point),
    Malformed(IgnoredAny),
}

impl From<HashMap<String, RawJoint>> for KeypointFrame {
    fn from(raw: HashMap<String, RawJoint>) -> Self {
        let joints = raw
            .into_iter()
            .filter_map(|(name, joint)| match joint {
                RawJoint::Point(p) => Some((name, p)),
                RawJoint::Malformed(_) => None,
            })
            .collect();
        Self { joints }
    }
}

impl From<KeypointFrame> for HashMap<String, Point> {
    fn from(frame: KeypointFrame) -> Self {
        frame.joints
    }
}

impl KeypointFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, point: Point) -> Self {
        self.insert(name, point);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, point: Point) {
        self.joints.insert(name.into(), point);
    }

    pub fn get(&self, name: &str) -> Option<&Point> {
        self.joints.get(name)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Point)> for KeypointFrame {
    fn from_iter<I: IntoIterator<Item = (S, Point)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
