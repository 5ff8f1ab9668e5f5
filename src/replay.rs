// src/replay.rs
//
// Offline frame sources for driving a session without a camera: JSON-lines
// session files and a built-in demonstration sequence.

use crate::exercise::FrameReport;
use crate::session::{SessionSummary, SessionTracker};
use crate::types::KeypointFrame;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One recorded frame. On disk each line is either
/// `{"keypoints": {"left_knee": [x, y, conf], ...}}` or
/// `{"angle": 95.0, "confidence": 0.8}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameInput {
    Keypoints {
        keypoints: KeypointFrame,
    },
    Angle {
        #[serde(default)]
        angle: Option<f64>,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

impl FrameInput {
    pub fn angle(angle: f64, confidence: f64) -> Self {
        Self::Angle {
            angle: Some(angle),
            confidence: Some(confidence),
        }
    }

    /// A frame with nothing usable in it.
    pub fn empty() -> Self {
        Self::Angle {
            angle: None,
            confidence: None,
        }
    }

    pub fn apply(&self, tracker: &mut SessionTracker) -> FrameReport {
        match self {
            Self::Keypoints { keypoints } => tracker.update(keypoints),
            Self::Angle { angle, confidence } => tracker.update_with_angle(*angle, *confidence),
        }
    }
}

/// Parse one line. Unparseable lines become empty frames so a damaged
/// recording still replays with the right frame count.
pub fn parse_line(line_no: usize, line: &str) -> FrameInput {
    match serde_json::from_str(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("line {}: unreadable frame ({}), treating as empty", line_no, e);
            FrameInput::empty()
        }
    }
}

pub fn parse_session(contents: &str) -> Vec<FrameInput> {
    contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| parse_line(line_no, line))
        .collect()
}

pub fn read_session(path: &Path) -> Result<Vec<FrameInput>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    let frames = parse_session(&contents);
    info!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

pub fn find_session_files(dir: impl AsRef<Path>, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir.as_ref())
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();

    info!(
        "Found {} session files in {}",
        files.len(),
        dir.as_ref().display()
    );
    files
}

/// Stand, squat, stand up, rest, squat again, stand up, settle.
/// Two reps with the default counter configuration.
pub fn demo_sequence() -> Vec<FrameInput> {
    let blocks: [(f64, usize); 7] = [
        (170.0, 5),  // warm-up standing
        (88.0, 12),  // down
        (165.0, 5),  // up
        (170.0, 18), // rest, clears debounce
        (88.0, 12),  // down
        (165.0, 5),  // up
        (170.0, 5),  // settle
    ];
    blocks
        .iter()
        .flat_map(|&(angle, n)| std::iter::repeat(FrameInput::angle(angle, 1.0)).take(n))
        .collect()
}

/// Feed every frame into a fresh session and summarize it.
pub fn run_session(tracker: &mut SessionTracker, frames: &[FrameInput]) -> SessionSummary {
    tracker.reset();
    for frame in frames {
        let report = frame.apply(tracker);
        debug!(
            "frame {:03}: reps={} state={} angle={:?} flags={:?}",
            tracker.counter().frame(),
            report.reps,
            report.state,
            report.knee_angle,
            report.form_flags
        );
    }
    tracker.summary()
}
